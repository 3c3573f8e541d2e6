use super::{null_default, Reference};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoritative_source: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_attribute_config: Option<IdentityAttributeConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentityProfile {
    pub fn transforms(&self) -> &[AttributeTransform] {
        self.identity_attribute_config
            .as_ref()
            .map(|c| c.attribute_transforms.as_slice())
            .unwrap_or(&[])
    }

    pub fn enabled_attributes(&self) -> Vec<String> {
        self.identity_attribute_config
            .as_ref()
            .map(IdentityAttributeConfig::enabled_attributes)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAttributeConfig {
    /// Either a list of attribute names or the tenant's boolean toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Value>,
    #[serde(default, deserialize_with = "null_default")]
    pub attribute_transforms: Vec<AttributeTransform>,
}

impl IdentityAttributeConfig {
    pub fn enabled_attributes(&self) -> Vec<String> {
        match &self.enabled {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeTransform {
    #[serde(
        default,
        alias = "identityAttributeName",
        deserialize_with = "null_default"
    )]
    pub identity_attribute: String,
    #[serde(
        default,
        alias = "transformDefinition",
        skip_serializing_if = "Option::is_none"
    )]
    pub transform: Option<TransformDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformDefinition {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

/// One row of the attribute mapping report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMapping {
    pub profile_name: String,
    pub profile_id: String,
    pub target_attribute: String,
    pub transform_type: String,
    pub transform_name: String,
    pub source_attributes: String,
    pub is_required: bool,
    pub expression: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_transform_shapes() {
        let profile: IdentityProfile = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Employees",
            "identityAttributeConfig": {
                "enabled": ["email"],
                "attributeTransforms": [
                    { "identityAttribute": "uid", "transform": { "type": "lower" }, "isRequired": true },
                    { "identityAttributeName": "email", "transformDefinition": { "type": "accountAttribute" } }
                ]
            }
        }))
        .expect("profile");
        let transforms = profile.transforms();
        assert_eq!(transforms.len(), 2);
        assert_eq!(transforms[1].identity_attribute, "email");
        assert_eq!(
            transforms[1].transform.as_ref().and_then(|t| t.kind.as_deref()),
            Some("accountAttribute")
        );
        assert_eq!(profile.enabled_attributes(), vec!["email".to_string()]);
    }

    #[test]
    fn boolean_enabled_flag_lists_nothing() {
        let profile: IdentityProfile = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Employees",
            "identityAttributeConfig": { "enabled": true, "attributeTransforms": null }
        }))
        .expect("profile");
        assert!(profile.enabled_attributes().is_empty());
        assert!(profile.transforms().is_empty());
    }
}

use crate::constants::limits;
use crate::models::{AttributeMapping, IdentityProfile, TransformDefinition};
use crate::utils::table::{render_box_table, render_csv};
use crate::utils::text::{ellipsize, non_empty};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

const NOT_AVAILABLE: &str = "N/A";
pub const NO_MAPPINGS: &str = "No attribute mappings found";
pub const NO_PROFILES: &str = "No matching identity profiles found.";

const TABLE_HEADERS: &[&str] = &[
    "Profile Name",
    "Target Attribute",
    "Transform Type",
    "Source Attributes",
    "Required",
    "Expression",
];

const CSV_HEADERS: &[&str] = &[
    "Profile Name",
    "Profile ID",
    "Target Attribute",
    "Transform Type",
    "Transform Name",
    "Source Attributes",
    "Required",
    "Expression",
    "Description",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    Table,
    Json,
    Csv,
}

impl FromStr for MappingFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "table" => Ok(MappingFormat::Table),
            "json" => Ok(MappingFormat::Json),
            "csv" => Ok(MappingFormat::Csv),
            other => Err(format!("format must be one of table, json, csv (got '{}')", other)),
        }
    }
}

fn text_or_na(value: Option<&str>) -> String {
    non_empty(value).unwrap_or(NOT_AVAILABLE).to_string()
}

fn describe_source_attribute(attr: &Value) -> String {
    if let Some(text) = attr.as_str() {
        return text.to_string();
    }
    if let Some(name) = non_empty(attr.get("name").and_then(Value::as_str)) {
        return name.to_string();
    }
    if let Some(source) = non_empty(attr.get("sourceName").and_then(Value::as_str)) {
        let attribute = attr
            .get("attributeName")
            .and_then(Value::as_str)
            .unwrap_or("");
        return format!("{}.{}", source, attribute);
    }
    attr.to_string()
}

/// Summarizes where a transform reads its input from.
pub fn extract_source_attributes(transform: Option<&TransformDefinition>) -> String {
    match transform.and_then(|t| t.attributes.as_ref()) {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(describe_source_attribute)
            .collect::<Vec<_>>()
            .join(", "),
        Some(obj @ Value::Object(map)) if !map.is_empty() => describe_source_attribute(obj),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// One row per transform, then a direct-mapping row for each enabled
/// attribute that no transform already targets.
pub fn attribute_mappings(profile: &IdentityProfile) -> Vec<AttributeMapping> {
    let mut mappings: Vec<AttributeMapping> = profile
        .transforms()
        .iter()
        .map(|transform| {
            let def = transform.transform.as_ref();
            AttributeMapping {
                profile_name: profile.name.clone(),
                profile_id: profile.id.clone(),
                target_attribute: transform.identity_attribute.clone(),
                transform_type: text_or_na(def.and_then(|d| d.kind.as_deref())),
                transform_name: text_or_na(def.and_then(|d| d.name.as_deref())),
                source_attributes: extract_source_attributes(def),
                is_required: transform.is_required.unwrap_or(false),
                expression: text_or_na(def.and_then(|d| d.expression.as_deref())),
                description: text_or_na(def.and_then(|d| d.description.as_deref())),
            }
        })
        .collect();

    for attribute in profile.enabled_attributes() {
        if mappings.iter().any(|m| m.target_attribute == attribute) {
            continue;
        }
        mappings.push(AttributeMapping {
            profile_name: profile.name.clone(),
            profile_id: profile.id.clone(),
            target_attribute: attribute,
            transform_type: "Direct Mapping".to_string(),
            transform_name: NOT_AVAILABLE.to_string(),
            source_attributes: NOT_AVAILABLE.to_string(),
            is_required: false,
            expression: NOT_AVAILABLE.to_string(),
            description: "Direct attribute mapping".to_string(),
        });
    }
    mappings
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingReport<'a> {
    profile_count: usize,
    mapping_count: usize,
    mappings: &'a [AttributeMapping],
}

pub fn render_table(mappings: &[AttributeMapping]) -> String {
    let rows: Vec<Vec<String>> = mappings
        .iter()
        .map(|m| {
            vec![
                m.profile_name.clone(),
                m.target_attribute.clone(),
                m.transform_type.clone(),
                m.source_attributes.clone(),
                if m.is_required { "Yes" } else { "No" }.to_string(),
                ellipsize(&m.expression, limits::EXPRESSION_COLUMN_WIDTH),
            ]
        })
        .collect();
    render_box_table(TABLE_HEADERS, &rows)
}

pub fn render_csv_rows(mappings: &[AttributeMapping]) -> String {
    let rows: Vec<Vec<String>> = mappings
        .iter()
        .map(|m| {
            vec![
                m.profile_name.clone(),
                m.profile_id.clone(),
                m.target_attribute.clone(),
                m.transform_type.clone(),
                m.transform_name.clone(),
                m.source_attributes.clone(),
                m.is_required.to_string(),
                m.expression.clone(),
                m.description.clone(),
            ]
        })
        .collect();
    render_csv(CSV_HEADERS, &rows)
}

/// Full report text for `extract_profile_attribute_mappings`.
pub fn render_report(profiles: &[IdentityProfile], format: MappingFormat) -> String {
    if profiles.is_empty() {
        return NO_PROFILES.to_string();
    }
    let mappings: Vec<AttributeMapping> = profiles.iter().flat_map(attribute_mappings).collect();
    match format {
        MappingFormat::Json => {
            let report = MappingReport {
                profile_count: profiles.len(),
                mapping_count: mappings.len(),
                mappings: &mappings,
            };
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        }
        _ if mappings.is_empty() => NO_MAPPINGS.to_string(),
        MappingFormat::Csv => render_csv_rows(&mappings),
        MappingFormat::Table => format!(
            "Found {} attribute mappings across {} profile(s):\n\n{}",
            mappings.len(),
            profiles.len(),
            render_table(&mappings)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> IdentityProfile {
        serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Employees",
            "identityAttributeConfig": {
                "enabled": ["uid", "email", "department"],
                "attributeTransforms": [
                    {
                        "identityAttribute": "uid",
                        "transform": {
                            "type": "lower",
                            "name": "Lowercase",
                            "attributes": [{ "sourceName": "HR", "attributeName": "login" }]
                        },
                        "isRequired": true
                    },
                    {
                        "identityAttribute": "email",
                        "transform": { "type": "accountAttribute", "attributes": ["mail", { "name": "upn" }] }
                    }
                ]
            }
        }))
        .expect("profile")
    }

    #[test]
    fn direct_mappings_skip_attributes_with_transforms() {
        let mappings = attribute_mappings(&profile());
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings[0].source_attributes, "HR.login");
        assert!(mappings[0].is_required);
        assert_eq!(mappings[1].source_attributes, "mail, upn");
        assert_eq!(mappings[1].transform_name, "N/A");
        assert_eq!(mappings[2].target_attribute, "department");
        assert_eq!(mappings[2].transform_type, "Direct Mapping");
        assert_eq!(mappings[2].description, "Direct attribute mapping");
    }

    #[test]
    fn source_attributes_handle_objects_and_absence() {
        assert_eq!(extract_source_attributes(None), "N/A");
        let def = TransformDefinition {
            attributes: Some(serde_json::json!({ "sourceName": "AD", "attributeName": "mail" })),
            ..TransformDefinition::default()
        };
        assert_eq!(extract_source_attributes(Some(&def)), "AD.mail");
        let def = TransformDefinition {
            attributes: Some(serde_json::json!([{ "value": 1 }])),
            ..TransformDefinition::default()
        };
        assert_eq!(extract_source_attributes(Some(&def)), r#"{"value":1}"#);
    }

    #[test]
    fn table_report_truncates_long_expressions() {
        let mut p = profile();
        if let Some(config) = p.identity_attribute_config.as_mut() {
            if let Some(def) = config.attribute_transforms[0].transform.as_mut() {
                def.expression = Some("x".repeat(60));
            }
        }
        let out = render_report(&[p], MappingFormat::Table);
        assert!(out.starts_with("Found 3 attribute mappings across 1 profile(s):\n\n+"));
        assert!(out.contains(&format!("{}...", "x".repeat(47))));
        assert!(!out.contains(&"x".repeat(48)));
        assert!(out.contains("| Yes "));
    }

    #[test]
    fn json_report_counts_profiles_and_mappings() {
        let out = render_report(&[profile()], MappingFormat::Json);
        let parsed: Value = serde_json::from_str(&out).expect("json");
        assert_eq!(parsed["profileCount"], 1);
        assert_eq!(parsed["mappingCount"], 3);
        assert_eq!(parsed["mappings"][0]["targetAttribute"], "uid");
    }

    #[test]
    fn empty_cases() {
        assert_eq!(render_report(&[], MappingFormat::Csv), NO_PROFILES);
        let bare = IdentityProfile {
            id: "p2".to_string(),
            name: "Empty".to_string(),
            ..IdentityProfile::default()
        };
        assert_eq!(render_report(&[bare.clone()], MappingFormat::Table), NO_MAPPINGS);
        assert_eq!(render_report(&[bare], MappingFormat::Csv), NO_MAPPINGS);
    }
}

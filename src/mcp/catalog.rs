use crate::errors::ToolError;
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_names() -> impl Iterator<Item = &'static str> {
    TOOL_CATALOG.iter().map(|tool| tool.name.as_str())
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

/// Checks `args` against the tool's input schema. A missing required field
/// takes precedence over every other violation.
pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), ToolError> {
    let Some(tool) = tool_by_name(tool_name) else {
        return Ok(());
    };
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    let result = schema.validate(args);
    if let Err(errors) = result {
        let errors: Vec<_> = errors.take(10).collect();
        if let Some(missing) = errors.iter().find_map(|err| match &err.kind {
            ValidationErrorKind::Required { property } => Some(
                property
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| property.to_string()),
            ),
            _ => None,
        }) {
            return Err(ToolError::missing_argument(&missing));
        }

        let mut rendered = Vec::new();
        let mut hints = Vec::new();
        for err in &errors {
            let path = err.instance_path.to_string();
            let location = if path.is_empty() {
                "(root)".to_string()
            } else {
                path.clone()
            };
            match &err.kind {
                ValidationErrorKind::AdditionalProperties { unexpected } => {
                    let known: Vec<&str> = tool
                        .input_schema
                        .get("properties")
                        .and_then(Value::as_object)
                        .map(|props| props.keys().map(String::as_str).collect())
                        .unwrap_or_default();
                    for field in unexpected {
                        rendered.push(format!("{}: unknown field '{}'", location, field));
                        let close = suggest(field, known.iter().copied(), 3);
                        if !close.is_empty() {
                            hints.push(format!("field '{}': {}", field, close.join(", ")));
                        }
                    }
                }
                ValidationErrorKind::Enum { options } => {
                    let allowed: Vec<String> = options
                        .as_array()
                        .map(|arr| {
                            arr.iter()
                                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                                .collect()
                        })
                        .unwrap_or_default();
                    rendered.push(format!("{}: expected one of {}", location, allowed.join(", ")));
                }
                ValidationErrorKind::Type { kind } => {
                    rendered.push(format!("{}: expected {}", location, format_type_kind(kind)));
                }
                _ => rendered.push(format!("{}: {}", location, err)),
            }
        }

        let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
        lines.extend(rendered.iter().map(|line| format!("- {}", line)));
        let mut error = ToolError::invalid_params(lines.join("\n"))
            .with_details(serde_json::json!({ "tool": tool_name, "violations": rendered }));
        if !hints.is_empty() {
            error = error.with_hint(format!("Did you mean: {}", hints.join(" | ")));
        }
        return Err(error);
    }
    Ok(())
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolErrorKind;
    use serde_json::json;

    #[test]
    fn catalog_has_unique_names_and_object_schemas() {
        let mut names: Vec<&str> = tool_names().collect();
        assert_eq!(names.len(), 15);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 15);
        for tool in tool_catalog() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(TOOL_VALIDATORS.contains_key(&tool.name), "{} schema", tool.name);
            assert!(!tool.description.is_empty());
        }
    }

    #[test]
    fn required_fields_become_missing_argument_errors() {
        let err = validate_tool_args("get_identity", &json!({})).expect_err("missing");
        assert_eq!(err.kind, ToolErrorKind::MissingArgument);
        assert_eq!(err.message, "Missing required argument: identity_id");
    }

    #[test]
    fn unknown_fields_get_suggestions() {
        let err = validate_tool_args("search_identities", &json!({ "querry": "x" }))
            .expect_err("unknown field");
        assert_eq!(err.kind, ToolErrorKind::InvalidParams);
        assert!(err.message.contains("unknown field 'querry'"));
        assert!(err.hint.as_deref().unwrap_or("").contains("query"));
    }

    #[test]
    fn enum_and_type_violations_are_rendered() {
        let err = validate_tool_args(
            "extract_profile_attribute_mappings",
            &json!({ "format": "xml" }),
        )
        .expect_err("enum");
        assert!(err.message.contains("expected one of table, json, csv"));

        let err = validate_tool_args("search_accounts", &json!({ "limit": "ten" }))
            .expect_err("type");
        assert!(err.message.contains("/limit"));
    }

    #[test]
    fn valid_arguments_pass() {
        assert!(validate_tool_args("search_identities", &json!({})).is_ok());
        assert!(validate_tool_args(
            "search_identity_events",
            &json!({ "identity_id": "abc", "days_back": 7, "format": "summary" })
        )
        .is_ok());
    }
}

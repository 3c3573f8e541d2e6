use crate::errors::{McpError, ToolError};
use serde_json::{json, Value};

pub struct PromptArg {
    pub name: &'static str,
    pub description: &'static str,
}

pub struct PromptDef {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: &'static [PromptArg],
    /// `{argument}` placeholders are substituted verbatim.
    template: &'static str,
}

const PROMPTS: &[PromptDef] = &[
    PromptDef {
        name: "analyze_identity",
        description: "Analyze an identity's access and provide security insights",
        arguments: &[PromptArg {
            name: "identity_id",
            description: "ID of the identity to analyze",
        }],
        template: "Analyze the identity \"{identity_id}\" and provide:

1. Summary of the identity's basic information
2. List of all accounts and their status
3. Access profiles and roles assigned
4. Potential security concerns (excessive access, dormant accounts, etc.)
5. Recommendations for access optimization

Use the get_identity tool with full details.",
    },
    PromptDef {
        name: "find_orphaned_accounts",
        description: "Find accounts without associated identities",
        arguments: &[],
        template: "Find and report on orphaned accounts (accounts without associated identities):

1. Search for accounts
2. Identify those without valid identity associations
3. Group by source system
4. Provide recommendations for cleanup

Use the search_accounts tool to gather data.",
    },
    PromptDef {
        name: "audit_user_access",
        description: "Generate an access audit report for a user",
        arguments: &[PromptArg {
            name: "identity_id",
            description: "ID of the identity to audit",
        }],
        template: "Generate a comprehensive access audit report for identity \"{identity_id}\":

1. Identity details and organizational context
2. All accounts across all systems
3. Complete list of access profiles and roles
4. Access review recommendations
5. Compliance considerations

Format as a professional audit report.",
    },
    PromptDef {
        name: "compare_identities",
        description: "Compare access between two identities",
        arguments: &[
            PromptArg {
                name: "identity1_id",
                description: "First identity ID",
            },
            PromptArg {
                name: "identity2_id",
                description: "Second identity ID",
            },
        ],
        template: "Compare access between identities \"{identity1_id}\" and \"{identity2_id}\":

1. Show accounts unique to each identity
2. Show shared accounts
3. Compare access profiles and roles
4. Highlight significant access differences
5. Suggest reasons for differences based on department, role, etc.",
    },
    PromptDef {
        name: "role_membership_report",
        description: "Generate a report of who has a specific role",
        arguments: &[PromptArg {
            name: "role_name",
            description: "Name of the role to report on",
        }],
        template: "Generate a membership report for the role \"{role_name}\":

1. Find the role using search_roles
2. Search for identities with this role
3. List all members with their details
4. Identify patterns (departments, managers, etc.)
5. Suggest whether role membership is appropriate

Use search_identities with appropriate filters.",
    },
];

pub fn list_prompts() -> Value {
    let prompts: Vec<Value> = PROMPTS
        .iter()
        .map(|prompt| {
            let arguments: Vec<Value> = prompt
                .arguments
                .iter()
                .map(|arg| json!({ "name": arg.name, "description": arg.description, "required": true }))
                .collect();
            json!({
                "name": prompt.name,
                "description": prompt.description,
                "arguments": arguments,
            })
        })
        .collect();
    json!({ "prompts": prompts })
}

/// Substitutes `{name}` placeholders in one left-to-right pass, so argument
/// values are never re-expanded.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = values.iter().find(|(name, _)| {
            tail.strip_prefix(*name)
                .map_or(false, |after| after.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders one prompt as a single user message.
pub fn get_prompt(name: &str, args: &Value) -> Result<Value, McpError> {
    let prompt = PROMPTS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| McpError::unknown_prompt(name))?;

    let mut values = Vec::with_capacity(prompt.arguments.len());
    for arg in prompt.arguments {
        let value = args
            .get(arg.name)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| McpError::from(ToolError::missing_argument(arg.name)))?;
        values.push((arg.name, value));
    }
    let text = render(prompt.template, &values);

    Ok(json!({
        "description": prompt.description,
        "messages": [{
            "role": "user",
            "content": { "type": "text", "text": text },
        }],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn lists_five_prompts_with_required_arguments() {
        let listed = list_prompts();
        let prompts = listed["prompts"].as_array().expect("array");
        assert_eq!(prompts.len(), 5);
        let compare = prompts
            .iter()
            .find(|p| p["name"] == "compare_identities")
            .expect("compare");
        assert_eq!(compare["arguments"].as_array().map(Vec::len), Some(2));
        assert_eq!(compare["arguments"][0]["required"], true);
    }

    #[test]
    fn substitutes_arguments() {
        let out = get_prompt(
            "compare_identities",
            &json!({ "identity1_id": "a1", "identity2_id": "b2" }),
        )
        .expect("prompt");
        let text = out["messages"][0]["content"]["text"].as_str().expect("text");
        assert!(text.starts_with("Compare access between identities \"a1\" and \"b2\":"));
        assert_eq!(out["messages"][0]["role"], "user");

        let out = get_prompt("find_orphaned_accounts", &Value::Null).expect("no args");
        assert!(out["messages"][0]["content"]["text"]
            .as_str()
            .unwrap_or("")
            .contains("search_accounts"));
    }

    #[test]
    fn argument_values_are_not_expanded_again() {
        let out = get_prompt(
            "compare_identities",
            &json!({ "identity1_id": "{identity2_id}", "identity2_id": "b2" }),
        )
        .expect("prompt");
        let text = out["messages"][0]["content"]["text"].as_str().expect("text");
        assert!(text.starts_with("Compare access between identities \"{identity2_id}\" and \"b2\":"));
        assert_eq!(
            render("{a} {b} {c} {", &[("a", "{b}"), ("b", "2")]),
            "{b} 2 {c} {"
        );
    }

    #[test]
    fn unknown_and_incomplete_prompts_fail() {
        let err = get_prompt("nope", &json!({})).expect_err("unknown");
        assert_eq!(err.message, "Unknown prompt: nope");
        assert_eq!(err.code, ErrorCode::InvalidParams);

        let err = get_prompt("role_membership_report", &json!({})).expect_err("missing");
        assert_eq!(err.message, "Missing required argument: role_name");
    }
}

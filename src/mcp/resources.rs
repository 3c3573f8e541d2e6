use crate::constants::{limits, resources};
use crate::errors::{ErrorCode, IdentityNowError, McpError};
use crate::models::Identity;
use crate::services::identitynow::IdentityNowService;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use crate::utils::markdown::identity_markdown;
use crate::utils::text::non_empty;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;

static IDENTITY_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sailpoint://identity/(.+)$").expect("identity uri regex"));

pub fn identity_uri(id: &str) -> String {
    format!("{}{}", resources::IDENTITY_URI_PREFIX, id)
}

pub fn parse_identity_uri(uri: &str) -> Option<String> {
    IDENTITY_URI
        .captures(uri)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn describe(identity: &Identity) -> Value {
    let display = non_empty(identity.display_name.as_deref()).unwrap_or(&identity.name);
    let email = non_empty(identity.email.as_deref()).unwrap_or("No email");
    json!({
        "uri": identity_uri(&identity.id),
        "mimeType": resources::MARKDOWN_MIME,
        "name": format!("Identity: {}", identity.name),
        "description": format!("{} - {}", display, email),
    })
}

/// Identities exposed as markdown resources.
pub struct IdentityResources {
    logger: Logger,
    validation: Validation,
    service: Arc<IdentityNowService>,
}

impl IdentityResources {
    pub fn new(logger: Logger, validation: Validation, service: Arc<IdentityNowService>) -> Self {
        Self {
            logger: logger.child("resources"),
            validation,
            service,
        }
    }

    /// A listing failure yields an empty list, never an error.
    pub async fn list(&self) -> Value {
        match self
            .service
            .search_identities(None, limits::RESOURCE_LIST_LIMIT)
            .await
        {
            Ok(identities) => {
                let items: Vec<Value> = identities.iter().map(describe).collect();
                json!({ "resources": items })
            }
            Err(err) => {
                self.logger.error(
                    "listing identity resources failed",
                    Some(&json!({ "error": err.to_string() })),
                );
                json!({ "resources": [] })
            }
        }
    }

    fn or_empty<T>(&self, what: &str, id: &str, result: Result<Vec<T>, IdentityNowError>) -> Vec<T> {
        result.unwrap_or_else(|err| {
            self.logger.warn(
                "identity resource rendered without a section",
                Some(&json!({ "identity_id": id, "section": what, "error": err.to_string() })),
            );
            Vec::new()
        })
    }

    pub async fn read(&self, uri: &str) -> Result<Value, McpError> {
        let invalid = || McpError::new(ErrorCode::InvalidParams, format!("Invalid resource URI: {}", uri));
        let raw_id = parse_identity_uri(uri).ok_or_else(invalid)?;
        let id = self
            .validation
            .ensure_identifier(&raw_id, "identity_id")
            .map_err(|_| invalid())?;

        let (identity, accounts, access_profiles, roles) = tokio::join!(
            self.service.get_identity(&id),
            self.service.get_identity_accounts(&id),
            self.service.get_identity_access_profiles(&id),
            self.service.get_identity_roles(&id),
        );
        let identity = identity.map_err(|err| {
            let code = if err.status() == Some(404) {
                ErrorCode::ResourceNotFound
            } else {
                ErrorCode::InternalError
            };
            McpError::new(code, format!("Failed to read identity {}: {}", id, err))
        })?;
        let accounts = self.or_empty("accounts", &id, accounts);
        let access_profiles = self.or_empty("accessProfiles", &id, access_profiles);
        let roles = self.or_empty("roles", &id, roles);

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": resources::MARKDOWN_MIME,
                "text": identity_markdown(&identity, &accounts, &access_profiles, &roles),
            }]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identity_uris() {
        assert_eq!(
            parse_identity_uri("sailpoint://identity/2c91808a").as_deref(),
            Some("2c91808a")
        );
        assert_eq!(parse_identity_uri("sailpoint://identity/"), None);
        assert_eq!(parse_identity_uri("sailpoint://role/abc"), None);
        assert_eq!(identity_uri("abc"), "sailpoint://identity/abc");
    }

    #[test]
    fn descriptions_fall_back_to_name_and_placeholder_email() {
        let identity = Identity {
            id: "i1".to_string(),
            name: "jdoe".to_string(),
            ..Identity::default()
        };
        let out = describe(&identity);
        assert_eq!(out["uri"], "sailpoint://identity/i1");
        assert_eq!(out["name"], "Identity: jdoe");
        assert_eq!(out["description"], "jdoe - No email");
        assert_eq!(out["mimeType"], "text/markdown");
    }
}

use crate::constants::{network, retry};
use crate::errors::IdentityNowError;
use crate::utils::redact::mask_secret;
use std::fmt;
use url::Url;

pub const ENV_BASE_URL: &str = "SAILPOINT_BASE_URL";
pub const ENV_CLIENT_ID: &str = "SAILPOINT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SAILPOINT_CLIENT_SECRET";
pub const ENV_TIMEOUT_MS: &str = "SAILPOINT_TIMEOUT_MS";
pub const ENV_MAX_ATTEMPTS: &str = "SAILPOINT_MAX_ATTEMPTS";

/// Tenant connection settings. Client id and secret are mandatory.
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_ms: u64,
    pub max_attempts: usize,
    pub base_url_defaulted: bool,
}

impl Config {
    pub fn new(
        base_url: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Result<Self, IdentityNowError> {
        let client_id = client_id.map(|v| v.trim().to_string()).unwrap_or_default();
        let client_secret = client_secret
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(IdentityNowError::Authentication {
                status: None,
                status_text: format!(
                    "SailPoint credentials not configured. Set {} and {} environment variables.",
                    ENV_CLIENT_ID, ENV_CLIENT_SECRET
                ),
            });
        }

        let raw_base = base_url
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let base_url_defaulted = raw_base.is_none();
        let base_url = normalize_base_url(raw_base.as_deref().unwrap_or(network::DEFAULT_BASE_URL))?;

        Ok(Self {
            base_url,
            client_id,
            client_secret,
            timeout_ms: network::TIMEOUT_API_REQUEST_MS,
            max_attempts: retry::MAX_ATTEMPTS,
            base_url_defaulted,
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.max(1);
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "base_url": self.base_url,
            "client_id": mask_secret(&self.client_id),
            "timeout_ms": self.timeout_ms,
            "max_attempts": self.max_attempts,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("client_id", &mask_secret(&self.client_id))
            .field("client_secret", &"****")
            .field("timeout_ms", &self.timeout_ms)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, IdentityNowError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|_| IdentityNowError::Config(format!("Invalid {} URL: {}", ENV_BASE_URL, raw)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(IdentityNowError::Config(format!(
            "{} must use http or https",
            ENV_BASE_URL
        )));
    }
    url.set_fragment(None);
    url.set_query(None);
    let normalized = format!("{}{}", url.origin().ascii_serialization(), url.path());
    Ok(normalized.trim_end_matches('/').to_string())
}

/// MCP host entry that launches this binary. The secret is referenced by
/// variable name, never embedded.
pub fn server_definition(command: &str, base_url: &str, client_id: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "mcpServers": {
            "identitynow": {
                "command": command,
                "args": ["serve"],
                "env": {
                    ENV_BASE_URL: base_url,
                    ENV_CLIENT_ID: client_id.unwrap_or(""),
                    ENV_CLIENT_SECRET: format!("${{{}}}", ENV_CLIENT_SECRET),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> (Option<String>, Option<String>) {
        (Some("client".to_string()), Some("secret".to_string()))
    }

    #[test]
    fn missing_credentials_is_an_authentication_error() {
        let err = Config::new(None, Some("id".to_string()), Some("  ".to_string()))
            .expect_err("secret is required");
        assert!(matches!(err, IdentityNowError::Authentication { status: None, .. }));
        assert!(err.to_string().contains(ENV_CLIENT_SECRET));
    }

    #[test]
    fn base_url_defaults_and_normalizes() {
        let (id, secret) = creds();
        let config = Config::new(None, id, secret).expect("config");
        assert!(config.base_url_defaulted);
        assert_eq!(config.base_url, network::DEFAULT_BASE_URL);

        let (id, secret) = creds();
        let config = Config::new(
            Some("https://acme.api.identitynow.com/?x=1#frag".to_string()),
            id,
            secret,
        )
        .expect("config");
        assert!(!config.base_url_defaulted);
        assert_eq!(config.base_url, "https://acme.api.identitynow.com");
        assert_eq!(
            config.url("/oauth/token"),
            "https://acme.api.identitynow.com/oauth/token"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let (id, secret) = creds();
        let err = Config::new(Some("ftp://acme".to_string()), id, secret).expect_err("scheme");
        assert!(matches!(err, IdentityNowError::Config(_)));
    }

    #[test]
    fn server_definition_references_secret_by_name() {
        let def = server_definition("/usr/bin/identitynow-mcp", "https://acme.api.identitynow.com", Some("abc"));
        let server = &def["mcpServers"]["identitynow"];
        assert_eq!(server["args"], serde_json::json!(["serve"]));
        assert_eq!(server["env"][ENV_CLIENT_ID], "abc");
        assert_eq!(server["env"][ENV_CLIENT_SECRET], "${SAILPOINT_CLIENT_SECRET}");
    }

    #[test]
    fn debug_output_hides_secret() {
        let (id, _) = creds();
        let config = Config::new(None, id, Some("very-secret".to_string())).expect("config");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
    }
}

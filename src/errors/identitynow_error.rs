use super::{ToolError, ToolErrorKind};
use thiserror::Error;

/// Failures of the authenticated HTTP layer, before they reach a tool result.
#[derive(Debug, Clone, Error)]
pub enum IdentityNowError {
    #[error("Failed to authenticate: {status_text}")]
    Authentication {
        status: Option<u16>,
        status_text: String,
    },
    #[error("SailPoint API error: {status} {status_text} - {body}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
        /// Upstream `Retry-After`, in milliseconds.
        retry_after_ms: Option<u64>,
    },
    #[error("SailPoint request failed: {0}")]
    Transport(String),
    #[error("SailPoint request timed out after {0} ms")]
    Timeout(u64),
    #[error("Unexpected response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl IdentityNowError {
    pub fn status(&self) -> Option<u16> {
        match self {
            IdentityNowError::Api { status, .. } => Some(*status),
            IdentityNowError::Authentication { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IdentityNowError::Transport(_) | IdentityNowError::Timeout(_)
        )
    }
}

impl From<IdentityNowError> for ToolError {
    fn from(err: IdentityNowError) -> Self {
        let message = err.to_string();
        match &err {
            IdentityNowError::Authentication { status, .. } => ToolError::authentication(message)
                .with_hint("Check SAILPOINT_CLIENT_ID, SAILPOINT_CLIENT_SECRET and SAILPOINT_BASE_URL.")
                .with_details(serde_json::json!({ "status": status })),
            IdentityNowError::Api { status, body, .. } => {
                let base = if *status == 404 {
                    let mut nf = ToolError::not_found(message);
                    nf.code = "API_ERROR".to_string();
                    nf
                } else {
                    ToolError::api(*status, message)
                };
                base.with_details(serde_json::json!({ "status": status, "body": body }))
            }
            IdentityNowError::Transport(_) => ToolError::retryable(message),
            IdentityNowError::Timeout(_) => ToolError::timeout(message),
            IdentityNowError::Decode { path, .. } => {
                ToolError::new(ToolErrorKind::Internal, "DECODE_ERROR", message)
                    .with_details(serde_json::json!({ "path": path }))
            }
            IdentityNowError::Config(_) => ToolError::invalid_params(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message_carries_status_and_body() {
        let err = IdentityNowError::Api {
            status: 401,
            status_text: "Unauthorized".to_string(),
            body: "{\"error\":\"bad token\"}".to_string(),
            retry_after_ms: None,
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            "SailPoint API error: 401 Unauthorized - {\"error\":\"bad token\"}"
        );
        let tool: ToolError = err.into();
        assert_eq!(tool.kind, ToolErrorKind::Api);
        assert_eq!(
            tool.details.as_ref().and_then(|d| d.get("status")).and_then(|v| v.as_u64()),
            Some(401)
        );
    }

    #[test]
    fn not_found_keeps_api_code() {
        let err = IdentityNowError::Api {
            status: 404,
            status_text: "Not Found".to_string(),
            body: String::new(),
            retry_after_ms: None,
        };
        let tool: ToolError = err.into();
        assert_eq!(tool.kind, ToolErrorKind::NotFound);
        assert_eq!(tool.code, "API_ERROR");
    }

    #[test]
    fn authentication_error_uses_status_text() {
        let err = IdentityNowError::Authentication {
            status: Some(400),
            status_text: "Bad Request".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to authenticate: Bad Request");
        assert!(!err.is_transient());
    }
}

use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    MissingArgument,
    UnknownTool,
    Authentication,
    Api,
    NotFound,
    Timeout,
    Retryable,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: matches!(kind, ToolErrorKind::Timeout | ToolErrorKind::Retryable),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn missing_argument(name: &str) -> Self {
        Self::new(
            ToolErrorKind::MissingArgument,
            "MISSING_ARGUMENT",
            format!("Missing required argument: {}", name),
        )
        .with_details(serde_json::json!({ "argument": name }))
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(
            ToolErrorKind::UnknownTool,
            "UNKNOWN_TOOL",
            format!("Unknown tool: {}", name),
        )
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Authentication, "AUTHENTICATION", message)
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        let mut err = Self::new(ToolErrorKind::Api, "API_ERROR", message);
        err.retryable = status == 429 || status >= 500;
        err
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Retryable, "RETRYABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument_names_the_argument() {
        let err = ToolError::missing_argument("identity_id");
        assert_eq!(err.kind, ToolErrorKind::MissingArgument);
        assert_eq!(err.message, "Missing required argument: identity_id");
        assert!(!err.retryable);
    }

    #[test]
    fn api_errors_are_retryable_only_for_transient_statuses() {
        assert!(ToolError::api(503, "busy").retryable);
        assert!(ToolError::api(429, "slow down").retryable);
        assert!(!ToolError::api(404, "gone").retryable);
    }
}

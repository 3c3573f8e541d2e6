use crate::errors::{ErrorCode, McpError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Requests without an id expect no response.
    pub fn is_notification(&self) -> bool {
        self.id.as_ref().map(Value::is_null).unwrap_or(true)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: code.as_i32(),
                message: message.into(),
            }),
        }
    }

    pub fn from_outcome(id: Value, outcome: Result<Value, McpError>) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(err) => Self::failure(id, err.code, err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_without_id_are_notifications() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized","params":{}}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert!(parsed.is_notification());

        let raw = r#"{"jsonrpc":"2.0","id":7,"method":"resources/read","params":{"uri":" sailpoint://identity/x "}}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert!(!parsed.is_notification());
        assert_eq!(parsed.param_str("uri"), Some("sailpoint://identity/x"));
        assert_eq!(parsed.param_str("name"), None);
    }

    #[test]
    fn failures_serialize_without_result() {
        let response = JsonRpcResponse::from_outcome(
            Value::from(3),
            Err(McpError::unknown_prompt("nope")),
        );
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["error"]["code"], -32602);
        assert_eq!(value["error"]["message"], "Unknown prompt: nope");
        assert!(value.get("result").is_none());
    }
}

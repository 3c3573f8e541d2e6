use super::{ToolError, ToolErrorKind};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    ResourceNotFound = -32002,
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct McpError {
    pub code: ErrorCode,
    pub message: String,
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unknown_prompt(name: &str) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("Unknown prompt: {}", name))
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match err.kind {
            ToolErrorKind::InvalidParams | ToolErrorKind::MissingArgument => {
                ErrorCode::InvalidParams
            }
            ToolErrorKind::NotFound => ErrorCode::ResourceNotFound,
            _ => ErrorCode::InternalError,
        };
        McpError::new(code, err.message)
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for McpError {}

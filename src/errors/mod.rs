mod identitynow_error;
mod mcp_error;
mod tool_error;

pub use identitynow_error::IdentityNowError;
pub use mcp_error::{ErrorCode, McpError};
pub use tool_error::{ToolError, ToolErrorKind};

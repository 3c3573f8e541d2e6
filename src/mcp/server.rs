use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::tool_catalog;
use crate::mcp::prompts::{get_prompt, list_prompts};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "identitynow-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {}, "resources": {}, "prompts": {} },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        })
    }

    fn handle_tools_list(&self) -> Value {
        json!({ "tools": tool_catalog() })
    }

    async fn handle_tools_call(&self, request: &JsonRpcRequest) -> Result<Value, McpError> {
        let name = request
            .param_str("name")
            .ok_or_else(|| McpError::new(ErrorCode::InvalidParams, "Missing tool name"))?;
        let args = request
            .params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Null);
        Ok(self.app.tool_executor.call(name, args).await)
    }

    async fn handle_resources_read(&self, request: &JsonRpcRequest) -> Result<Value, McpError> {
        let uri = request
            .param_str("uri")
            .ok_or_else(|| McpError::new(ErrorCode::InvalidParams, "Missing resource uri"))?;
        self.app.resources.read(uri).await
    }

    fn handle_prompts_get(&self, request: &JsonRpcRequest) -> Result<Value, McpError> {
        let name = request
            .param_str("name")
            .ok_or_else(|| McpError::new(ErrorCode::InvalidParams, "Missing prompt name"))?;
        let args = request
            .params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Null);
        get_prompt(name, &args)
    }

    /// Dispatches one decoded JSON-RPC message. Notifications get no reply.
    pub async fn handle_message(&self, message: Value) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest,
                    "Invalid request",
                ))
            }
        };
        if request.is_notification() {
            self.app
                .logger
                .debug("notification", Some(&json!({ "method": request.method })));
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(&request).await,
            "resources/list" => Ok(self.app.resources.list().await),
            "resources/read" => self.handle_resources_read(&request).await,
            "prompts/list" => Ok(list_prompts()),
            "prompts/get" => self.handle_prompts_get(&request),
            method if method.starts_with("notifications/") => Ok(json!({})),
            method => Err(McpError::new(
                ErrorCode::MethodNotFound,
                format!("Method not found: {}", method),
            )),
        };
        Some(JsonRpcResponse::from_outcome(id, outcome))
    }

    async fn write_frame<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), ToolError>
    where
        W: AsyncWrite + Unpin,
    {
        let payload = serde_json::to_string(response)
            .map_err(|err| ToolError::internal(format!("Failed to encode response: {}", err)))?;
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Newline-delimited JSON-RPC over stdin/stdout until stdin closes.
    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let mut writer = BufWriter::new(stdout);

        while let Some(line) = reader.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let response = match serde_json::from_str::<Value>(trimmed) {
                Ok(message) => self.handle_message(message).await,
                Err(_) => Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError,
                    "Parse error",
                )),
            };
            if let Some(response) = response {
                Self::write_frame(&mut writer, &response).await?;
            }
        }

        self.app.logger.info("stdin closed, shutting down", None);
        Ok(())
    }
}

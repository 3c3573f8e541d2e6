use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::ToolError;
use crate::mcp::catalog::validate_tool_args;
use crate::services::logger::Logger;
use crate::utils::suggest::did_you_mean;

/// Payload of a successful tool call. Data tools return JSON, report tools
/// return preformatted text.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Text(String),
}

impl ToolOutput {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        serde_json::to_value(value)
            .map(ToolOutput::Json)
            .map_err(|err| ToolError::internal(format!("Failed to serialize result: {}", err)))
    }

    pub fn render(&self) -> String {
        match self {
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutput::Text(text) => text.clone(),
        }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError>;
}

/// MCP `tools/call` result. Failures are regular results flagged with
/// `isError`; their text is exactly the error message.
pub fn call_tool_result(outcome: &Result<ToolOutput, ToolError>) -> Value {
    match outcome {
        Ok(output) => json!({
            "content": [{ "type": "text", "text": output.render() }],
            "isError": false,
        }),
        Err(err) => json!({
            "content": [{ "type": "text", "text": err.message }],
            "isError": true,
            "structuredContent": { "error": err },
        }),
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let Some(handler) = self.handlers.get(tool) else {
            let mut err = ToolError::unknown_tool(tool);
            if let Some(hint) = did_you_mean(tool, self.handlers.keys().map(String::as_str)) {
                err = err.with_hint(hint);
            }
            self.logger.warn("unknown tool", Some(&json!({ "tool": tool })));
            return Err(err);
        };

        let args = if args.is_null() { json!({}) } else { args };
        if !args.is_object() {
            return Err(ToolError::invalid_params("Arguments must be an object"));
        }
        validate_tool_args(tool, &args)?;

        let call_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        self.logger.debug(
            "tool call",
            Some(&json!({ "tool": tool, "call_id": call_id, "args": args })),
        );

        let result = handler.handle(tool, args).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => self.logger.debug(
                "tool call finished",
                Some(&json!({ "tool": tool, "call_id": call_id, "duration_ms": duration_ms })),
            ),
            Err(err) => self.logger.warn(
                "tool call failed",
                Some(&json!({
                    "tool": tool,
                    "call_id": call_id,
                    "duration_ms": duration_ms,
                    "code": err.code,
                    "message": err.message,
                })),
            ),
        }
        result
    }

    /// Never fails: every error becomes an error-flagged result.
    pub async fn call(&self, tool: &str, args: Value) -> Value {
        call_tool_result(&self.execute(tool, args).await)
    }
}

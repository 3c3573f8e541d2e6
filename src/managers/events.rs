use crate::constants::{events as event_defaults, limits};
use crate::errors::ToolError;
use crate::services::identitynow::{AuditQuery, IdentityNowService};
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::validation::Validation;
use crate::utils::markdown::{identity_events_detailed, identity_events_summary};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const EVENT_TOOLS: &[&str] = &["search_identity_events", "search_audit_events"];

const REPORT_FORMATS: &[&str] = &["detailed", "summary"];

#[derive(Clone)]
pub struct EventManager {
    validation: Validation,
    service: Arc<IdentityNowService>,
}

impl EventManager {
    pub fn new(validation: Validation, service: Arc<IdentityNowService>) -> Self {
        Self {
            validation,
            service,
        }
    }

    async fn search_identity_events(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let id = self.validation.require_identifier(&args, "identity_id")?;
        let days_back = self.validation.positive_integer(
            &args,
            "days_back",
            event_defaults::DEFAULT_DAYS_BACK as usize,
        )?;
        let days_back = u32::try_from(days_back)
            .map_err(|_| ToolError::invalid_params("days_back is too large"))?;
        let event_types = self.validation.optional_string_list(&args, "event_types")?;
        let format = self
            .validation
            .choice(&args, "format", REPORT_FORMATS, "detailed")?;

        let events = self
            .service
            .get_identity_events(&id, days_back, event_types)
            .await?;
        let report = if format == "summary" {
            identity_events_summary(&events)
        } else {
            identity_events_detailed(&events)
        };
        Ok(ToolOutput::Text(report))
    }

    async fn search_audit_events(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let query = AuditQuery {
            identity_id: self.validation.optional_string(&args, "identity_id")?,
            start: self.validation.optional_string(&args, "start_date")?,
            end: self.validation.optional_string(&args, "end_date")?,
            event_types: self
                .validation
                .optional_string_list(&args, "event_types")?
                .unwrap_or_default(),
            limit: Some(self.validation.positive_integer(
                &args,
                "limit",
                limits::AUDIT_EVENT_LIMIT,
            )?),
        };
        let events = self.service.search_audit_events(&query).await?;
        ToolOutput::json(&events)
    }
}

#[async_trait]
impl ToolHandler for EventManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            "search_identity_events" => self.search_identity_events(args).await,
            "search_audit_events" => self.search_audit_events(args).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

use crate::constants::limits;
use crate::errors::ToolError;
use crate::services::identitynow::IdentityNowService;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const ACCESS_TOOLS: &[&str] = &[
    "search_access_profiles",
    "search_roles",
    "search_entitlements",
    "get_entitlement",
    "search_entitlements_by_source",
];

#[derive(Clone)]
pub struct AccessManager {
    validation: Validation,
    service: Arc<IdentityNowService>,
}

impl AccessManager {
    pub fn new(validation: Validation, service: Arc<IdentityNowService>) -> Self {
        Self {
            validation,
            service,
        }
    }

    async fn search_access_profiles(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let query = self.validation.optional_string(&args, "query")?;
        let profiles = self.service.search_access_profiles(query.as_deref()).await?;
        ToolOutput::json(&profiles)
    }

    async fn search_roles(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let query = self.validation.optional_string(&args, "query")?;
        let roles = self.service.search_roles(query.as_deref()).await?;
        ToolOutput::json(&roles)
    }

    async fn search_entitlements(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let query = self.validation.optional_string(&args, "query")?;
        let limit = self
            .validation
            .positive_integer(&args, "limit", limits::TOOL_SEARCH_LIMIT)?;
        let entitlements = self
            .service
            .search_entitlements(query.as_deref(), limit)
            .await?;
        ToolOutput::json(&entitlements)
    }

    async fn get_entitlement(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let id = self
            .validation
            .require_identifier(&args, "entitlement_id")?;
        let entitlement = self.service.get_entitlement(&id).await?;
        ToolOutput::json(&entitlement)
    }

    async fn search_entitlements_by_source(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let source_id = self.validation.require_string(&args, "source_id")?;
        let query = self.validation.optional_string(&args, "query")?;
        let limit = self
            .validation
            .positive_integer(&args, "limit", limits::TOOL_SEARCH_LIMIT)?;
        let entitlements = self
            .service
            .search_entitlements_by_source(&source_id, query.as_deref(), limit)
            .await?;
        ToolOutput::json(&entitlements)
    }
}

#[async_trait]
impl ToolHandler for AccessManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            "search_access_profiles" => self.search_access_profiles(args).await,
            "search_roles" => self.search_roles(args).await,
            "search_entitlements" => self.search_entitlements(args).await,
            "get_entitlement" => self.get_entitlement(args).await,
            "search_entitlements_by_source" => self.search_entitlements_by_source(args).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

use crate::errors::ToolError;
use crate::services::identitynow::IdentityNowService;
use crate::services::logger::Logger;
use crate::services::mappings::{render_report, MappingFormat};
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const PROFILE_TOOLS: &[&str] = &[
    "get_identity_profiles",
    "get_identity_profile",
    "extract_profile_attribute_mappings",
];

const MAPPING_FORMATS: &[&str] = &["table", "json", "csv"];

#[derive(Clone)]
pub struct ProfileManager {
    logger: Logger,
    validation: Validation,
    service: Arc<IdentityNowService>,
}

impl ProfileManager {
    pub fn new(logger: Logger, validation: Validation, service: Arc<IdentityNowService>) -> Self {
        Self {
            logger: logger.child("profiles"),
            validation,
            service,
        }
    }

    async fn get_identity_profiles(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let query = self.validation.optional_string(&args, "query")?;
        let profiles = self
            .service
            .search_identity_profiles(query.as_deref())
            .await?;
        ToolOutput::json(&profiles)
    }

    async fn get_identity_profile(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let id = self.validation.require_identifier(&args, "profile_id")?;
        let profile = self.service.get_identity_profile(&id).await?;
        ToolOutput::json(&profile)
    }

    /// `profile_id` wins over `profile_name`; with neither, every profile.
    async fn extract_attribute_mappings(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let profile_id = self.validation.optional_identifier(&args, "profile_id")?;
        let profile_name = self.validation.optional_string(&args, "profile_name")?;
        let format: MappingFormat = self
            .validation
            .choice(&args, "format", MAPPING_FORMATS, "table")?
            .parse()
            .map_err(ToolError::invalid_params)?;

        let profiles = match profile_id {
            Some(id) => vec![self.service.get_identity_profile(&id).await?],
            None => {
                self.service
                    .search_identity_profiles(profile_name.as_deref())
                    .await?
            }
        };
        self.logger.debug(
            "rendering attribute mappings",
            Some(&serde_json::json!({ "profiles": profiles.len(), "format": format!("{:?}", format) })),
        );
        Ok(ToolOutput::Text(render_report(&profiles, format)))
    }
}

#[async_trait]
impl ToolHandler for ProfileManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            "get_identity_profiles" => self.get_identity_profiles(args).await,
            "get_identity_profile" => self.get_identity_profile(args).await,
            "extract_profile_attribute_mappings" => self.extract_attribute_mappings(args).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

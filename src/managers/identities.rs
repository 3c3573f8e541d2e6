use crate::constants::limits;
use crate::errors::ToolError;
use crate::managers::partial;
use crate::services::identitynow::IdentityNowService;
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolHandler, ToolOutput};
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const IDENTITY_TOOLS: &[&str] = &[
    "search_identities",
    "get_identity",
    "get_identity_accounts",
    "get_identity_access",
    "search_accounts",
];

#[derive(Clone)]
pub struct IdentityManager {
    logger: Logger,
    validation: Validation,
    service: Arc<IdentityNowService>,
}

impl IdentityManager {
    pub fn new(logger: Logger, validation: Validation, service: Arc<IdentityNowService>) -> Self {
        Self {
            logger: logger.child("identities"),
            validation,
            service,
        }
    }

    async fn search_identities(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let query = self.validation.optional_string(&args, "query")?;
        let limit = self
            .validation
            .positive_integer(&args, "limit", limits::TOOL_SEARCH_LIMIT)?;
        let identities = self
            .service
            .search_identities(query.as_deref(), limit)
            .await?;
        ToolOutput::json(&identities)
    }

    /// Identity record merged with its accounts and access. Sub-fetch
    /// failures leave an empty list and an entry under `errors`.
    async fn get_identity(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let id = self.validation.require_identifier(&args, "identity_id")?;
        let include_accounts = self
            .validation
            .optional_bool(&args, "include_accounts", true)?;
        let include_access = self.validation.optional_bool(&args, "include_access", true)?;

        let (identity, accounts, access_profiles, roles) = tokio::join!(
            self.service.get_identity(&id),
            async {
                if include_accounts {
                    Some(self.service.get_identity_accounts(&id).await)
                } else {
                    None
                }
            },
            async {
                if include_access {
                    Some(self.service.get_identity_access_profiles(&id).await)
                } else {
                    None
                }
            },
            async {
                if include_access {
                    Some(self.service.get_identity_roles(&id).await)
                } else {
                    None
                }
            },
        );

        let identity = identity?;
        let mut record = match serde_json::to_value(&identity) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut errors = Map::new();
        if let Some(accounts) = accounts {
            record.insert("accounts".to_string(), partial("accounts", accounts, &mut errors)?);
        }
        if let Some(access_profiles) = access_profiles {
            record.insert(
                "accessProfiles".to_string(),
                partial("accessProfiles", access_profiles, &mut errors)?,
            );
        }
        if let Some(roles) = roles {
            record.insert("roles".to_string(), partial("roles", roles, &mut errors)?);
        }
        if !errors.is_empty() {
            self.logger.warn(
                "identity returned with partial data",
                Some(&serde_json::json!({ "identity_id": id, "errors": errors })),
            );
            record.insert("errors".to_string(), Value::Object(errors));
        }
        Ok(ToolOutput::Json(Value::Object(record)))
    }

    async fn get_identity_accounts(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let id = self.validation.require_identifier(&args, "identity_id")?;
        let accounts = self.service.get_identity_accounts(&id).await?;
        ToolOutput::json(&accounts)
    }

    async fn get_identity_access(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let id = self.validation.require_identifier(&args, "identity_id")?;
        let (access_profiles, roles) = tokio::join!(
            self.service.get_identity_access_profiles(&id),
            self.service.get_identity_roles(&id),
        );
        // Both failing means there is nothing partial to report.
        if let (Err(err), Err(_)) = (&access_profiles, &roles) {
            return Err(err.clone().into());
        }
        let mut errors = Map::new();
        let mut record = Map::new();
        record.insert(
            "accessProfiles".to_string(),
            partial("accessProfiles", access_profiles, &mut errors)?,
        );
        record.insert("roles".to_string(), partial("roles", roles, &mut errors)?);
        if !errors.is_empty() {
            record.insert("errors".to_string(), Value::Object(errors));
        }
        Ok(ToolOutput::Json(Value::Object(record)))
    }

    async fn search_accounts(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let query = self.validation.optional_string(&args, "query")?;
        let limit = self
            .validation
            .positive_integer(&args, "limit", limits::TOOL_SEARCH_LIMIT)?;
        let accounts = self.service.search_accounts(query.as_deref(), limit).await?;
        ToolOutput::json(&accounts)
    }
}

#[async_trait]
impl ToolHandler for IdentityManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            "search_identities" => self.search_identities(args).await,
            "get_identity" => self.get_identity(args).await,
            "get_identity_accounts" => self.get_identity_accounts(args).await,
            "get_identity_access" => self.get_identity_access(args).await,
            "search_accounts" => self.search_accounts(args).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

use crate::config::Config;
use crate::errors::ToolError;
use crate::managers::access::{AccessManager, ACCESS_TOOLS};
use crate::managers::events::{EventManager, EVENT_TOOLS};
use crate::managers::identities::{IdentityManager, IDENTITY_TOOLS};
use crate::managers::profiles::{ProfileManager, PROFILE_TOOLS};
use crate::mcp::catalog::tool_catalog;
use crate::mcp::resources::IdentityResources;
use crate::services::api_client::{ApiClient, RetryPolicy};
use crate::services::identitynow::IdentityNowService;
use crate::services::logger::Logger;
use crate::services::token_provider::{ClientCredentialsProvider, TokenProvider};
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: Config,
    pub tokens: Arc<dyn TokenProvider>,
    pub service: Arc<IdentityNowService>,
    pub tool_executor: Arc<ToolExecutor>,
    pub resources: Arc<IdentityResources>,
}

impl App {
    fn validate_tool_wiring(handlers: &HashMap<String, Arc<dyn ToolHandler>>) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize(config: Config) -> Result<Self, ToolError> {
        Self::build(config, None)
    }

    /// Same as `initialize` with an explicit retry policy for the dispatcher.
    pub fn with_retry_policy(config: Config, retry: RetryPolicy) -> Result<Self, ToolError> {
        Self::build(config, Some(retry))
    }

    fn build(config: Config, retry: Option<RetryPolicy>) -> Result<Self, ToolError> {
        let logger = Logger::new("identitynow-mcp");
        let validation = Validation::new();
        let http = ApiClient::build_http_client()?;

        let tokens: Arc<dyn TokenProvider> = Arc::new(ClientCredentialsProvider::new(
            logger.clone(),
            http.clone(),
            &config,
        ));
        let mut api = ApiClient::new(logger.clone(), http, &config, tokens.clone());
        if let Some(retry) = retry {
            api = api.with_retry_policy(retry);
        }
        let service = Arc::new(IdentityNowService::new(logger.clone(), Arc::new(api)));

        let identity_manager: Arc<dyn ToolHandler> = Arc::new(IdentityManager::new(
            logger.clone(),
            validation.clone(),
            service.clone(),
        ));
        let access_manager: Arc<dyn ToolHandler> =
            Arc::new(AccessManager::new(validation.clone(), service.clone()));
        let profile_manager: Arc<dyn ToolHandler> = Arc::new(ProfileManager::new(
            logger.clone(),
            validation.clone(),
            service.clone(),
        ));
        let event_manager: Arc<dyn ToolHandler> =
            Arc::new(EventManager::new(validation.clone(), service.clone()));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for (tools, manager) in [
            (IDENTITY_TOOLS, &identity_manager),
            (ACCESS_TOOLS, &access_manager),
            (PROFILE_TOOLS, &profile_manager),
            (EVENT_TOOLS, &event_manager),
        ] {
            for tool in tools {
                handlers.insert(tool.to_string(), manager.clone());
            }
        }

        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        let resources = Arc::new(IdentityResources::new(
            logger.clone(),
            validation,
            service.clone(),
        ));

        Ok(Self {
            logger,
            config,
            tokens,
            service,
            tool_executor,
            resources,
        })
    }
}

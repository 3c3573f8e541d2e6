pub mod app;
pub mod config;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod models;

pub mod mcp {
    pub mod catalog;
    pub mod prompts;
    pub mod protocol;
    pub mod resources;
    pub mod server;
}

pub mod services {
    pub mod api_client;
    pub mod events;
    pub mod filters;
    pub mod identitynow;
    pub mod logger;
    pub mod mappings;
    pub mod token_provider;
    pub mod tool_executor;
    pub mod validation;
}

pub mod utils {
    pub mod markdown;
    pub mod redact;
    pub mod suggest;
    pub mod table;
    pub mod text;
}

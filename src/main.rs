use clap::{Args, Parser, Subcommand};
use identitynow_mcp::app::App;
use identitynow_mcp::config::{
    server_definition, Config, ENV_BASE_URL, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_MAX_ATTEMPTS,
    ENV_TIMEOUT_MS,
};
use identitynow_mcp::constants::network;
use identitynow_mcp::errors::ToolError;
use identitynow_mcp::mcp::server::McpServer;
use identitynow_mcp::services::logger::Logger;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "identitynow-mcp", version, about = "MCP server for the SailPoint IdentityNow API")]
struct Cli {
    #[command(flatten)]
    connection: Connection,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct Connection {
    /// Tenant API base URL
    #[arg(long, global = true, env = ENV_BASE_URL)]
    base_url: Option<String>,
    #[arg(long, global = true, env = ENV_CLIENT_ID)]
    client_id: Option<String>,
    #[arg(long, global = true, env = ENV_CLIENT_SECRET, hide_env_values = true)]
    client_secret: Option<String>,
    /// Per-request timeout in milliseconds
    #[arg(long, global = true, env = ENV_TIMEOUT_MS)]
    timeout_ms: Option<u64>,
    /// Attempts per request, including the first
    #[arg(long, global = true, env = ENV_MAX_ATTEMPTS)]
    max_attempts: Option<usize>,
}

impl Connection {
    fn into_config(self) -> Result<Config, ToolError> {
        let mut config = Config::new(self.base_url, self.client_id, self.client_secret)?;
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout_ms(timeout_ms);
        }
        if let Some(attempts) = self.max_attempts {
            config = config.with_max_attempts(attempts);
        }
        Ok(config)
    }
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Serve MCP over stdio (default)
    Serve,
    /// Authenticate and list one identity profile, then exit
    Check,
    /// Print an MCP host configuration entry for this binary
    PrintConfig,
}

async fn run(cli: Cli, logger: &Logger) -> Result<(), ToolError> {
    let command = cli.command.unwrap_or(Command::Serve);
    if let Command::PrintConfig = command {
        let exe = std::env::current_exe()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "identitynow-mcp".to_string());
        let base_url = cli
            .connection
            .base_url
            .as_deref()
            .unwrap_or(network::DEFAULT_BASE_URL);
        let definition = server_definition(&exe, base_url, cli.connection.client_id.as_deref());
        let rendered = serde_json::to_string_pretty(&definition)
            .map_err(|err| ToolError::internal(err.to_string()))?;
        println!("{}", rendered);
        return Ok(());
    }

    let config = cli.connection.into_config()?;
    if config.base_url_defaulted {
        logger.warn(
            &format!("{} not set, using placeholder tenant URL", ENV_BASE_URL),
            Some(&serde_json::json!({ "base_url": config.base_url })),
        );
    }
    logger.info("configuration loaded", Some(&config.describe()));

    let app = Arc::new(App::initialize(config)?);
    match command {
        Command::Check => {
            app.service.test_connectivity().await?;
            println!("SailPoint authentication and connectivity successful");
        }
        _ => {
            app.tokens.token().await?;
            logger.info("SailPoint authentication successful", None);
            logger.info("MCP server running on stdio", None);
            McpServer::new(app).run_stdio().await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let logger = Logger::new("identitynow-mcp");
    if let Err(err) = run(cli, &logger).await {
        logger.error(
            &format!("Failed to start server: {}", err.message),
            err.hint.as_ref().map(|hint| serde_json::json!({ "hint": hint })).as_ref(),
        );
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_attempts_flag_counts_every_attempt() {
        let cli = Cli::try_parse_from([
            "identitynow-mcp",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "--max-attempts",
            "5",
            "check",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Some(Command::Check)));
        let config = cli.connection.into_config().expect("config");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(ENV_MAX_ATTEMPTS, "SAILPOINT_MAX_ATTEMPTS");
    }
}

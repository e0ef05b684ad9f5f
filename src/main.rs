//! ada-mcp - MCP tool server over SSE with OAuth
//!
//! Main entry point for the ada-mcp server binary.

use anyhow::Result;

use ada_mcp::cli::{Cli, Commands};
use ada_mcp::commands;
use ada_mcp::config::Config;
use ada_mcp::logging::init_logging;
use ada_mcp::server;
use ada_mcp::tools::ToolRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_logging(cli.verbose, cli.json_logs)?;

    // Load configuration
    let config = Config::load(&cli.config, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!(
                name = %config.server.name,
                version = %config.server.version,
                "Starting server"
            );
            server::serve(config).await?;
            Ok(())
        }
        Commands::Tools { json } => {
            let registry = ToolRegistry::with_default_tools();
            println!("{}", commands::render_tools(&registry, json)?);
            Ok(())
        }
    }
}

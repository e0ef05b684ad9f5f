//! Command-line interface definition for ada-mcp
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// ada-mcp - MCP tool server over SSE with OAuth
///
/// Serves the tool catalog over an event stream and a JSON-RPC message
/// endpoint, gated by an OAuth 2.0 authorization-code flow.
#[derive(Parser, Debug, Clone)]
#[command(name = "ada-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ada-mcp
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Override the listen port (also settable via PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the listen interface
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the tool catalog
    Tools {
        /// Print the catalog as the JSON `tools/list` result
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_port() {
        let cli = Cli::try_parse_from(["ada-mcp", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, Some(9000));
                assert!(host.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_tools_json() {
        let cli = Cli::try_parse_from(["ada-mcp", "--verbose", "tools", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Tools { json: true }));
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["ada-mcp", "serve"]).unwrap();
        assert_eq!(cli.config, "config/config.yaml");
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["ada-mcp"]).is_err());
    }
}

//! Configuration management for ada-mcp
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! environment variables, command-line flags.

use crate::error::{AdaMcpError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for ada-mcp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener and server identity
    #[serde(default)]
    pub server: ServerConfig,
    /// SSE session behaviour
    #[serde(default)]
    pub session: SessionConfig,
    /// OAuth code/token issuance
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP listener and server identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Scheme used when building public URLs from the request `Host`
    /// header (the endpoint event, discovery documents)
    #[serde(default = "default_public_scheme")]
    pub public_scheme: String,

    /// Server name reported in `initialize`, `connected` and `/status`
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Server version reported alongside the name
    #[serde(default = "default_server_version")]
    pub version: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_scheme() -> String {
    "https".to_string()
}

fn default_server_name() -> String {
    "ada-mcp".to_string()
}

fn default_server_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_scheme: default_public_scheme(),
            name: default_server_name(),
            version: default_server_version(),
        }
    }
}

/// SSE session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds between `ping` events on an authorized stream
    #[serde(default = "default_keepalive_seconds")]
    pub keepalive_seconds: u64,
}

fn default_keepalive_seconds() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_seconds: default_keepalive_seconds(),
        }
    }
}

/// OAuth authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secrets accepted on the consent form. Empty means nobody
    /// can complete the authorize step.
    #[serde(default)]
    pub shared_secrets: Vec<String>,

    /// Lifetime of an authorization code in seconds
    #[serde(default = "default_code_ttl")]
    pub code_ttl_seconds: u64,

    /// Lifetime of an access token in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,

    /// Scope granted when a request names none
    #[serde(default = "default_scope")]
    pub default_scope: String,

    /// Scopes advertised in discovery metadata
    #[serde(default = "default_scopes_supported")]
    pub scopes_supported: Vec<String>,

    /// Verify PKCE challenges at token exchange. Off by default.
    #[serde(default)]
    pub enforce_pkce: bool,

    /// Seconds between sweeps that drop expired codes and tokens
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

fn default_code_ttl() -> u64 {
    600
}

fn default_token_ttl() -> u64 {
    30 * 24 * 60 * 60
}

fn default_scope() -> String {
    "mcp".to_string()
}

fn default_scopes_supported() -> Vec<String> {
    vec!["mcp".to_string()]
}

fn default_purge_interval() -> u64 {
    300
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            shared_secrets: Vec::new(),
            code_ttl_seconds: default_code_ttl(),
            token_ttl_seconds: default_token_ttl(),
            default_scope: default_scope(),
            scopes_supported: default_scopes_supported(),
            enforce_pkce: false,
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AdaMcpError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AdaMcpError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Some(port) = parse_env::<u16>("PORT") {
            self.server.port = port;
        }

        if let Ok(host) = std::env::var("ADA_MCP_HOST") {
            self.server.host = host;
        }

        if let Ok(scheme) = std::env::var("ADA_MCP_PUBLIC_SCHEME") {
            self.server.public_scheme = scheme;
        }

        if let Ok(secrets) = std::env::var("ADA_MCP_SHARED_SECRETS") {
            self.auth.shared_secrets = secrets
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(seconds) = parse_env::<u64>("ADA_MCP_KEEPALIVE_SECONDS") {
            self.session.keepalive_seconds = seconds;
        }

        if let Some(enforce) = parse_env::<bool>("ADA_MCP_ENFORCE_PKCE") {
            self.auth.enforce_pkce = enforce;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let crate::cli::Commands::Serve { port, host } = &cli.command {
            if let Some(port) = port {
                self.server.port = *port;
            }
            if let Some(host) = host {
                self.server.host = host.clone();
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AdaMcpError::Config("server.port must be greater than 0".to_string()).into());
        }

        let valid_schemes = ["http", "https"];
        if !valid_schemes.contains(&self.server.public_scheme.as_str()) {
            return Err(AdaMcpError::Config(format!(
                "Invalid public_scheme: {}. Must be one of: {}",
                self.server.public_scheme,
                valid_schemes.join(", ")
            ))
            .into());
        }

        if self.server.name.trim().is_empty() {
            return Err(AdaMcpError::Config("server.name cannot be empty".to_string()).into());
        }

        if self.session.keepalive_seconds == 0 {
            return Err(AdaMcpError::Config(
                "session.keepalive_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.auth.code_ttl_seconds == 0 || self.auth.token_ttl_seconds == 0 {
            return Err(AdaMcpError::Config(
                "auth.code_ttl_seconds and auth.token_ttl_seconds must be greater than 0"
                    .to_string(),
            )
            .into());
        }

        if self.auth.purge_interval_seconds == 0 {
            return Err(AdaMcpError::Config(
                "auth.purge_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.auth.shared_secrets.is_empty() {
            tracing::warn!("auth.shared_secrets is empty; the authorize step will reject everyone");
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use serial_test::serial;

    fn serve_cli(port: Option<u16>, host: Option<String>) -> Cli {
        Cli {
            config: "config/config.yaml".to_string(),
            verbose: false,
            json_logs: false,
            command: Commands::Serve { port, host },
        }
    }

    fn clear_env() {
        for name in [
            "PORT",
            "ADA_MCP_HOST",
            "ADA_MCP_PUBLIC_SCHEME",
            "ADA_MCP_SHARED_SECRETS",
            "ADA_MCP_KEEPALIVE_SECONDS",
            "ADA_MCP_ENFORCE_PKCE",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_scheme, "https");
        assert_eq!(config.session.keepalive_seconds, 30);
        assert_eq!(config.auth.code_ttl_seconds, 600);
        assert_eq!(config.auth.token_ttl_seconds, 2_592_000);
        assert!(!config.auth.enforce_pkce);
        assert!(config.auth.shared_secrets.is_empty());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_scheme() {
        let mut config = Config::default();
        config.server.public_scheme = "ftp".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("public_scheme"));
    }

    #[test]
    fn test_config_validation_zero_keepalive() {
        let mut config = Config::default();
        config.session.keepalive_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_ttl() {
        let mut config = Config::default();
        config.auth.code_ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
server:
  port: 9000
  public_scheme: http
session:
  keepalive_seconds: 5
auth:
  shared_secrets: ["s3cret", "other"]
  enforce_pkce: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_scheme, "http");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.keepalive_seconds, 5);
        assert_eq!(config.auth.shared_secrets, vec!["s3cret", "other"]);
        assert!(config.auth.enforce_pkce);
        assert_eq!(config.auth.code_ttl_seconds, 600);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.default_scope, "mcp");
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let cli = serve_cli(None, None);
        let config = Config::load("/nonexistent/ada-mcp.yaml", &cli).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server:\n  port: 7001\n").unwrap();

        let cli = serve_cli(None, None);
        let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.server.port, 7001);
    }

    #[test]
    #[serial]
    fn test_load_malformed_file_is_error() {
        clear_env();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "server: [unclosed").unwrap();

        let cli = serve_cli(None, None);
        let err = Config::load(path.to_str().unwrap(), &cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        clear_env();
        std::env::set_var("PORT", "9191");
        std::env::set_var("ADA_MCP_SHARED_SECRETS", "alpha, beta,,");
        std::env::set_var("ADA_MCP_ENFORCE_PKCE", "true");

        let mut config = Config::default();
        config.apply_env_vars();
        clear_env();

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.auth.shared_secrets, vec!["alpha", "beta"]);
        assert!(config.auth.enforce_pkce);
    }

    #[test]
    #[serial]
    fn test_invalid_env_port_is_ignored() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");

        let mut config = Config::default();
        config.apply_env_vars();
        clear_env();

        assert_eq!(config.server.port, 8080);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_env() {
        clear_env();
        std::env::set_var("PORT", "9191");

        let cli = serve_cli(Some(7777), Some("127.0.0.1".to_string()));
        let config = Config::load("/nonexistent/ada-mcp.yaml", &cli).unwrap();
        clear_env();

        assert_eq!(config.server.port, 7777);
        assert_eq!(config.server.host, "127.0.0.1");
    }
}

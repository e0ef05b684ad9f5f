//! ada-mcp - MCP tool server over SSE with OAuth
//!
//! This library provides the server behind the `ada-mcp` binary: an SSE
//! session stream, a JSON-RPC message endpoint serving a small tool catalog,
//! and the OAuth 2.0 authorization-code flow that issues the bearer tokens
//! those endpoints accept.
//!
//! # Architecture
//!
//! - `auth`: credential store, consent, token exchange, discovery documents
//! - `mcp`: JSON-RPC wire types, dispatcher, SSE session manager
//! - `tools`: tool trait, registry and built-in tools
//! - `server`: axum router and handlers
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use ada_mcp::{server, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!     server::serve(config).await
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod mcp;
pub mod server;
pub mod tools;

// Re-export commonly used types
pub use auth::{CredentialStore, InMemoryStore};
pub use config::Config;
pub use error::{AdaMcpError, OAuthError, Result};
pub use server::{router, AppState};
pub use tools::{ToolExecutor, ToolRegistry};

//! Error types for ada-mcp
//!
//! This module defines the error types used throughout the server,
//! using `thiserror` for ergonomic error handling.
//!
//! Protocol-level failures never surface through these types: JSON-RPC
//! errors are encoded as response objects, stream authorization failures
//! become SSE `error` events, and OAuth failures are carried by
//! [`OAuthError`]. [`AdaMcpError`] covers everything that can go wrong
//! around those protocols (configuration, I/O, tool execution).

use thiserror::Error;

/// Main error type for ada-mcp operations
#[derive(Error, Debug)]
pub enum AdaMcpError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// HTTP server errors (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for ada-mcp operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// An OAuth 2.0 protocol error as returned by the token endpoint.
///
/// The [`Display`](std::fmt::Display) form is `"<error>: <description>"`;
/// [`OAuthError::error_code`] yields the RFC 6749 `error` string.
///
/// # Examples
///
/// ```
/// use ada_mcp::error::OAuthError;
///
/// let err = OAuthError::InvalidGrant("unknown authorization code".to_string());
/// assert_eq!(err.error_code(), "invalid_grant");
/// assert_eq!(err.description(), "unknown authorization code");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// The request is missing a parameter or could not be decoded.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// The authorization code is unknown, already used, or expired.
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// The grant type is not one the server issues tokens for.
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    /// The resource owner denied the request.
    #[error("access_denied: {0}")]
    AccessDenied(String),

    /// The presented bearer token is unknown or expired.
    #[error("invalid_token: {0}")]
    InvalidToken(String),
}

impl OAuthError {
    /// Returns the RFC 6749 `error` code for this variant.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::AccessDenied(_) => "access_denied",
            Self::InvalidToken(_) => "invalid_token",
        }
    }

    /// Returns the human-readable `error_description`.
    pub fn description(&self) -> &str {
        match self {
            Self::InvalidRequest(d)
            | Self::InvalidGrant(d)
            | Self::UnsupportedGrantType(d)
            | Self::AccessDenied(d)
            | Self::InvalidToken(d) => d,
        }
    }

    /// Builds the `{error, error_description}` JSON body.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error_code(),
            "error_description": self.description(),
        })
    }
}

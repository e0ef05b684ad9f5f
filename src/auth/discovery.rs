//! Discovery documents served under `/.well-known/`
//!
//! All URLs are derived from the public base (`{scheme}://{host}`) of the
//! request being answered, so the same process can sit behind several
//! host names. Nothing here holds state.
//!
//! # References
//!
//! - RFC 8414 <https://www.rfc-editor.org/rfc/rfc8414>
//! - RFC 9728 <https://www.rfc-editor.org/rfc/rfc9728>

use serde::{Deserialize, Serialize};

use crate::auth::exchanger::SUPPORTED_GRANTS;
use crate::auth::pkce::SUPPORTED_METHODS;
use crate::mcp::types::{McpTool, PROTOCOL_VERSION};

/// Path of the RFC 8414 metadata document.
pub const AUTHORIZATION_SERVER_PATH: &str = "/.well-known/oauth-authorization-server";
/// Path of the RFC 9728 metadata document.
pub const PROTECTED_RESOURCE_PATH: &str = "/.well-known/oauth-protected-resource";
/// Path of the MCP manifest.
pub const MCP_MANIFEST_PATH: &str = "/.well-known/mcp.json";

/// Builds `{scheme}://{host}`.
///
/// # Examples
///
/// ```
/// use ada_mcp::auth::discovery::public_base;
///
/// assert_eq!(public_base("https", "ada.example.com"), "https://ada.example.com");
/// ```
pub fn public_base(scheme: &str, host: &str) -> String {
    format!("{}://{}", scheme, host)
}

// ---------------------------------------------------------------------------
// Authorization Server Metadata (RFC 8414)
// ---------------------------------------------------------------------------

/// Metadata describing this server's OAuth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    /// Issuer identifier: the public base URL.
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,
}

impl AuthorizationServerMetadata {
    pub fn for_base(base: &str, scopes: &[String]) -> Self {
        Self {
            issuer: base.to_string(),
            authorization_endpoint: format!("{}/authorize", base),
            token_endpoint: format!("{}/token", base),
            response_types_supported: vec!["code".to_string()],
            grant_types_supported: SUPPORTED_GRANTS.iter().map(|g| g.to_string()).collect(),
            code_challenge_methods_supported: SUPPORTED_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            token_endpoint_auth_methods_supported: vec!["none".to_string()],
            scopes_supported: scopes.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Protected Resource Metadata (RFC 9728)
// ---------------------------------------------------------------------------

/// Metadata pointing clients of the SSE resource at this authorization
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// The protected resource: the SSE endpoint.
    pub resource: String,
    pub authorization_servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,
    pub bearer_methods_supported: Vec<String>,
}

impl ProtectedResourceMetadata {
    pub fn for_base(base: &str, scopes: &[String]) -> Self {
        Self {
            resource: format!("{}/sse", base),
            authorization_servers: vec![base.to_string()],
            scopes_supported: scopes.to_vec(),
            bearer_methods_supported: vec!["header".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// MCP manifest
// ---------------------------------------------------------------------------

/// Transport endpoints listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEndpoints {
    pub sse: String,
    pub message: String,
}

/// Authorization block of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAuthorization {
    #[serde(rename = "type")]
    pub kind: String,
    pub metadata_url: String,
}

/// The `/.well-known/mcp.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpManifest {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
    pub transport: String,
    pub endpoints: ManifestEndpoints,
    pub authorization: ManifestAuthorization,
    /// Tool names in catalog order.
    pub tools: Vec<String>,
}

impl McpManifest {
    pub fn for_base(base: &str, name: &str, version: &str, tools: &[McpTool]) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            transport: "sse".to_string(),
            endpoints: ManifestEndpoints {
                sse: format!("{}/sse", base),
                message: format!("{}/message", base),
            },
            authorization: ManifestAuthorization {
                kind: "oauth2".to_string(),
                metadata_url: format!("{}{}", base, AUTHORIZATION_SERVER_PATH),
            },
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

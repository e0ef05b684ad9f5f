//! MCP protocol types and JSON-RPC 2.0 primitives
//!
//! This module defines the wire types served on the `/message` endpoint.
//! Struct fields are `camelCase` on the wire via
//! `#[serde(rename_all = "camelCase")]`. `Option<>` fields omit their key
//! from JSON when `None`, except for the response `id`, which is always
//! present (and `null` when the request could not be correlated).

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Protocol version constants
// ---------------------------------------------------------------------------

/// The MCP protocol revision announced in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version string carried on every message.
pub const JSONRPC_VERSION: &str = "2.0";

// ---------------------------------------------------------------------------
// JSON-RPC method constants
// ---------------------------------------------------------------------------

/// Lifecycle: client sends `initialize` to open a session.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Lifecycle: client sends `notifications/initialized` after the server ACKs.
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
/// Request the tool catalog.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// Invoke a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";

// ---------------------------------------------------------------------------
// JSON-RPC error codes
// ---------------------------------------------------------------------------

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method (or tool) does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Server-defined: the presented bearer token is unknown or expired.
pub const INVALID_TOKEN: i64 = -32001;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request or notification as received on `/message`.
///
/// `id` is `None` when the key is absent or `null`; such messages are
/// notifications and never receive a response body.
///
/// # Examples
///
/// ```
/// use ada_mcp::mcp::types::JsonRpcRequest;
///
/// let req: JsonRpcRequest =
///     serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
/// assert!(req.is_notification());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version identifier; `"2.0"` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Request correlation identifier. Absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Returns `true` when the message carries no `id`.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A JSON-RPC 2.0 response object.
///
/// Exactly one of `result` or `error` is present.
///
/// # Examples
///
/// ```
/// use ada_mcp::mcp::types::JsonRpcResponse;
///
/// let resp = JsonRpcResponse::success(serde_json::json!(7), serde_json::json!({}));
/// let json = serde_json::to_value(&resp).unwrap();
/// assert_eq!(json["id"], 7);
/// assert!(json.get("error").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version identifier; always `"2.0"`.
    pub jsonrpc: String,
    /// Mirrors the `id` of the request; `null` when it could not be read.
    pub id: serde_json::Value,
    /// Successful result value; mutually exclusive with `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object; mutually exclusive with `result`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response echoing `id`.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response echoing `id`.
    pub fn failure(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns the error code when this is an error response.
    pub fn error_code(&self) -> Option<i64> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// A JSON-RPC 2.0 error object.
///
/// Implements `Display` as `"JSON-RPC error {code}: {message}"`.
///
/// # Examples
///
/// ```
/// use ada_mcp::mcp::types::JsonRpcError;
///
/// let e = JsonRpcError::new(-32600, "Invalid Request");
/// assert_eq!(e.to_string(), "JSON-RPC error -32600: Invalid Request");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Numeric error code as defined by JSON-RPC 2.0 or the server.
    pub code: i64,
    /// Human-readable error description.
    pub message: String,
    /// Optional additional error context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Builds an error with no `data`.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// `-32700 Parse error`.
    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "Parse error")
    }

    /// `-32600 Invalid Request`.
    pub fn invalid_request() -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request")
    }

    /// `-32601 Method not found: <method>`.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    /// `-32601 Unknown tool: <name>`.
    pub fn unknown_tool(name: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Unknown tool: {}", name))
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// Core identity types
// ---------------------------------------------------------------------------

/// Identifies the server implementation by name and version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    /// Short name of the implementation.
    pub name: String,
    /// Version string.
    pub version: String,
}

// ---------------------------------------------------------------------------
// Capability types
// ---------------------------------------------------------------------------

/// Tool capability flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// When `true`, the server may announce catalog changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// The capabilities the server advertises in `initialize`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Server exposes tools via `tools/list` and `tools/call`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    /// Resource capability placeholder (advertised empty).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<serde_json::Value>,
    /// Prompt capability placeholder (advertised empty).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<serde_json::Value>,
}

/// Result of an `initialize` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    /// The protocol version the server speaks.
    pub protocol_version: String,
    /// Capabilities advertised by this server.
    pub capabilities: ServerCapabilities,
    /// Information identifying this server implementation.
    pub server_info: Implementation,
}

// ---------------------------------------------------------------------------
// Tool types
// ---------------------------------------------------------------------------

/// A tool descriptor as listed by `tools/list`.
///
/// # Examples
///
/// ```
/// use ada_mcp::mcp::types::McpTool;
///
/// let tool = McpTool {
///     name: "search".to_string(),
///     description: "Search memory".to_string(),
///     input_schema: serde_json::json!({ "type": "object" }),
/// };
/// let json = serde_json::to_value(&tool).unwrap();
/// assert!(json.get("inputSchema").is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    /// Unique name of the tool.
    pub name: String,
    /// Human-readable description of the tool's purpose.
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    pub input_schema: serde_json::Value,
}

/// Result of a `tools/list` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResponse {
    /// The full catalog in declaration order.
    pub tools: Vec<McpTool>,
}

/// Parameters of a `tools/call` request.
///
/// Both fields are lenient: a missing `name` reads as `""` (and is then
/// reported as an unknown tool), missing `arguments` as an empty object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolParams {
    /// Name of the tool to invoke.
    #[serde(default)]
    pub name: String,
    /// Arguments to pass to the tool.
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

/// Result of a `tools/call` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResponse {
    /// The content items produced by the tool.
    pub content: Vec<ToolResponseContent>,
    /// Set when the tool itself failed; the text block carries the reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResponse {
    /// Wraps a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResponseContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Wraps a tool failure message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: Some(true),
            ..Self::text(text)
        }
    }
}

/// A single content item in a tool response, tagged by `"type"`.
///
/// # Examples
///
/// ```
/// use ada_mcp::mcp::types::ToolResponseContent;
///
/// let c = ToolResponseContent::Text { text: "hello".to_string() };
/// let json = serde_json::to_value(&c).unwrap();
/// assert_eq!(json["type"], "text");
/// assert_eq!(json["text"], "hello");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolResponseContent {
    /// Plain text output.
    Text {
        /// The text content.
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_null_id_is_notification() {
        let req: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "x"})).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_request_string_id_is_preserved() {
        let req: JsonRpcRequest =
            serde_json::from_value(json!({"id": "abc", "method": "tools/list"})).unwrap();
        assert_eq!(req.id, Some(json!("abc")));
        assert!(req.jsonrpc.is_none());
    }

    #[test]
    fn test_request_without_method_fails_to_decode() {
        let res = serde_json::from_value::<JsonRpcRequest>(json!({"id": 1}));
        assert!(res.is_err());
    }

    #[test]
    fn test_error_response_serializes_null_id() {
        let resp = JsonRpcResponse::failure(serde_json::Value::Null, JsonRpcError::parse_error());
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32700, "message": "Parse error"}
            })
        );
    }

    #[test]
    fn test_method_not_found_message() {
        let e = JsonRpcError::method_not_found("resources/list");
        assert_eq!(e.code, -32601);
        assert_eq!(e.message, "Method not found: resources/list");
    }

    #[test]
    fn test_unknown_tool_message() {
        let e = JsonRpcError::unknown_tool("doesnotexist");
        assert_eq!(e.code, -32601);
        assert!(e.message.contains("doesnotexist"));
    }

    #[test]
    fn test_initialize_response_wire_shape() {
        let resp = InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(true),
                }),
                resources: Some(json!({})),
                prompts: Some(json!({})),
            },
            server_info: Implementation {
                name: "ada-mcp".to_string(),
                version: "3.0.0".to_string(),
            },
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["protocolVersion"], "2024-11-05");
        assert_eq!(value["capabilities"]["tools"]["listChanged"], true);
        assert_eq!(value["serverInfo"]["name"], "ada-mcp");
    }

    #[test]
    fn test_call_tool_params_defaults() {
        let params: CallToolParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.name, "");
        assert!(params.arguments.is_none());
    }

    #[test]
    fn test_call_tool_response_text() {
        let value = serde_json::to_value(CallToolResponse::text("{}")).unwrap();
        assert_eq!(value, json!({"content": [{"type": "text", "text": "{}"}]}));
    }

    #[test]
    fn test_call_tool_response_error_flag() {
        let value = serde_json::to_value(CallToolResponse::error("boom")).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["text"], "boom");
    }
}

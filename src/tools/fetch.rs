//! `fetch` placeholder tool
//!
//! Does not perform any network I/O; it reports a fixed body for the
//! requested URI.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::types::McpTool;
use crate::tools::ToolExecutor;

/// The `fetch` tool.
pub struct FetchTool;

#[async_trait]
impl ToolExecutor for FetchTool {
    fn descriptor(&self) -> McpTool {
        McpTool {
            name: "fetch".to_string(),
            description: "Fetch a resource by URI".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"uri": {"type": "string"}},
                "required": ["uri"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let uri = args.get("uri").and_then(Value::as_str).unwrap_or("");
        Ok(json!({
            "uri": uri,
            "content": "Fetched content placeholder",
        }))
    }
}

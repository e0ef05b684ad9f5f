//! `search` placeholder tool

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::types::McpTool;
use crate::tools::ToolExecutor;

/// The `search` tool. Always answers with an empty result set.
pub struct SearchTool;

#[async_trait]
impl ToolExecutor for SearchTool {
    fn descriptor(&self) -> McpTool {
        McpTool {
            name: "search".to_string(),
            description: "Search Ada's memory and knowledge".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args.get("query").and_then(Value::as_str).unwrap_or("");
        Ok(json!({
            "query": query,
            "results": [],
            "message": "Search complete",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_returns_empty_results() {
        let out = SearchTool.execute(json!({"query": "rust"})).await.unwrap();
        assert_eq!(
            out,
            json!({"query": "rust", "results": [], "message": "Search complete"})
        );
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let out = SearchTool.execute(json!({})).await.unwrap();
        assert_eq!(out["query"], "");
    }
}

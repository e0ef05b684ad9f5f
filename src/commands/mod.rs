//! Subcommand handlers

use crate::error::Result;
use crate::mcp::types::ListToolsResponse;
use crate::tools::ToolRegistry;

/// Renders the tool catalog for `ada-mcp tools`.
///
/// With `json` set the output is the exact `tools/list` result; otherwise
/// one `name - description` line per tool.
///
/// # Errors
///
/// Returns error if the catalog cannot be serialized.
pub fn render_tools(registry: &ToolRegistry, json: bool) -> Result<String> {
    let tools = registry.list();
    if json {
        return Ok(serde_json::to_string_pretty(&ListToolsResponse { tools })?);
    }

    Ok(tools
        .iter()
        .map(|tool| format!("{} - {}", tool.name, tool.description))
        .collect::<Vec<_>>()
        .join("\n"))
}

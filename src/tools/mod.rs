//! Tool catalog for ada-mcp
//!
//! This module contains the [`ToolExecutor`] trait, the ordered
//! [`ToolRegistry`] consulted by `tools/list` and `tools/call`, and the
//! built-in placeholder tools.

pub mod fetch;
pub mod invoke;
pub mod search;

use crate::error::Result;
use crate::mcp::types::McpTool;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait for implementing tool behaviour
///
/// Each tool provides its immutable descriptor and an async `execute`
/// returning a JSON value; the dispatcher wraps that value into a single
/// text content block.
///
/// # Examples
///
/// ```
/// use ada_mcp::tools::ToolExecutor;
/// use ada_mcp::mcp::types::McpTool;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ToolExecutor for Echo {
///     fn descriptor(&self) -> McpTool {
///         McpTool {
///             name: "echo".to_string(),
///             description: "Echoes its arguments".to_string(),
///             input_schema: serde_json::json!({"type": "object"}),
///         }
///     }
///
///     async fn execute(&self, args: Value) -> ada_mcp::error::Result<Value> {
///         Ok(args)
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool descriptor listed by `tools/list`
    fn descriptor(&self) -> McpTool;

    /// Executes the tool with the given arguments
    ///
    /// # Arguments
    ///
    /// * `args` - Tool arguments as a JSON value (an empty object when the
    ///   caller sent none)
    ///
    /// # Errors
    ///
    /// Returns error if execution fails
    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// Ordered tool registry
///
/// Enumeration follows registration order so that `tools/list` returns the
/// same catalog in the same order for the life of the process. Lookup is
/// by exact name.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolExecutor>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in catalog:
    /// `Ada.invoke`, `search`, `fetch`, in that order.
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(invoke::AdaInvokeTool));
        registry.register(Arc::new(search::SearchTool));
        registry.register(Arc::new(fetch::FetchTool));
        registry
    }

    /// Register a tool executor under its descriptor name
    ///
    /// Registering a name twice replaces the executor but keeps its
    /// first position in the catalog.
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        let name = executor.descriptor().name;
        match self.index.get(&name) {
            Some(&position) => self.tools[position] = executor,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(executor);
            }
        }
    }

    /// Get a tool executor by exact name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    /// All descriptors in registration order
    pub fn list(&self) -> Vec<McpTool> {
        self.tools.iter().map(|tool| tool.descriptor()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

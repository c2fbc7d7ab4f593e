//! Tool registry for orchestration
//!
//! Maps tool names to handlers. Built once, then shared read-only between runs.

use std::collections::HashMap;

use tracing::warn;
use waypoint_abstraction::ToolSpec;

use super::tool::Tool;

/// Catalog of callable tools, in registration order
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// A tool registered under an existing name replaces the earlier one and
    /// keeps its position.
    pub fn register(&mut self, tool: Tool) {
        let name = tool.name().to_string();
        if let Some(&position) = self.index.get(&name) {
            warn!(tool = %name, "Tool registered twice, replacing earlier definition");
            self.specs[position] = tool.spec.clone();
            self.tools[position] = tool;
        } else {
            self.index.insert(name, self.tools.len());
            self.specs.push(tool.spec.clone());
            self.tools.push(tool);
        }
    }

    /// Register a tool, builder style
    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.register(tool);
        self
    }

    /// Find a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Specs for every tool, as sent to the model
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Registered tool names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    /// Get all tools
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<Tool> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = Tool>>(iter: I) -> Self {
        let mut registry = Self::new();
        for tool in iter {
            registry.register(tool);
        }
        registry
    }
}

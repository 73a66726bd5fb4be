//! Name → tool registry.
//!
//! Dispatch-time lookup plus the descriptor listing that feeds both the
//! toolhost's `/tools` endpoint and the routing prompt. Adding a tool is a
//! registration here — the orchestrator and state machine never change.

use std::collections::BTreeMap;
use std::sync::Arc;

use relay_core::ToolDescriptor;
use tracing::debug;

use crate::traits::{HttpClient, RelayTool};
use crate::weather::WeatherTool;
use crate::web_search::WebSearchTool;

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn RelayTool>>,
}

impl ToolRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name. Replaces any previous entry.
    pub fn register(&mut self, tool: Arc<dyn RelayTool>) {
        debug!(tool = tool.name(), "tool registered");
        let _ = self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn RelayTool>> {
        self.tools.get(name).map(Arc::clone)
    }

    /// Whether a tool with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptors for every registered tool, in name order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Registered names, in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

/// The standard registry: weather + web search.
#[must_use]
pub fn standard_registry(http: Arc<dyn HttpClient>, serper_api_key: Option<String>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WeatherTool::new(Arc::clone(&http))));
    registry.register(Arc::new(WebSearchTool::new(http, serper_api_key)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockHttp;

    fn registry() -> ToolRegistry {
        standard_registry(Arc::new(MockHttp::new()), Some("key".into()))
    }

    #[test]
    fn standard_registry_has_both_tools() {
        let registry = registry();
        assert!(registry.contains("get_weather"));
        assert!(registry.contains("web_search"));
        assert!(!registry.contains("launch_rockets"));
    }

    #[test]
    fn descriptors_list_schemas() {
        let descriptors = registry().descriptors();
        assert_eq!(descriptors.len(), 2);
        let weather = descriptors.iter().find(|d| d.name == "get_weather").unwrap();
        assert_eq!(weather.parameters.get("city").map(String::as_str), Some("string"));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = registry();
        let before = registry.names().len();
        registry.register(Arc::new(WeatherTool::new(Arc::new(MockHttp::new()))));
        assert_eq!(registry.names().len(), before);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AgentStudioError, Result};
use crate::tools::builtin::{EchoTool, TextEnhancerTool};
use crate::tools::tool::Tool;

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry preloaded with `echo` and `text_enhancer`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(TextEnhancerTool));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(Arc::clone)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn call(&self, name: &str, parameters: Map<String, Value>) -> Result<Map<String, Value>> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentStudioError::ToolNotRegistered(name.to_string()))?;
        debug!(tool = %name, "calling tool");
        tool.call(parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_tools_are_reported() {
        let registry = ToolRegistry::new();
        let err = registry.call("nope", Map::new()).await.unwrap_err();
        assert!(matches!(err, AgentStudioError::ToolNotRegistered(name) if name == "nope"));
    }

    #[test]
    fn builtin_registry_lists_tools() {
        assert_eq!(ToolRegistry::with_builtin().names(), ["echo", "text_enhancer"]);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::error::{AgentStudioError, Result};

use super::agent::Agent;
use super::builtin::register_builtin_agents;
use super::host::AgentHost;

pub type AgentFactory = Arc<dyn Fn(AgentConfig) -> Result<Arc<dyn Agent>> + Send + Sync>;

#[derive(Default)]
pub struct AgentFactoryRegistry {
    factories: HashMap<String, AgentFactory>,
}

impl AgentFactoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the `echo` and `text_analyzer` factories.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_builtin_agents(&mut registry);
        registry
    }

    pub fn register_factory<T: Into<String>>(&mut self, name: T, factory: AgentFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn build(&self, factory_name: &str, config: AgentConfig) -> Result<Arc<dyn Agent>> {
        let builder = self
            .factories
            .get(factory_name)
            .ok_or_else(|| AgentStudioError::AgentNotRegistered(factory_name.to_string()))?;
        config.validate()?;
        builder(config)
    }

    /// Builds the agent and wraps it in a host carrying the same config. The
    /// factory name doubles as the agent id when none is configured.
    pub fn build_host(&self, factory_name: &str, mut config: AgentConfig) -> Result<AgentHost> {
        if config.agent_id.is_none() {
            config.agent_id = Some(factory_name.to_string());
        }
        let agent = self.build(factory_name, config.clone())?;
        Ok(AgentHost::new(agent, config))
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

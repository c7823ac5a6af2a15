use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{AgentStudioError, Result};
use crate::utils::validation::ConfigValidator;

const KNOWN_KEYS: &[&str] = &[
    "agent_id",
    "llm_model",
    "llm_temperature",
    "timeout_secs",
    "debug_mode",
    "mcp",
];

/// MCP 工具集成配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct McpConfig {
    /// Toggles the tool-processing graph node and tool context seeding.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

impl McpConfig {
    /// Tool context seeded into every execution state when enabled.
    pub fn context(&self) -> Map<String, Value> {
        if !self.enabled {
            return Map::new();
        }
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Agent 配置
///
/// Every recognised option is an explicit field. Unknown keys in a JSON
/// mapping are reported and dropped by [`AgentConfig::from_value`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Overrides the agent's default identity (its type name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Selects the backend model for the LLM client.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,
    /// Transport timeout applied by HTTP-backed LLM clients.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Adds debug snapshots to execution state and results.
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub mcp: McpConfig,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: None,
            llm_model: default_llm_model(),
            llm_temperature: default_llm_temperature(),
            timeout_secs: default_timeout_secs(),
            debug_mode: false,
            mcp: McpConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(AgentStudioError::config("agent config must be a JSON object"));
        };
        let unknown: Vec<String> = map
            .keys()
            .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        for key in &unknown {
            warn!(key = %key, "ignoring unknown agent config key");
            map.remove(key);
        }
        let config: AgentConfig = serde_json::from_value(Value::Object(map))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_mcp(mut self, mcp: McpConfig) -> Self {
        self.mcp = mcp;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(agent_id) = &self.agent_id {
            ConfigValidator::validate_agent_id(agent_id)?;
        }
        ConfigValidator::validate_model_name(&self.llm_model)?;
        ConfigValidator::validate_temperature(f64::from(self.llm_temperature))?;
        ConfigValidator::validate_timeout(self.timeout_secs)?;
        if let Some(url) = &self.mcp.server_url {
            ConfigValidator::validate_url(url)?;
        }
        Ok(())
    }

    pub fn workflow(&self) -> WorkflowConfig {
        WorkflowConfig {
            debug_mode: self.debug_mode,
            mcp: self.mcp.clone(),
        }
    }
}

/// Options consumed by a workflow runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub mcp: McpConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_applies_defaults() {
        let config = AgentConfig::from_value(json!({})).unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn from_value_drops_unknown_keys() {
        let config = AgentConfig::from_value(json!({
            "llm_model": "gpt-4o",
            "mcp_server_url": "http://localhost:8080",
            "mcp": { "enabled": true }
        }))
        .unwrap();
        assert_eq!(config.llm_model, "gpt-4o");
        assert!(config.mcp.enabled);
    }

    #[test]
    fn from_value_rejects_out_of_range_temperature() {
        let result = AgentConfig::from_value(json!({ "llm_temperature": 3.5 }));
        assert!(result.is_err());
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(AgentConfig::from_value(json!("debug")).is_err());
    }

    #[test]
    fn mcp_context_is_empty_when_disabled() {
        let mcp = McpConfig {
            enabled: false,
            server_url: Some("http://localhost".into()),
            tools: Vec::new(),
        };
        assert!(mcp.context().is_empty());

        let enabled = McpConfig {
            enabled: true,
            ..mcp
        };
        let context = enabled.context();
        assert_eq!(context["server_url"], json!("http://localhost"));
    }
}

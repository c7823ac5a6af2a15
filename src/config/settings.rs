use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{AgentStudioError, Result};

use super::agent_config::{AgentConfig, McpConfig};
use super::env::EnvConfig;

const LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "CRITICAL"];

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

/// 全局设置
///
/// Layered as defaults, then the optional JSON file, then environment
/// overrides (`DEBUG_MODE`, `LOG_LEVEL`, `TIMEOUT`, `LLM_MODEL`,
/// `MCP_ENABLED`), then validation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default)]
    pub mcp: McpConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            log_level: default_log_level(),
            timeout: default_timeout(),
            llm_model: default_llm_model(),
            mcp: McpConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, EnvConfig::get_env_optional)
    }

    /// Same as [`load`](Self::load) with an explicit environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match path {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Self::default(),
        };
        settings.apply_env(lookup);
        settings.validate()?;
        Ok(settings)
    }

    /// File values over defaults. A malformed file is reported and ignored.
    fn from_file(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(AgentStudioError::from)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(AgentStudioError::from))
            .and_then(|value| serde_json::from_value::<Settings>(value).map_err(AgentStudioError::from));
        match parsed {
            Ok(settings) => {
                info!(path = %path.display(), "loaded settings file");
                settings
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to load settings file");
                Self::default()
            }
        }
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(debug) = lookup("DEBUG_MODE").as_deref().and_then(EnvConfig::parse_bool) {
            self.debug_mode = debug;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(timeout) = lookup("TIMEOUT") {
            match timeout.trim().parse() {
                Ok(timeout) => self.timeout = timeout,
                Err(_) => warn!(value = %timeout, "ignoring non-numeric TIMEOUT"),
            }
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm_model = model;
        }
        if let Some(enabled) = lookup("MCP_ENABLED").as_deref().and_then(EnvConfig::parse_bool) {
            self.mcp.enabled = enabled;
        }
    }

    fn validate(&mut self) -> Result<()> {
        if self.timeout == 0 {
            return Err(AgentStudioError::config("timeout must be positive"));
        }
        let level = self.log_level.to_ascii_uppercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            self.log_level = level;
        } else {
            warn!(level = %self.log_level, "invalid log level, using INFO");
            self.log_level = default_log_level();
        }
        Ok(())
    }

    /// Writes the merged settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Agent configuration seeded from these settings.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            llm_model: self.llm_model.clone(),
            timeout_secs: self.timeout,
            debug_mode: self.debug_mode,
            mcp: self.mcp.clone(),
            ..AgentConfig::default()
        }
    }
}

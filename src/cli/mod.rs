use std::path::Path;

use serde_json::Value;

use crate::agent::{AgentFactoryRegistry, AgentHost, TaskRequest};
use crate::config::Settings;
use crate::error::{AgentStudioError, Result};

/// Loads settings (file + environment) and builds the named builtin agent.
pub fn build_host(agent: &str, settings_path: Option<&Path>) -> Result<(Settings, AgentHost)> {
    let settings = Settings::load(settings_path)?;
    let host = AgentFactoryRegistry::with_builtin().build_host(agent, settings.agent_config())?;
    Ok((settings, host))
}

/// Parses `key=value`. The value is read as JSON when it parses, otherwise it
/// is kept as a plain string.
pub fn parse_param(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| AgentStudioError::config(format!("expected key=value, got `{raw}`")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AgentStudioError::config(format!("missing key in `{raw}`")));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn task_request(task_type: &str, params: &[String]) -> Result<TaskRequest> {
    params
        .iter()
        .try_fold(TaskRequest::new(task_type), |request, raw| {
            let (key, value) = parse_param(raw)?;
            Ok(request.with_param(key, value))
        })
}

use std::collections::HashMap;
use std::fs;

use serde_json::json;
use tempfile::tempdir;

use agentstudio::{AgentConfig, Settings};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_environment() -> anyhow::Result<()> {
    let settings = Settings::load_with_env(None, env(&[]))?;
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.log_level, "INFO");
    assert_eq!(settings.timeout, 30);
    assert!(!settings.debug_mode);
    Ok(())
}

#[test]
fn environment_overrides_file_values() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        json!({ "debug_mode": false, "timeout": 10, "llm_model": "gpt-4o" }).to_string(),
    )?;

    let settings = Settings::load_with_env(
        Some(&path),
        env(&[("DEBUG_MODE", "true"), ("LOG_LEVEL", "debug"), ("MCP_ENABLED", "1")]),
    )?;
    assert!(settings.debug_mode);
    assert_eq!(settings.timeout, 10);
    assert_eq!(settings.llm_model, "gpt-4o");
    assert_eq!(settings.log_level, "DEBUG");
    assert!(settings.mcp.enabled);
    Ok(())
}

#[test]
fn malformed_file_falls_back_to_defaults() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json")?;

    let settings = Settings::load_with_env(Some(&path), env(&[("TIMEOUT", "45")]))?;
    assert_eq!(settings.timeout, 45);
    assert_eq!(settings.llm_model, Settings::default().llm_model);
    Ok(())
}

#[test]
fn zero_timeout_is_rejected() {
    let result = Settings::load_with_env(None, env(&[("TIMEOUT", "0")]));
    assert!(result.is_err());
}

#[test]
fn unknown_log_level_is_replaced_with_info() -> anyhow::Result<()> {
    let settings = Settings::load_with_env(None, env(&[("LOG_LEVEL", "chatty")]))?;
    assert_eq!(settings.log_level, "INFO");
    Ok(())
}

#[test]
fn saved_settings_load_back() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("config").join("settings.json");
    let settings = Settings {
        debug_mode: true,
        timeout: 90,
        ..Settings::default()
    };
    settings.save(&path)?;

    let loaded = Settings::load_with_env(Some(&path), env(&[]))?;
    assert_eq!(loaded, settings);
    Ok(())
}

#[test]
fn agent_config_drops_unknown_keys() -> anyhow::Result<()> {
    let config = AgentConfig::from_value(json!({
        "agent_id": "analyzer-1",
        "llm_temperature": 0.2,
        "favourite_colour": "teal",
        "mcp": { "enabled": true, "server_url": "http://localhost:3000", "tools": ["search"] }
    }))?;
    assert_eq!(config.agent_id.as_deref(), Some("analyzer-1"));
    assert!((config.llm_temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.mcp.tools, ["search"]);

    let workflow = config.workflow();
    assert!(workflow.mcp.enabled);
    assert!(!workflow.debug_mode);

    assert!(AgentConfig::from_value(json!({ "mcp": { "server_url": "ftp://x" } })).is_err());
    Ok(())
}

#[test]
fn settings_seed_agent_config() -> anyhow::Result<()> {
    let settings = Settings::load_with_env(
        None,
        env(&[("DEBUG_MODE", "yes"), ("LLM_MODEL", "gpt-4.1"), ("TIMEOUT", "12")]),
    )?;
    let config = settings.agent_config();
    assert!(config.debug_mode);
    assert_eq!(config.llm_model, "gpt-4.1");
    assert_eq!(config.timeout_secs, 12);
    assert!(config.agent_id.is_none());
    Ok(())
}

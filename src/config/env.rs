use std::env;

use crate::error::{AgentStudioError, Result};

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 从环境变量获取值
    pub fn get_env(key: &str) -> Result<String> {
        env::var(key).map_err(|_| {
            AgentStudioError::config(format!("environment variable `{key}` is not set"))
        })
    }

    /// 获取可选的环境变量
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok()
    }

    /// 检查是否启用调试模式
    pub fn is_debug_mode() -> bool {
        env::var("AGENTSTUDIO_DEBUG").is_ok()
    }

    /// `true`/`false` in any case, plus `1`/`0` and `yes`/`no`.
    pub fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(EnvConfig::parse_bool("TRUE"), Some(true));
        assert_eq!(EnvConfig::parse_bool(" 0 "), Some(false));
        assert_eq!(EnvConfig::parse_bool("maybe"), None);
    }

    #[test]
    fn test_missing_env_is_a_config_error() {
        let err = EnvConfig::get_env("AGENTSTUDIO_TEST_SURELY_UNSET").unwrap_err();
        assert!(matches!(err, AgentStudioError::Config(_)));
    }
}

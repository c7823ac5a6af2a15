use crate::error::{AgentStudioError, Result};

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证 URL 格式
    pub fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(AgentStudioError::config("URL must not be empty"));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AgentStudioError::config(format!(
                "URL `{url}` must start with http:// or https://"
            )));
        }

        Ok(())
    }

    /// 验证模型名称
    pub fn validate_model_name(model: &str) -> Result<()> {
        if model.trim().is_empty() {
            return Err(AgentStudioError::config("model name must not be empty"));
        }

        let lower = model.to_lowercase();
        if lower.contains("gpt") && !lower.contains("gpt-") {
            tracing::warn!(
                model = %model,
                "model name looks unusual, GPT models are usually named like 'gpt-4o-mini'"
            );
        }

        Ok(())
    }

    /// 验证 Agent ID
    pub fn validate_agent_id(agent_id: &str) -> Result<()> {
        if agent_id.is_empty() {
            return Err(AgentStudioError::config("agent id must not be empty"));
        }

        if !agent_id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(AgentStudioError::config(format!(
                "agent id `{agent_id}` may only contain letters, digits, `_`, `-` and `.`"
            )));
        }

        Ok(())
    }

    /// 验证温度参数
    pub fn validate_temperature(temperature: f64) -> Result<()> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AgentStudioError::config(format!(
                "temperature must be within 0.0..=2.0, got {temperature}"
            )));
        }
        Ok(())
    }

    pub fn validate_timeout(timeout_secs: u64) -> Result<()> {
        if timeout_secs == 0 {
            return Err(AgentStudioError::config("timeout must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(ConfigValidator::validate_url("").is_err());
        assert!(ConfigValidator::validate_url("example.com").is_err());
        assert!(ConfigValidator::validate_url("http://example.com").is_ok());
        assert!(ConfigValidator::validate_url("https://example.com").is_ok());
    }

    #[test]
    fn test_validate_agent_id() {
        assert!(ConfigValidator::validate_agent_id("").is_err());
        assert!(ConfigValidator::validate_agent_id("text_analyzer-001").is_ok());
        assert!(ConfigValidator::validate_agent_id("agent@1").is_err());
    }

    #[test]
    fn test_validate_temperature() {
        assert!(ConfigValidator::validate_temperature(-0.1).is_err());
        assert!(ConfigValidator::validate_temperature(0.0).is_ok());
        assert!(ConfigValidator::validate_temperature(2.0).is_ok());
        assert!(ConfigValidator::validate_temperature(2.1).is_err());
    }

    #[test]
    fn test_validate_timeout() {
        assert!(ConfigValidator::validate_timeout(0).is_err());
        assert!(ConfigValidator::validate_timeout(30).is_ok());
    }
}

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use super::client::LlmClient;
use super::types::{LlmRequest, LlmResponse};
use crate::config::{AgentConfig, EnvConfig};
use crate::error::{AgentStudioError, Result};

/// OpenAI 兼容的 chat/completions 客户端
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new<S: Into<String>>(api_key: S, model: S, timeout_secs: u64) -> Result<Self> {
        Self::with_base_url("https://api.openai.com/v1", api_key, model, timeout_secs)
    }

    pub fn with_base_url<S1, S2, S3>(
        base_url: S1,
        api_key: S2,
        model: S3,
        timeout_secs: u64,
    ) -> Result<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AgentStudioError::Other(e.into()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Reads `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`); model and
    /// timeout come from the agent config.
    pub fn from_env(config: &AgentConfig) -> Result<Self> {
        let api_key = EnvConfig::get_env("OPENAI_API_KEY")?;
        let base_url = EnvConfig::get_env_optional("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        Self::with_base_url(base_url, api_key, config.llm_model.clone(), config.timeout_secs)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({
                "role": "system",
                "content": system
            }));
        }
        messages.push(json!({
            "role": "user",
            "content": request.user
        }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentStudioError::Other(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentStudioError::Other(anyhow::anyhow!(
                "OpenAI request failed with status {}",
                status
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AgentStudioError::Other(e.into()))?;
        let content = payload["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| AgentStudioError::Other(anyhow::anyhow!("missing message content")))?;

        Ok(LlmResponse {
            content: content.to_string(),
            metadata: Some(payload),
        })
    }
}

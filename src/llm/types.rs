use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LlmRequest {
    #[serde(default)]
    pub system: Option<String>,
    pub user: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_temperature() -> f32 {
    0.7
}

impl LlmRequest {
    pub fn new<T: Into<String>>(user: T, options: LlmOptions) -> Self {
        Self {
            system: options.system,
            user: user.into(),
            temperature: options.temperature.unwrap_or_else(default_temperature),
            metadata: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Per-call options for a prompt-in/text-out LLM call.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LlmOptions {
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl LlmOptions {
    pub fn with_system<T: Into<String>>(mut self, system: T) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

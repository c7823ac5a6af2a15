use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{AgentStudioError, Result};
use crate::llm::{DynLlmClient, LlmOptions, LlmRequest};
use crate::tools::ToolRegistry;

/// External collaborators an agent may call. Either may be absent.
#[derive(Clone, Default)]
pub struct AgentServices {
    llm: Option<DynLlmClient>,
    tools: Option<Arc<ToolRegistry>>,
}

impl AgentServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_llm(mut self, llm: DynLlmClient) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn has_tools(&self) -> bool {
        self.tools.is_some()
    }

    pub async fn llm_call(&self, prompt: &str, options: LlmOptions) -> Result<String> {
        let llm = self.llm.as_ref().ok_or(AgentStudioError::LlmUnavailable)?;
        debug!(prompt_length = prompt.len(), "calling LLM");
        let response = llm.complete(LlmRequest::new(prompt, options)).await?;
        Ok(response.content)
    }

    pub async fn tool_call(
        &self,
        name: &str,
        parameters: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let tools = self.tools.as_ref().ok_or(AgentStudioError::ToolUnavailable)?;
        tools.call(name, parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LocalEchoClient;

    #[tokio::test]
    async fn missing_clients_are_reported() {
        let services = AgentServices::new();
        assert!(matches!(
            services.llm_call("hi", LlmOptions::default()).await,
            Err(AgentStudioError::LlmUnavailable)
        ));
        assert!(matches!(
            services.tool_call("echo", Map::new()).await,
            Err(AgentStudioError::ToolUnavailable)
        ));
    }

    #[tokio::test]
    async fn configured_clients_are_used() {
        let services = AgentServices::new()
            .with_llm(Arc::new(LocalEchoClient))
            .with_tools(Arc::new(ToolRegistry::with_builtin()));
        let text = services.llm_call("hi", LlmOptions::default()).await.unwrap();
        assert_eq!(text, "[Echo] hi");
        let out = services.tool_call("echo", Map::new()).await.unwrap();
        assert!(out.contains_key("echo"));
    }
}

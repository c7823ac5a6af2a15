use async_trait::async_trait;

use super::client::LlmClient;
use super::types::{LlmRequest, LlmResponse};
use crate::error::Result;

/// 本地回显客户端，不访问网络
#[derive(Default, Clone)]
pub struct LocalEchoClient;

#[async_trait]
impl LlmClient for LocalEchoClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let mut content = String::new();
        if let Some(system) = &request.system {
            content.push_str(&format!("[System:{}] ", system.trim()));
        }
        content.push_str(&format!("[Echo] {}", request.user));
        Ok(LlmResponse {
            content,
            metadata: request.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmOptions;

    #[tokio::test]
    async fn echo_prefixes_system_prompt() {
        let request = LlmRequest::new("hi", LlmOptions::default().with_system(" be brief "));
        let response = LocalEchoClient.complete(request).await.unwrap();
        assert_eq!(response.content, "[System:be brief] [Echo] hi");
    }
}

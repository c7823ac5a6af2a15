mod echo;
mod text_analysis;
mod workflow;

pub use echo::EchoAgent;
pub use text_analysis::TextAnalysisWorkflow;
pub use workflow::WorkflowAgent;

use std::sync::Arc;

use crate::agent::{Agent, AgentFactoryRegistry, AgentProfile, AgentServices};
use crate::config::AgentConfig;
use crate::llm::LocalEchoClient;
use crate::tools::ToolRegistry;
use crate::workflow::{ExecutionStrategy, SequentialEngine, WorkflowRunner};

/// Text analysis agent: graph-backed workflow over an LLM and the builtin tools.
pub fn text_analyzer_agent(config: &AgentConfig, services: AgentServices) -> WorkflowAgent {
    let agent_id = config
        .agent_id
        .clone()
        .unwrap_or_else(|| "text_analyzer".to_string());
    let workflow = TextAnalysisWorkflow::new(agent_id, services.clone(), config.llm_temperature);
    let runner = WorkflowRunner::new(
        Arc::new(workflow),
        ExecutionStrategy::graph(SequentialEngine::new()),
        config.workflow(),
    );
    let profile = AgentProfile::new(
        "Text Analyzer",
        "Text analysis agent with LLM and tool integration",
    )
    .with_capabilities(["text_analysis", "sentiment_analysis", "entity_extraction"]);
    WorkflowAgent::new(profile, Arc::new(runner), services)
}

/// Services used by the builtin factories. The OpenAI client is picked when
/// the feature is on and `OPENAI_API_KEY` is set; otherwise the local echo client.
#[cfg_attr(not(feature = "openai-client"), allow(unused_variables))]
pub fn default_services(config: &AgentConfig) -> AgentServices {
    let services = AgentServices::new().with_tools(Arc::new(ToolRegistry::with_builtin()));
    #[cfg(feature = "openai-client")]
    {
        if let Ok(client) = crate::llm::OpenAiClient::from_env(config) {
            return services.with_llm(Arc::new(client));
        }
    }
    services.with_llm(Arc::new(LocalEchoClient))
}

pub fn register_builtin_agents(registry: &mut AgentFactoryRegistry) {
    registry.register_factory(
        "echo",
        Arc::new(|config: AgentConfig| {
            let name = config.agent_id.clone().unwrap_or_else(|| "echo".to_string());
            Ok(Arc::new(EchoAgent::new(name)) as Arc<dyn Agent>)
        }),
    );
    registry.register_factory(
        "text_analyzer",
        Arc::new(|config: AgentConfig| {
            let services = default_services(&config);
            Ok(Arc::new(text_analyzer_agent(&config, services)) as Arc<dyn Agent>)
        }),
    );
}

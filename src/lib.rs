pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;
pub mod utils;
pub mod workflow;

pub use agent::{
    decorate_stream, Agent, AgentCard, AgentFactory, AgentFactoryRegistry, AgentHost,
    AgentProfile, AgentServices, AgentStatus, Artifact, ArtifactReceipt, CardFlags,
    ClientCapabilities, EchoAgent, ExecutionMode, MessageRequest, Negotiation, Notification,
    RecordStream, ResultRecord, ResultStream, TaskLookup, TaskRecord, TaskRequest, TaskStatus,
    TextAnalysisWorkflow, WorkflowAgent,
};
pub use config::{AgentConfig, McpConfig, Settings, WorkflowConfig};
pub use error::{AgentStudioError, Result};
pub use llm::{DynLlmClient, LlmClient, LlmOptions, LlmRequest, LlmResponse, LocalEchoClient};
#[cfg(feature = "openai-client")]
pub use llm::OpenAiClient;
pub use tools::{Tool, ToolRegistry};
pub use utils::{logging, validation};
pub use workflow::{
    node_fn, pure_node, CompiledGraph, ExecutionState, ExecutionStrategy, GraphBuilder,
    GraphEngine, RunnerPhase, RunnerStatus, SequentialEngine, UnavailableEngine, Workflow,
    WorkflowGraph, WorkflowRunner,
};

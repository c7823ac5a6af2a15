pub mod agent;
pub mod builtin;
pub mod card;
pub mod factory;
pub mod host;
pub mod result;
pub mod services;
pub mod stream;
pub mod task;

pub use agent::{Agent, MessageRequest};
pub use builtin::{EchoAgent, TextAnalysisWorkflow, WorkflowAgent};
pub use card::{
    AgentCard, AgentEndpoints, AgentProfile, Artifact, ArtifactReceipt, CardFlags, CardMetadata,
    ClientCapabilities, Negotiation, Notification,
};
pub use factory::{AgentFactory, AgentFactoryRegistry};
pub use host::{AgentHost, AgentStatus};
pub use result::{ExecutionMode, ResultRecord};
pub use services::AgentServices;
pub use stream::{decorate_stream, RecordStream, ResultStream};
pub use task::{TaskLookup, TaskRecord, TaskRegistry, TaskRequest, TaskStatus};

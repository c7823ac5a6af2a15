pub mod agent_config;
pub mod env;
pub mod settings;

pub use agent_config::{AgentConfig, McpConfig, WorkflowConfig};
pub use env::EnvConfig;
pub use settings::Settings;

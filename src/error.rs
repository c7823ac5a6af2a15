use thiserror::Error;

use crate::agent::TaskStatus;

pub type Result<T> = std::result::Result<T, AgentStudioError>;

#[derive(Debug, Error)]
pub enum AgentStudioError {
    #[error("agent `{agent_id}` failed to initialize: {reason}")]
    Initialization { agent_id: String, reason: String },
    #[error("invalid workflow graph `{graph}`: {reason}")]
    InvalidGraph { graph: String, reason: String },
    #[error("graph engine `{engine}` failed: {reason}")]
    Engine { engine: String, reason: String },
    #[error("unknown node `{0}` in workflow graph")]
    UnknownNode(String),
    #[error("maximum steps {0} exceeded")]
    MaxStepsExceeded(u32),
    #[error("workflow execution failed: {0}")]
    Execution(String),
    #[error("LLM client not available")]
    LlmUnavailable,
    #[error("tool client not available")]
    ToolUnavailable,
    #[error("tool `{0}` not registered")]
    ToolNotRegistered(String),
    #[error("agent `{0}` not registered")]
    AgentNotRegistered(String),
    #[error("task `{0}` already exists")]
    TaskExists(String),
    #[error("invalid task transition from `{from}` to `{to}`")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("task `{task_id}` is {status} and cannot run")]
    TaskNotRunnable { task_id: String, status: TaskStatus },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgentStudioError {
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution(reason.into())
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}

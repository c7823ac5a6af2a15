use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflow::TraceEntry;

/// How a record was produced by the workflow layer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Graph,
    Fallback,
    Simple,
}

/// The unit yielded to callers of the streaming protocol.
///
/// Every internal shape (graph output, fallback output, failures) is
/// normalized into this record before it leaves the pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    pub success: bool,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execution_trace: Vec<TraceEntry>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub performance_metrics: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<ExecutionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent: Option<String>,
}

impl ResultRecord {
    pub fn success<T: Into<String>>(content: T) -> Self {
        Self {
            success: true,
            content: content.into(),
            ..Self::default()
        }
    }

    /// Failure record whose content carries `label` so a human reader sees the
    /// failure before the machine-readable `error` string.
    pub fn failure(label: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            content: format!("❌ {label}: {error}"),
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn agent_error(error: impl Into<String>) -> Self {
        Self::failure("Agent Error", error)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_workflow(mut self, workflow_id: &str, trace_id: &str) -> Self {
        self.workflow_id = Some(workflow_id.to_string());
        self.trace_id = Some(trace_id.to_string());
        self
    }

    /// Identity decoration applied at the agent boundary.
    pub fn stamp(mut self, agent_id: &str, session_id: &str) -> Self {
        self.agent_id = Some(agent_id.to_string());
        self.session_id = Some(session_id.to_string());
        self.timestamp = Some(Utc::now());
        self
    }

    pub fn tag_task(mut self, task_id: &str, task_type: &str, source_agent: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self.task_type = Some(task_type.to_string());
        self.source_agent = Some(source_agent.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

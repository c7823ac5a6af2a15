use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::Result;

use super::card::{AgentProfile, Artifact, ArtifactReceipt, CardFlags, Notification};
use super::stream::RecordStream;
use super::task::TaskRecord;

/// Input of one `process_message` call.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageRequest {
    pub query: String,
    pub session_id: String,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl MessageRequest {
    pub fn new<Q: Into<String>, S: Into<String>>(query: Q, session_id: S) -> Self {
        Self {
            query: query.into(),
            session_id: session_id.into(),
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn task_type(&self) -> Option<&str> {
        self.context.get("task_type").and_then(Value::as_str)
    }

    pub fn task_parameters(&self) -> Option<&Map<String, Value>> {
        self.context
            .get("task_data")
            .and_then(|data| data.get("parameters"))
            .and_then(Value::as_object)
    }
}

/// Agent 能力接口
///
/// Concrete agents supply their profile and the message pipeline. Identity,
/// one-time initialization, stream decoration and task bookkeeping are
/// provided by [`AgentHost`](super::AgentHost).
#[async_trait]
pub trait Agent: Send + Sync {
    /// Default identity: the unqualified type name.
    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn profile(&self) -> AgentProfile;

    /// One-time resource setup, run by the first `initialize` call.
    async fn setup_resources(&self) -> Result<()> {
        Ok(())
    }

    fn process_message<'a>(&'a self, request: MessageRequest) -> RecordStream<'a>;

    /// Translates a task into the message it is processed as.
    fn task_request(&self, task: &TaskRecord) -> MessageRequest {
        let query = match task.parameters.get("query").and_then(Value::as_str) {
            Some(query) if !query.is_empty() => query.to_string(),
            _ => format!(
                "Process {} task: {}",
                task.task_type,
                Value::Object(task.parameters.clone())
            ),
        };
        let mut context = Map::new();
        context.insert(
            "task_data".into(),
            serde_json::to_value(task).unwrap_or(Value::Null),
        );
        context.insert("task_type".into(), Value::String(task.task_type.clone()));
        MessageRequest::new(query, task.task_id.clone()).with_context(context)
    }

    fn card_flags(&self) -> CardFlags {
        CardFlags::default()
    }

    async fn handle_notification(&self, agent_id: &str, notification: Notification) -> Result<()> {
        info!(agent = %agent_id, kind = %notification.kind, "notification received");
        Ok(())
    }

    async fn handle_artifact(&self, agent_id: &str, artifact: Artifact) -> Result<ArtifactReceipt> {
        info!(agent = %agent_id, artifact = %artifact.id, "artifact received");
        Ok(ArtifactReceipt {
            artifact_id: artifact.id,
            processed: true,
            processor_agent: agent_id.to_string(),
            processed_at: Utc::now(),
        })
    }
}

use std::sync::Arc;

use async_stream::stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::{AgentStudioError, Result};
use crate::workflow::PROTOCOL_VERSION;

use super::agent::{Agent, MessageRequest};
use super::card::{
    intersect_modalities, AgentCard, Artifact, ArtifactReceipt, ClientCapabilities, Negotiation,
    Notification,
};
use super::result::ResultRecord;
use super::stream::{decorate_stream, ResultStream};
use super::task::{TaskLookup, TaskRecord, TaskRegistry, TaskRequest};

/// Agent 运行状态
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgentStatus {
    pub agent_id: String,
    pub initialized: bool,
    pub capabilities: Vec<String>,
    pub active_tasks: usize,
    pub total_tasks: usize,
}

/// Agent 宿主
///
/// Wraps a concrete [`Agent`] with identity, one-time initialization, the
/// caller-facing streaming protocol and a private task registry.
pub struct AgentHost {
    agent: Arc<dyn Agent>,
    agent_id: String,
    config: AgentConfig,
    init: OnceCell<()>,
    tasks: TaskRegistry,
}

impl AgentHost {
    pub fn new(agent: Arc<dyn Agent>, config: AgentConfig) -> Self {
        let agent_id = config
            .agent_id
            .clone()
            .unwrap_or_else(|| agent.name().to_string());
        Self {
            tasks: TaskRegistry::new(agent_id.clone()),
            agent,
            agent_id,
            config,
            init: OnceCell::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    /// Runs resource setup once. A failed setup leaves the agent
    /// uninitialized so the next call retries.
    pub async fn initialize(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| async {
                info!(agent = %self.agent_id, "initializing agent");
                self.agent.setup_resources().await.map_err(|e| {
                    error!(agent = %self.agent_id, error = %e, "agent initialization failed");
                    AgentStudioError::Initialization {
                        agent_id: self.agent_id.clone(),
                        reason: e.to_string(),
                    }
                })?;
                info!(agent = %self.agent_id, "agent initialized");
                Ok::<(), AgentStudioError>(())
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// Streams the records for one query. Only an initialization failure is
    /// returned as an error; everything after that arrives as records.
    pub async fn stream(
        &self,
        query: &str,
        session_id: Option<String>,
        context: Option<Map<String, Value>>,
    ) -> Result<ResultStream<'_>> {
        self.initialize().await?;
        let session_id = session_id.unwrap_or_else(new_session_id);
        let request = MessageRequest::new(query, session_id.clone())
            .with_context(context.unwrap_or_default());
        Ok(decorate_stream(
            self.agent_id.clone(),
            session_id,
            self.agent.process_message(request),
        ))
    }

    /// Single-shot variant of [`stream`](Self::stream): the last record.
    pub async fn execute(
        &self,
        query: &str,
        session_id: Option<String>,
    ) -> Result<Option<ResultRecord>> {
        let mut records = self.stream(query, session_id, None).await?;
        let mut last = None;
        while let Some(record) = records.next().await {
            last = Some(record);
        }
        Ok(last)
    }

    pub fn create_task(&self, request: TaskRequest) -> Result<TaskRecord> {
        self.tasks.create(request)
    }

    pub fn get_task_status(&self, task_id: &str) -> TaskLookup {
        self.tasks.lookup(task_id)
    }

    pub fn cancel_task(&self, task_id: &str) -> TaskLookup {
        self.tasks.cancel(task_id)
    }

    /// Runs a task through the message pipeline. Records are tagged with the
    /// task identity; the stream stops early once the task is cancelled.
    pub fn process_task(&self, request: TaskRequest) -> ResultStream<'_> {
        Box::pin(stream! {
            let requested_id = request.task_id.clone().unwrap_or_default();
            let record = match self.tasks.begin(request) {
                Ok(record) => record,
                Err(error) => {
                    warn!(agent = %self.agent_id, task_id = %requested_id, error = %error, "task rejected");
                    yield ResultRecord::agent_error(error.to_string())
                        .stamp(&self.agent_id, &requested_id);
                    return;
                }
            };
            let task_id = record.task_id.clone();
            let task_type = record.task_type.clone();
            let source = record.source_agent().to_string();
            info!(agent = %self.agent_id, task_id = %task_id, task_type = %task_type, "processing task");

            if let Err(error) = self.initialize().await {
                self.record_failure(&task_id, &error);
                yield ResultRecord::agent_error(error.to_string())
                    .stamp(&self.agent_id, &task_id)
                    .tag_task(&task_id, &task_type, &source);
                return;
            }

            let mut inner = self.agent.process_message(self.agent.task_request(&record));
            let mut last = None;
            while let Some(item) = inner.next().await {
                if self.tasks.is_cancelled(&task_id) {
                    info!(agent = %self.agent_id, task_id = %task_id, "task cancelled, stopping");
                    return;
                }
                match item {
                    Ok(result) => {
                        let result = result
                            .stamp(&self.agent_id, &task_id)
                            .tag_task(&task_id, &task_type, &source);
                        last = Some(result.clone());
                        yield result;
                    }
                    Err(error) => {
                        self.record_failure(&task_id, &error);
                        yield ResultRecord::agent_error(error.to_string())
                            .stamp(&self.agent_id, &task_id)
                            .tag_task(&task_id, &task_type, &source);
                        return;
                    }
                }
            }

            if let Err(error) = self.tasks.complete(&task_id, last) {
                warn!(task_id = %task_id, error = %error, "task completion ignored");
            }
        })
    }

    fn record_failure(&self, task_id: &str, error: &AgentStudioError) {
        error!(agent = %self.agent_id, task_id = %task_id, error = %error, "task failed");
        if let Err(e) = self.tasks.fail(task_id, error.to_string()) {
            warn!(task_id = %task_id, error = %e, "task failure ignored");
        }
    }

    pub fn negotiate_capabilities(&self, client: &ClientCapabilities) -> Negotiation {
        let profile = self.agent.profile();
        Negotiation {
            agreed_modalities: intersect_modalities(
                &profile.supported_modalities,
                &client.modalities,
            ),
            agent_capabilities: profile.capabilities,
            workflow_available: self.agent.card_flags().workflow_enabled,
            protocol_version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Discovery document. Safe to call before initialization.
    pub fn agent_card(&self) -> AgentCard {
        AgentCard::new(&self.agent_id, self.agent.profile(), self.agent.card_flags())
    }

    pub fn status(&self) -> AgentStatus {
        AgentStatus {
            agent_id: self.agent_id.clone(),
            initialized: self.is_initialized(),
            capabilities: self.agent.profile().capabilities,
            active_tasks: self.tasks.active_count(),
            total_tasks: self.tasks.len(),
        }
    }

    pub async fn handle_notification(&self, notification: Notification) -> Result<()> {
        self.agent
            .handle_notification(&self.agent_id, notification)
            .await
    }

    pub async fn handle_artifact(&self, artifact: Artifact) -> Result<ArtifactReceipt> {
        self.agent.handle_artifact(&self.agent_id, artifact).await
    }
}

fn new_session_id() -> String {
    format!("session_{}", Uuid::new_v4())
}

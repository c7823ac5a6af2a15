use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{AgentStudioError, Result};

use super::result::ResultRecord;

/// 任务状态
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Created,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (Self::Created, Self::Running) => true,
            (Self::Created | Self::Running, Self::Cancelled) => true,
            (Self::Running, Self::Completed | Self::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_task_type() -> String {
    "general".to_string()
}

/// 任务提交请求
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default = "default_task_type")]
    pub task_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent_id: Option<String>,
}

impl TaskRequest {
    pub fn new<T: Into<String>>(task_type: T) -> Self {
        Self {
            task_type: task_type.into(),
            ..Self::default()
        }
    }

    pub fn with_id<T: Into<String>>(mut self, task_id: T) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_source<T: Into<String>>(mut self, source_agent_id: T) -> Self {
        self.source_agent_id = Some(source_agent_id.into());
        self
    }
}

/// 任务记录
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub task_id: String,
    pub status: TaskStatus,
    pub task_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    fn new(task_id: String, request: TaskRequest) -> Self {
        Self {
            task_id,
            status: TaskStatus::Created,
            task_type: request.task_type,
            parameters: request.parameters,
            source_agent_id: request.source_agent_id,
            result: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    /// Moves the record forward, stamping the matching timestamp. Terminal
    /// statuses never change again.
    pub fn transition(&mut self, next: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AgentStudioError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let now = Utc::now();
        match next {
            TaskStatus::Running => self.started_at = Some(now),
            TaskStatus::Completed | TaskStatus::Failed => self.completed_at = Some(now),
            TaskStatus::Cancelled => self.cancelled_at = Some(now),
            TaskStatus::Created => {}
        }
        self.status = next;
        Ok(())
    }

    pub fn source_agent(&self) -> &str {
        self.source_agent_id.as_deref().unwrap_or("unknown")
    }
}

/// Answer to a status query. Unknown ids produce the `not_found` sentinel
/// instead of an error.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TaskLookup {
    Found(TaskRecord),
    NotFound { task_id: String, status: String },
}

impl TaskLookup {
    pub fn not_found<T: Into<String>>(task_id: T) -> Self {
        Self::NotFound {
            task_id: task_id.into(),
            status: "not_found".to_string(),
        }
    }

    pub fn status_label(&self) -> &str {
        match self {
            Self::Found(record) => record.status.as_str(),
            Self::NotFound { status, .. } => status,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn record(&self) -> Option<&TaskRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound { .. } => None,
        }
    }
}

/// 每个 Agent 私有的任务表
pub struct TaskRegistry {
    owner: String,
    tasks: RwLock<HashMap<String, TaskRecord>>,
    sequence: AtomicU64,
}

impl TaskRegistry {
    pub fn new<T: Into<String>>(owner: T) -> Self {
        Self {
            owner: owner.into(),
            tasks: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "task_{}_{}_{seq}",
            self.owner,
            Utc::now().timestamp_micros()
        )
    }

    pub fn create(&self, mut request: TaskRequest) -> Result<TaskRecord> {
        let task_id = match request.task_id.take() {
            Some(task_id) => task_id,
            None => self.next_id(),
        };
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&task_id) {
            return Err(AgentStudioError::TaskExists(task_id));
        }
        let record = TaskRecord::new(task_id.clone(), request);
        tasks.insert(task_id.clone(), record.clone());
        info!(agent = %self.owner, task_id = %task_id, task_type = %record.task_type, "task created");
        Ok(record)
    }

    /// Marks a task as running, creating it first when the id is unknown.
    pub fn begin(&self, mut request: TaskRequest) -> Result<TaskRecord> {
        let task_id = match request.task_id.take() {
            Some(task_id) => task_id,
            None => self.next_id(),
        };
        let mut tasks = self.tasks.write();
        let record = tasks
            .entry(task_id.clone())
            .or_insert_with(|| TaskRecord::new(task_id.clone(), request));
        if record.status != TaskStatus::Created {
            return Err(AgentStudioError::TaskNotRunnable {
                task_id,
                status: record.status,
            });
        }
        record.transition(TaskStatus::Running)?;
        debug!(agent = %self.owner, task_id = %record.task_id, "task running");
        Ok(record.clone())
    }

    pub fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.read().get(task_id).cloned()
    }

    pub fn lookup(&self, task_id: &str) -> TaskLookup {
        match self.get(task_id) {
            Some(record) => TaskLookup::Found(record),
            None => TaskLookup::not_found(task_id),
        }
    }

    /// Cancels a pending or running task. A repeated cancel re-stamps
    /// `cancelled_at`; completed and failed tasks are left as they are.
    pub fn cancel(&self, task_id: &str) -> TaskLookup {
        let mut tasks = self.tasks.write();
        let Some(record) = tasks.get_mut(task_id) else {
            return TaskLookup::not_found(task_id);
        };
        match record.status {
            TaskStatus::Cancelled => record.cancelled_at = Some(Utc::now()),
            TaskStatus::Completed | TaskStatus::Failed => {
                debug!(task_id = %task_id, status = %record.status, "task already finished");
            }
            TaskStatus::Created | TaskStatus::Running => {
                if let Err(error) = record.transition(TaskStatus::Cancelled) {
                    warn!(task_id = %task_id, error = %error, "cancel rejected");
                }
                info!(agent = %self.owner, task_id = %task_id, "task cancelled");
            }
        }
        TaskLookup::Found(record.clone())
    }

    pub fn complete(&self, task_id: &str, result: Option<ResultRecord>) -> Result<()> {
        self.finish(task_id, TaskStatus::Completed, |record| record.result = result)
    }

    pub fn fail(&self, task_id: &str, error_message: impl Into<String>) -> Result<()> {
        let error_message = error_message.into();
        self.finish(task_id, TaskStatus::Failed, |record| {
            record.error_message = Some(error_message)
        })
    }

    fn finish(
        &self,
        task_id: &str,
        status: TaskStatus,
        apply: impl FnOnce(&mut TaskRecord),
    ) -> Result<()> {
        let mut tasks = self.tasks.write();
        let record = tasks
            .get_mut(task_id)
            .ok_or_else(|| AgentStudioError::execution(format!("task `{task_id}` not found")))?;
        record.transition(status)?;
        apply(record);
        info!(agent = %self.owner, task_id = %task_id, status = %status, "task finished");
        Ok(())
    }

    pub fn is_cancelled(&self, task_id: &str) -> bool {
        self.tasks
            .read()
            .get(task_id)
            .map(|record| record.status == TaskStatus::Cancelled)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Tasks that have not reached a terminal status.
    pub fn active_count(&self) -> usize {
        self.tasks
            .read()
            .values()
            .filter(|record| !record.status.is_terminal())
            .count()
    }
}

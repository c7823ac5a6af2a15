use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROTOCOL_VERSION: &str = "1.0";

/// 执行轨迹条目
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TraceEntry {
    pub step: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl TraceEntry {
    pub fn new(step: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            step: step.into(),
            timestamp: Utc::now(),
            details,
        }
    }
}

/// 执行错误条目
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorEntry {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// 工作流元数据
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkflowMetadata {
    pub workflow_id: String,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// 性能指标
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionMetrics {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checkpoint: Option<DateTime<Utc>>,
}

/// 单次运行的执行状态
///
/// 轨迹与错误列表只允许追加。`values` 承载具体工作流自定义的字段，
/// 序列化时与标准字段平铺在同一层。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionState {
    pub query: String,
    pub session_id: String,
    pub workflow_metadata: WorkflowMetadata,
    execution_trace: Vec<TraceEntry>,
    errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub debug_info: Map<String, Value>,
    #[serde(default)]
    pub mcp_context: Map<String, Value>,
    #[serde(default)]
    pub mcp_resources: Vec<String>,
    pub protocol_version: String,
    #[serde(default)]
    pub agent_capabilities: Vec<String>,
    pub execution_metrics: ExecutionMetrics,
    /// Always serialized, `null` until a node sets it, so every emitted
    /// state is projected as a state.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl ExecutionState {
    /// Fresh state seeded with a single `initialization` trace entry.
    pub fn new(
        query: impl Into<String>,
        session_id: impl Into<String>,
        metadata: WorkflowMetadata,
        started_at: DateTime<Utc>,
    ) -> Self {
        let query = query.into();
        let mut details = Map::new();
        details.insert("query_length".into(), Value::from(query.chars().count()));
        Self {
            query,
            session_id: session_id.into(),
            workflow_metadata: metadata,
            execution_trace: vec![TraceEntry::new("initialization", details)],
            errors: Vec::new(),
            debug_info: Map::new(),
            mcp_context: Map::new(),
            mcp_resources: Vec::new(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            agent_capabilities: vec!["streaming".into(), "tracing".into(), "mcp".into()],
            execution_metrics: ExecutionMetrics {
                start_time: started_at,
                current_duration: None,
                last_checkpoint: None,
            },
            content: None,
            values: Map::new(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.workflow_metadata.trace_id
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.workflow_metadata.context
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.execution_trace
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn record_step(&mut self, step: impl Into<String>, details: Map<String, Value>) {
        self.execution_trace.push(TraceEntry::new(step, details));
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(ErrorEntry {
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    /// Keys of the serialized state, standard and custom alike.
    pub fn key_inventory(&self) -> Vec<String> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> ExecutionState {
        let now = Utc::now();
        ExecutionState::new(
            "hello",
            "s-1",
            WorkflowMetadata {
                workflow_id: "wf".into(),
                trace_id: "wf_s-1_0".into(),
                created_at: now,
                context: Map::new(),
            },
            now,
        )
    }

    #[test]
    fn new_state_is_seeded_with_initialization_step() {
        let state = sample_state();
        assert_eq!(state.trace().len(), 1);
        assert_eq!(state.trace()[0].step, "initialization");
        assert_eq!(state.trace()[0].details["query_length"], json!(5));
        assert!(state.errors().is_empty());
        assert!(state.execution_metrics.current_duration.is_none());
    }

    #[test]
    fn custom_values_are_flattened_when_serialized() {
        let mut state = sample_state();
        state.set_value("text_input", "hello");
        state.set_content("done");

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["text_input"], json!("hello"));
        assert_eq!(value["content"], json!("done"));

        let restored: ExecutionState = serde_json::from_value(value).unwrap();
        assert_eq!(restored.value("text_input"), Some(&json!("hello")));
        assert_eq!(restored.trace().len(), 1);
    }

    #[test]
    fn unset_content_is_serialized_as_null() {
        let value = serde_json::to_value(sample_state()).unwrap();
        let map = value.as_object().unwrap();
        assert!(map.contains_key("content"));
        assert_eq!(map["content"], Value::Null);

        let restored: ExecutionState = serde_json::from_value(value).unwrap();
        assert!(restored.content.is_none());
    }

    #[test]
    fn key_inventory_lists_standard_and_custom_keys() {
        let mut state = sample_state();
        state.set_value("extra", 1);
        let keys = state.key_inventory();
        assert!(keys.contains(&"query".to_string()));
        assert!(keys.contains(&"execution_trace".to_string()));
        assert!(keys.contains(&"extra".to_string()));
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::agent::{ExecutionMode, ResultRecord, ResultStream};
use crate::config::WorkflowConfig;
use crate::error::Result;

use super::engine::{CompiledGraph, ExecutionStrategy, GraphEngine};
use super::graph::WorkflowGraph;
use super::nodes::{attach_standard_nodes, StandardNodeOptions};
use super::state::{ExecutionState, TraceEntry, WorkflowMetadata};

/// 工作流定义
///
/// A workflow supplies an optional graph for the engine and the direct,
/// single-call path used whenever no graph can run.
#[async_trait]
pub trait Workflow: Send + Sync {
    fn workflow_id(&self) -> &str;

    /// Graph definition handed to the engine's `build` step.
    fn build_graph(&self) -> Option<WorkflowGraph> {
        None
    }

    async fn process_query(
        &self,
        query: &str,
        session_id: &str,
        context: &Map<String, Value>,
    ) -> Result<ResultRecord>;
}

#[derive(Clone)]
enum RunnerMode {
    Uninitialized,
    Graph(Arc<dyn CompiledGraph>),
    Fallback,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunnerPhase {
    Uninitialized,
    ReadyGraph,
    ReadyFallback,
}

/// 运行器状态快照
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunnerStatus {
    pub workflow_id: String,
    pub phase: RunnerPhase,
    pub graph_available: bool,
    pub debug_mode: bool,
    pub execution_count: usize,
    pub mcp_enabled: bool,
}

/// 工作流运行器
///
/// Compiles the workflow graph once (double-checked under `init_lock`) and
/// turns every query into a stream of normalized result records. A run that
/// fails inside the graph degrades to the direct path for that run only.
pub struct WorkflowRunner {
    workflow: Arc<dyn Workflow>,
    strategy: ExecutionStrategy,
    config: WorkflowConfig,
    mode: RwLock<RunnerMode>,
    init_lock: tokio::sync::Mutex<()>,
    execution_count: AtomicUsize,
}

impl WorkflowRunner {
    pub fn new(
        workflow: Arc<dyn Workflow>,
        strategy: ExecutionStrategy,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            workflow,
            strategy,
            config,
            mode: RwLock::new(RunnerMode::Uninitialized),
            init_lock: tokio::sync::Mutex::new(()),
            execution_count: AtomicUsize::new(0),
        }
    }

    pub fn workflow_id(&self) -> &str {
        self.workflow.workflow_id()
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn phase(&self) -> RunnerPhase {
        match &*self.mode.read() {
            RunnerMode::Uninitialized => RunnerPhase::Uninitialized,
            RunnerMode::Graph(_) => RunnerPhase::ReadyGraph,
            RunnerMode::Fallback => RunnerPhase::ReadyFallback,
        }
    }

    /// Whether the strategy can ever produce a graph.
    pub fn graph_capable(&self) -> bool {
        matches!(self.strategy, ExecutionStrategy::Graph(_))
    }

    /// Builds and compiles the graph on first use. Engine failures are never
    /// fatal: the runner settles in fallback mode instead.
    pub async fn ensure_initialized(&self) {
        if self.phase() != RunnerPhase::Uninitialized {
            return;
        }
        let _guard = self.init_lock.lock().await;
        if self.phase() != RunnerPhase::Uninitialized {
            return;
        }

        let workflow_id = self.workflow_id();
        if self.config.mcp.enabled {
            info!(
                workflow = %workflow_id,
                server_url = ?self.config.mcp.server_url,
                tools = ?self.config.mcp.tools,
                "tool integration enabled"
            );
        }

        let mode = match &self.strategy {
            ExecutionStrategy::Direct => {
                info!(workflow = %workflow_id, "direct strategy selected, using fallback path");
                RunnerMode::Fallback
            }
            ExecutionStrategy::Graph(engine) => match self.compile_graph(engine.as_ref()).await {
                Ok(Some(compiled)) => {
                    info!(workflow = %workflow_id, engine = engine.name(), "workflow graph compiled");
                    RunnerMode::Graph(compiled)
                }
                Ok(None) => {
                    warn!(
                        workflow = %workflow_id,
                        engine = engine.name(),
                        "graph engine unavailable, using fallback path"
                    );
                    RunnerMode::Fallback
                }
                Err(error) => {
                    warn!(
                        workflow = %workflow_id,
                        engine = engine.name(),
                        error = %error,
                        "graph build failed, using fallback path"
                    );
                    RunnerMode::Fallback
                }
            },
        };
        *self.mode.write() = mode;
    }

    async fn compile_graph(
        &self,
        engine: &dyn GraphEngine,
    ) -> Result<Option<Arc<dyn CompiledGraph>>> {
        let definition = self.workflow.build_graph();
        let Some(mut graph) = engine.build(definition).await? else {
            return Ok(None);
        };
        attach_standard_nodes(
            &mut graph,
            StandardNodeOptions {
                debug_mode: self.config.debug_mode,
                mcp_enabled: self.config.mcp.enabled,
            },
        );
        let compiled = engine.compile(graph).await?;
        Ok(Some(compiled))
    }

    fn compiled(&self) -> Option<Arc<dyn CompiledGraph>> {
        match &*self.mode.read() {
            RunnerMode::Graph(compiled) => Some(Arc::clone(compiled)),
            _ => None,
        }
    }

    /// Runs one query. The stream never fails: every error surfaces as a
    /// record with `success == false`.
    pub fn stream<'a>(
        &'a self,
        query: &'a str,
        session_id: &'a str,
        context: Map<String, Value>,
    ) -> ResultStream<'a> {
        Box::pin(stream! {
            self.ensure_initialized().await;
            self.execution_count.fetch_add(1, Ordering::Relaxed);

            let workflow_id = self.workflow_id();
            let started_at = Utc::now();
            let trace_id = trace_id(workflow_id, session_id, started_at);
            let mut state = self.initial_state(query, session_id, &context, started_at, &trace_id);

            let failure = match self.compiled() {
                None => None,
                Some(compiled) => match compiled.execute_streaming(state.clone()) {
                    Some(mut states) => {
                        let mut failure = None;
                        while let Some(step) = states.next().await {
                            match step {
                                Ok(value) => {
                                    yield self.format_result(value).with_workflow(workflow_id, &trace_id);
                                }
                                Err(error) => {
                                    failure = Some(error);
                                    break;
                                }
                            }
                        }
                        match failure {
                            Some(error) => Some(error),
                            None => return,
                        }
                    }
                    None => match compiled.execute_once(state.clone()).await {
                        Ok(value) => {
                            yield self.format_result(value).with_workflow(workflow_id, &trace_id);
                            return;
                        }
                        Err(error) => Some(error),
                    },
                },
            };

            if let Some(error) = failure {
                warn!(
                    workflow = %workflow_id,
                    trace_id = %trace_id,
                    error = %error,
                    "graph execution failed, falling back for this run"
                );
                state.record_error(error.to_string());
                let mut details = Map::new();
                details.insert("error".into(), Value::String(error.to_string()));
                state.record_step("graph_fallback", details);
            }

            yield self
                .run_fallback(&state, &context)
                .await
                .with_workflow(workflow_id, &trace_id);
        })
    }

    fn initial_state(
        &self,
        query: &str,
        session_id: &str,
        context: &Map<String, Value>,
        started_at: DateTime<Utc>,
        trace_id: &str,
    ) -> ExecutionState {
        let metadata = WorkflowMetadata {
            workflow_id: self.workflow_id().to_string(),
            trace_id: trace_id.to_string(),
            created_at: started_at,
            context: context.clone(),
        };
        let mut state = ExecutionState::new(query, session_id, metadata, started_at);
        if self.config.debug_mode {
            state.debug_info.insert("debug_enabled".into(), Value::Bool(true));
            state
                .debug_info
                .insert("workflow_config".into(), self.config_snapshot());
        }
        if self.config.mcp.enabled {
            state.mcp_context = self.config.mcp.context();
            state.mcp_resources = self.config.mcp.tools.clone();
        }
        state
    }

    async fn run_fallback(&self, state: &ExecutionState, context: &Map<String, Value>) -> ResultRecord {
        debug!(workflow = %self.workflow_id(), "running fallback path");
        match self
            .workflow
            .process_query(&state.query, &state.session_id, context)
            .await
        {
            Ok(mut record) => {
                record.execution_mode = Some(ExecutionMode::Fallback);
                let mut trace = state.trace().to_vec();
                trace.append(&mut record.execution_trace);
                record.execution_trace = trace;
                record
            }
            Err(error) => self.error_result(&error.to_string(), &state.session_id),
        }
    }

    /// Projects a graph output into a result record.
    fn format_result(&self, value: Value) -> ResultRecord {
        let mut map = match value {
            Value::Object(map) if map.contains_key("content") => map,
            Value::String(text) => return simple_result(text),
            other => return simple_result(other.to_string()),
        };

        let content = match map.remove("content") {
            Some(Value::String(text)) => text,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let metadata = match map.remove("workflow_metadata") {
            Some(Value::Object(metadata)) => metadata,
            _ => Map::new(),
        };
        let execution_trace: Vec<TraceEntry> = match map.remove("execution_trace") {
            Some(trace) => serde_json::from_value(trace).unwrap_or_else(|error| {
                warn!(workflow = %self.workflow_id(), error = %error, "dropping malformed execution trace");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let performance_metrics = match map.remove("execution_metrics") {
            Some(Value::Object(metrics)) => metrics,
            _ => Map::new(),
        };
        let debug_info = if self.config.debug_mode {
            match map.remove("debug_info") {
                Some(Value::Object(info)) => Some(info),
                _ => None,
            }
        } else {
            None
        };

        ResultRecord {
            success: true,
            content,
            metadata,
            execution_trace,
            performance_metrics,
            debug_info,
            execution_mode: Some(ExecutionMode::Graph),
            ..ResultRecord::default()
        }
    }

    fn error_result(&self, message: &str, session_id: &str) -> ResultRecord {
        let mut record = ResultRecord::failure("Workflow Error", message)
            .with_metadata("workflow_id", self.workflow_id())
            .with_metadata("session_id", session_id)
            .with_metadata("timestamp", Utc::now().to_rfc3339())
            .with_metadata("error_type", "workflow_execution_error");

        let mut details = Map::new();
        details.insert("error".into(), Value::String(message.to_string()));
        record
            .execution_trace
            .push(TraceEntry::new("error_handling", details));

        if self.config.debug_mode {
            let mut info = Map::new();
            info.insert("error_details".into(), Value::String(message.to_string()));
            info.insert("workflow_state".into(), Value::String("error".into()));
            info.insert("config".into(), self.config_snapshot());
            record.debug_info = Some(info);
        }
        record
    }

    fn config_snapshot(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    pub fn status(&self) -> RunnerStatus {
        let phase = self.phase();
        RunnerStatus {
            workflow_id: self.workflow_id().to_string(),
            phase,
            graph_available: phase == RunnerPhase::ReadyGraph,
            debug_mode: self.config.debug_mode,
            execution_count: self.execution_count.load(Ordering::Relaxed),
            mcp_enabled: self.config.mcp.enabled,
        }
    }

    /// Drops the compiled graph; the next run builds it again.
    pub async fn reset(&self) {
        let _guard = self.init_lock.lock().await;
        *self.mode.write() = RunnerMode::Uninitialized;
        info!(workflow = %self.workflow_id(), "workflow runner reset");
    }
}

fn trace_id(workflow_id: &str, session_id: &str, started_at: DateTime<Utc>) -> String {
    format!(
        "{workflow_id}_{session_id}_{}.{:06}",
        started_at.timestamp(),
        started_at.timestamp_subsec_micros()
    )
}

fn simple_result(content: String) -> ResultRecord {
    let mut record = ResultRecord::success(content).with_metadata("execution_mode", json!("simple"));
    record.execution_mode = Some(ExecutionMode::Simple);
    record
}

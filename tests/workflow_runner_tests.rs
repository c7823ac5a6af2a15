use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use futures::StreamExt;
use serde_json::{Map, Value};
use tokio::time::{sleep, Duration};

use agentstudio::{
    node_fn, AgentConfig, AgentFactoryRegistry, AgentStudioError, CompiledGraph, ExecutionMode,
    ExecutionState, ExecutionStrategy, GraphBuilder, GraphEngine, McpConfig, ResultRecord,
    RunnerPhase, SequentialEngine, UnavailableEngine, Workflow, WorkflowConfig, WorkflowGraph,
    WorkflowRunner,
};

async fn respond(mut state: ExecutionState) -> agentstudio::Result<ExecutionState> {
    if state.query.contains("explode") {
        return Err(AgentStudioError::execution("node exploded"));
    }
    let content = format!("graph: {}", state.query);
    state.set_content(content);
    Ok(state)
}

async fn prepare(mut state: ExecutionState) -> agentstudio::Result<ExecutionState> {
    state.set_value("prepared", true);
    Ok(state)
}

struct ScriptedWorkflow {
    fallback_calls: Arc<AtomicUsize>,
    staged: bool,
}

impl ScriptedWorkflow {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                fallback_calls: calls.clone(),
                staged: false,
            },
            calls,
        )
    }

    /// Runs a `prepare` node that sets no content before `respond`.
    fn staged() -> (Self, Arc<AtomicUsize>) {
        let (mut workflow, calls) = Self::new();
        workflow.staged = true;
        (workflow, calls)
    }
}

#[async_trait]
impl Workflow for ScriptedWorkflow {
    fn workflow_id(&self) -> &str {
        "scripted"
    }

    fn build_graph(&self) -> Option<WorkflowGraph> {
        let mut builder = GraphBuilder::new("scripted");
        builder.add_node("respond", node_fn(respond)).set_finish("respond");
        if self.staged {
            builder
                .add_node("prepare", node_fn(prepare))
                .connect("prepare", "respond")
                .set_entry("prepare");
        } else {
            builder.set_entry("respond");
        }
        Some(builder.build())
    }

    async fn process_query(
        &self,
        query: &str,
        _session_id: &str,
        _context: &Map<String, Value>,
    ) -> agentstudio::Result<ResultRecord> {
        self.fallback_calls.fetch_add(1, Ordering::SeqCst);
        if query.contains("fatal") {
            return Err(AgentStudioError::execution("fallback broke"));
        }
        Ok(ResultRecord::success(format!("fallback: {query}")))
    }
}

/// Sequential engine that counts (slow) build calls.
struct CountingEngine {
    inner: SequentialEngine,
    builds: Arc<AtomicUsize>,
}

#[async_trait]
impl GraphEngine for CountingEngine {
    fn name(&self) -> &str {
        "counting"
    }

    async fn build(
        &self,
        definition: Option<WorkflowGraph>,
    ) -> agentstudio::Result<Option<WorkflowGraph>> {
        sleep(Duration::from_millis(10)).await;
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.build(definition).await
    }

    async fn compile(&self, graph: WorkflowGraph) -> agentstudio::Result<Arc<dyn CompiledGraph>> {
        self.inner.compile(graph).await
    }
}

fn runner_with(strategy: ExecutionStrategy, config: WorkflowConfig) -> (WorkflowRunner, Arc<AtomicUsize>) {
    let (workflow, calls) = ScriptedWorkflow::new();
    (WorkflowRunner::new(Arc::new(workflow), strategy, config), calls)
}

fn staged_runner() -> (WorkflowRunner, Arc<AtomicUsize>) {
    let (workflow, calls) = ScriptedWorkflow::staged();
    let runner = WorkflowRunner::new(
        Arc::new(workflow),
        ExecutionStrategy::graph(SequentialEngine::new()),
        WorkflowConfig::default(),
    );
    (runner, calls)
}

fn counting_runner() -> (WorkflowRunner, Arc<AtomicUsize>) {
    let builds = Arc::new(AtomicUsize::new(0));
    let engine = CountingEngine {
        inner: SequentialEngine::new(),
        builds: builds.clone(),
    };
    let (runner, _) = runner_with(ExecutionStrategy::graph(engine), WorkflowConfig::default());
    (runner, builds)
}

fn steps(record: &ResultRecord) -> Vec<&str> {
    record
        .execution_trace
        .iter()
        .map(|entry| entry.step.as_str())
        .collect()
}

#[tokio::test]
async fn streaming_graph_yields_one_record_per_step() -> anyhow::Result<()> {
    let (runner, fallback_calls) = runner_with(
        ExecutionStrategy::graph(SequentialEngine::new()),
        WorkflowConfig::default(),
    );
    assert_eq!(runner.phase(), RunnerPhase::Uninitialized);

    let records: Vec<_> = runner.stream("hello", "s1", Map::new()).collect().await;

    // respond, error_handler, performance_tracker
    assert_eq!(records.len(), 3);
    for record in &records {
        assert!(record.success);
        assert_eq!(record.content, "graph: hello");
        assert_eq!(record.execution_mode, Some(ExecutionMode::Graph));
        assert_eq!(record.workflow_id.as_deref(), Some("scripted"));
        assert!(record
            .trace_id
            .as_deref()
            .is_some_and(|id| id.starts_with("scripted_s1_")));
        assert_eq!(steps(record).first(), Some(&"initialization"));
        assert!(record.debug_info.is_none());
    }
    assert!(records[2].performance_metrics.contains_key("current_duration"));
    assert_eq!(runner.phase(), RunnerPhase::ReadyGraph);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn single_shot_engine_yields_the_final_state_only() -> anyhow::Result<()> {
    let (runner, _) = runner_with(
        ExecutionStrategy::graph(SequentialEngine::new().single_shot()),
        WorkflowConfig::default(),
    );
    let records: Vec<_> = runner.stream("hi", "s", Map::new()).collect().await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "graph: hi");
    assert_eq!(records[0].execution_mode, Some(ExecutionMode::Graph));
    Ok(())
}

#[tokio::test]
async fn missing_engine_settles_in_fallback_mode() -> anyhow::Result<()> {
    for strategy in [
        ExecutionStrategy::graph(UnavailableEngine),
        ExecutionStrategy::Direct,
    ] {
        let (runner, fallback_calls) = runner_with(strategy, WorkflowConfig::default());
        let records: Vec<_> = runner.stream("hi", "s", Map::new()).collect().await;

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(record.success);
        assert_eq!(record.content, "fallback: hi");
        assert_eq!(record.execution_mode, Some(ExecutionMode::Fallback));
        assert_eq!(steps(record), ["initialization"]);
        assert_eq!(record.workflow_id.as_deref(), Some("scripted"));
        assert_eq!(runner.phase(), RunnerPhase::ReadyFallback);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }
    Ok(())
}

#[tokio::test]
async fn concurrent_first_runs_build_the_graph_once() -> anyhow::Result<()> {
    let (runner, builds) = counting_runner();
    let runs = (0..4).map(|_| runner.stream("q", "s", Map::new()).collect::<Vec<_>>());
    let results = join_all(runs).await;

    assert!(results.iter().all(|records| records.len() == 3));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(runner.status().execution_count, 4);
    Ok(())
}

#[tokio::test]
async fn graph_failure_falls_back_for_that_run_only() -> anyhow::Result<()> {
    let (runner, fallback_calls) = runner_with(
        ExecutionStrategy::graph(SequentialEngine::new()),
        WorkflowConfig::default(),
    );

    let records: Vec<_> = runner.stream("please explode", "s", Map::new()).collect().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.success);
    assert_eq!(record.content, "fallback: please explode");
    assert_eq!(record.execution_mode, Some(ExecutionMode::Fallback));
    assert_eq!(steps(record), ["initialization", "graph_fallback"]);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);

    assert_eq!(runner.phase(), RunnerPhase::ReadyGraph);
    let next: Vec<_> = runner.stream("calm", "s", Map::new()).collect().await;
    assert_eq!(next.len(), 3);
    assert_eq!(next[0].execution_mode, Some(ExecutionMode::Graph));
    Ok(())
}

#[tokio::test]
async fn states_without_content_are_still_projected() -> anyhow::Result<()> {
    let (runner, _) = staged_runner();
    let mut context = Map::new();
    context.insert("user_secret".into(), Value::from("tok-123"));
    let records: Vec<_> = runner.stream("hello", "s", context).collect().await;

    // prepare, respond, error_handler, performance_tracker
    assert_eq!(records.len(), 4);
    let first = &records[0];
    assert!(first.success);
    assert_eq!(first.content, "");
    assert_eq!(first.execution_mode, Some(ExecutionMode::Graph));
    assert_eq!(steps(first), ["initialization"]);
    assert!(first.performance_metrics.contains_key("start_time"));
    assert_eq!(first.metadata["workflow_id"], Value::from("scripted"));
    for record in &records[1..] {
        assert_eq!(record.content, "graph: hello");
        assert_eq!(record.execution_mode, Some(ExecutionMode::Graph));
    }
    assert!(records.iter().all(|r| !r.content.contains("tok-123")));
    Ok(())
}

#[tokio::test]
async fn partial_graph_output_precedes_the_fallback_record() -> anyhow::Result<()> {
    let (runner, fallback_calls) = staged_runner();
    let records: Vec<_> = runner.stream("explode", "s", Map::new()).collect().await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].execution_mode, Some(ExecutionMode::Graph));
    assert_eq!(records[0].content, "");

    let fallback = &records[1];
    assert!(fallback.success);
    assert_eq!(fallback.execution_mode, Some(ExecutionMode::Fallback));
    assert_eq!(fallback.content, "fallback: explode");
    assert_eq!(steps(fallback), ["initialization", "graph_fallback"]);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.phase(), RunnerPhase::ReadyGraph);
    Ok(())
}

#[tokio::test]
async fn fallback_errors_become_workflow_error_records() -> anyhow::Result<()> {
    let (runner, _) = runner_with(ExecutionStrategy::Direct, WorkflowConfig::default());
    let records: Vec<_> = runner.stream("fatal", "s-9", Map::new()).collect().await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(!record.success);
    assert!(record.content.starts_with("❌ Workflow Error"));
    assert!(record.error.as_deref().is_some_and(|e| e.contains("fallback broke")));
    assert_eq!(record.metadata["error_type"], Value::from("workflow_execution_error"));
    assert_eq!(record.metadata["session_id"], Value::from("s-9"));
    assert_eq!(steps(record), ["error_handling"]);
    assert!(record.debug_info.is_none());
    Ok(())
}

#[tokio::test]
async fn debug_mode_adds_a_checkpoint_and_debug_info() -> anyhow::Result<()> {
    let (runner, _) = runner_with(
        ExecutionStrategy::graph(SequentialEngine::new()),
        WorkflowConfig {
            debug_mode: true,
            ..WorkflowConfig::default()
        },
    );
    let records: Vec<_> = runner.stream("hello", "s", Map::new()).collect().await;

    assert_eq!(records.len(), 4);
    for record in &records {
        let info = record
            .debug_info
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("debug info missing"))?;
        assert_eq!(info["debug_enabled"], Value::Bool(true));
        assert!(info.contains_key("workflow_config"));
    }
    let last = records[3]
        .debug_info
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("debug info missing"))?;
    assert_eq!(last["current_step"], Value::from("debug_checkpoint"));
    assert!(last["state_keys"].as_array().is_some_and(|keys| !keys.is_empty()));
    Ok(())
}

#[tokio::test]
async fn tool_integration_records_a_processing_step() -> anyhow::Result<()> {
    let (runner, _) = runner_with(
        ExecutionStrategy::graph(SequentialEngine::new()),
        WorkflowConfig {
            debug_mode: false,
            mcp: McpConfig {
                enabled: true,
                server_url: Some("http://localhost:3000".into()),
                tools: vec!["search".into()],
            },
        },
    );
    let records: Vec<_> = runner.stream("hello", "s", Map::new()).collect().await;

    assert_eq!(records.len(), 4);
    let last = &records[3];
    assert_eq!(steps(last).last(), Some(&"mcp_processing"));
    assert!(runner.status().mcp_enabled);
    Ok(())
}

#[tokio::test]
async fn reset_forces_a_rebuild() -> anyhow::Result<()> {
    let (runner, builds) = counting_runner();
    let _: Vec<_> = runner.stream("one", "s", Map::new()).collect().await;
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(runner.status().graph_available);

    runner.reset().await;
    assert_eq!(runner.phase(), RunnerPhase::Uninitialized);
    assert!(!runner.status().graph_available);

    let records: Vec<_> = runner.stream("two", "s", Map::new()).collect().await;
    assert_eq!(records.len(), 3);
    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert_eq!(runner.status().execution_count, 2);
    Ok(())
}

#[tokio::test]
async fn text_analyzer_runs_its_full_graph() -> anyhow::Result<()> {
    let registry = AgentFactoryRegistry::with_builtin();
    let host = registry.build_host("text_analyzer", AgentConfig::default())?;
    assert_eq!(host.agent_id(), "text_analyzer");

    let records: Vec<_> = host
        .stream("I really love this product!", None, None)
        .await?
        .collect()
        .await;

    assert!(records.len() > 1);
    assert!(records.iter().all(|r| r.success));
    let last = records
        .last()
        .ok_or_else(|| anyhow::anyhow!("no records"))?;
    assert!(last.content.contains("Text Analysis Complete"));
    assert_eq!(last.execution_mode, Some(ExecutionMode::Graph));
    assert_eq!(last.workflow_id.as_deref(), Some("text_analysis"));
    assert_eq!(last.agent_id.as_deref(), Some("text_analyzer"));
    Ok(())
}

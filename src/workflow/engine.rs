use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::{AgentStudioError, Result};

use super::graph::WorkflowGraph;
use super::state::ExecutionState;

/// States emitted by a streaming graph run, one per executed step.
pub type StateStream = BoxStream<'static, Result<Value>>;

/// The narrow build/compile contract of a pluggable graph engine.
#[async_trait]
pub trait GraphEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `None` when the engine cannot host a graph at all. That case is
    /// treated exactly like a build failure by the runner.
    async fn build(&self, definition: Option<WorkflowGraph>) -> Result<Option<WorkflowGraph>> {
        Ok(definition)
    }

    async fn compile(&self, graph: WorkflowGraph) -> Result<Arc<dyn CompiledGraph>>;
}

/// An executable graph produced by [`GraphEngine::compile`].
#[async_trait]
pub trait CompiledGraph: Send + Sync {
    /// Streaming execution, if the engine exposes one.
    fn execute_streaming(&self, _state: ExecutionState) -> Option<StateStream> {
        None
    }

    async fn execute_once(&self, state: ExecutionState) -> Result<Value>;
}

/// Stand-in for an engine that is not installed.
#[derive(Default, Clone)]
pub struct UnavailableEngine;

#[async_trait]
impl GraphEngine for UnavailableEngine {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn build(&self, _definition: Option<WorkflowGraph>) -> Result<Option<WorkflowGraph>> {
        Ok(None)
    }

    async fn compile(&self, _graph: WorkflowGraph) -> Result<Arc<dyn CompiledGraph>> {
        Err(AgentStudioError::Engine {
            engine: self.name().to_string(),
            reason: "graph engine is not available".to_string(),
        })
    }
}

/// Processing strategy, chosen once when the runner is constructed.
#[derive(Clone)]
pub enum ExecutionStrategy {
    Graph(Arc<dyn GraphEngine>),
    Direct,
}

impl ExecutionStrategy {
    pub fn graph<E: GraphEngine + 'static>(engine: E) -> Self {
        Self::Graph(Arc::new(engine))
    }
}

use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{AgentStudioError, Result};

use super::engine::{CompiledGraph, GraphEngine, StateStream};
use super::graph::WorkflowGraph;
use super::state::ExecutionState;

const DEFAULT_MAX_STEPS: u32 = 256;

/// In-process engine that walks a graph from its entry point along the first
/// outgoing edge of every node until the finish point (or a node without
/// successors) is reached.
#[derive(Clone)]
pub struct SequentialEngine {
    max_steps: u32,
    streaming: bool,
}

impl Default for SequentialEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialEngine {
    pub fn new() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            streaming: true,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Compiled graphs only offer single-shot execution.
    pub fn single_shot(mut self) -> Self {
        self.streaming = false;
        self
    }
}

#[async_trait]
impl GraphEngine for SequentialEngine {
    fn name(&self) -> &str {
        "sequential"
    }

    async fn compile(&self, graph: WorkflowGraph) -> Result<Arc<dyn CompiledGraph>> {
        graph.validate()?;
        debug!(graph = graph.name(), nodes = graph.node_names().len(), "compiled sequential graph");
        Ok(Arc::new(SequentialGraph {
            graph: Arc::new(graph),
            max_steps: self.max_steps,
            streaming: self.streaming,
        }))
    }
}

pub struct SequentialGraph {
    graph: Arc<WorkflowGraph>,
    max_steps: u32,
    streaming: bool,
}

impl SequentialGraph {
    fn run(&self, state: ExecutionState) -> StateStream {
        let graph = Arc::clone(&self.graph);
        let max_steps = self.max_steps;
        Box::pin(stream! {
            let mut current = graph.entry().map(str::to_string);
            let mut state = state;
            let mut steps = 0u32;
            while let Some(name) = current.take() {
                if steps >= max_steps {
                    yield Err(AgentStudioError::MaxStepsExceeded(max_steps));
                    return;
                }
                steps += 1;
                let Some(node) = graph.node(&name) else {
                    yield Err(AgentStudioError::UnknownNode(name));
                    return;
                };
                debug!(graph = graph.name(), node = %name, "executing node");
                state = match (node.transform)(state).await {
                    Ok(next) => next,
                    Err(error) => {
                        yield Err(error);
                        return;
                    }
                };
                yield serde_json::to_value(&state).map_err(AgentStudioError::from);

                if graph.finish() != Some(name.as_str()) {
                    current = graph.successors(&name).first().cloned();
                }
            }
        })
    }
}

#[async_trait]
impl CompiledGraph for SequentialGraph {
    fn execute_streaming(&self, state: ExecutionState) -> Option<StateStream> {
        self.streaming.then(|| self.run(state))
    }

    async fn execute_once(&self, state: ExecutionState) -> Result<Value> {
        use futures::StreamExt;

        let mut stream = self.run(state);
        let mut last = None;
        while let Some(step) = stream.next().await {
            last = Some(step?);
        }
        last.ok_or_else(|| AgentStudioError::execution("graph produced no state"))
    }
}

pub mod engine;
pub mod graph;
pub mod nodes;
pub mod runner;
pub mod sequential;
pub mod state;

pub use engine::{CompiledGraph, ExecutionStrategy, GraphEngine, StateStream, UnavailableEngine};
pub use graph::{node_fn, pure_node, GraphBuilder, GraphNode, NodeFn, WorkflowGraph};
pub use nodes::{attach_standard_nodes, StandardNodeOptions};
pub use runner::{RunnerPhase, RunnerStatus, Workflow, WorkflowRunner};
pub use sequential::SequentialEngine;
pub use state::{
    ErrorEntry, ExecutionMetrics, ExecutionState, TraceEntry, WorkflowMetadata, PROTOCOL_VERSION,
};

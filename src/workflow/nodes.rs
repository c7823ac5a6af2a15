use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::graph::{pure_node, WorkflowGraph};
use super::state::ExecutionState;

pub const ERROR_HANDLER_NODE: &str = "error_handler";
pub const PERFORMANCE_TRACKER_NODE: &str = "performance_tracker";
pub const DEBUG_LOGGER_NODE: &str = "debug_logger";
pub const MCP_PROCESSOR_NODE: &str = "mcp_processor";

/// Number of most recent errors copied into the trace.
const ERROR_WINDOW: usize = 3;

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardNodeOptions {
    pub debug_mode: bool,
    pub mcp_enabled: bool,
}

/// Chains the standard nodes after the graph's finish point. The debug and
/// MCP nodes are only attached when their feature is switched on.
pub fn attach_standard_nodes(graph: &mut WorkflowGraph, options: StandardNodeOptions) {
    graph.chain_after_finish(ERROR_HANDLER_NODE, pure_node(error_handler));
    graph.chain_after_finish(PERFORMANCE_TRACKER_NODE, pure_node(performance_tracker));
    if options.debug_mode {
        graph.chain_after_finish(DEBUG_LOGGER_NODE, pure_node(debug_logger));
    }
    if options.mcp_enabled {
        graph.chain_after_finish(MCP_PROCESSOR_NODE, pure_node(mcp_processor));
    }
}

pub fn error_handler(mut state: ExecutionState) -> ExecutionState {
    let error_count = state.errors().len();
    if error_count == 0 {
        return state;
    }
    warn!(
        workflow = %state.workflow_metadata.workflow_id,
        error_count,
        "workflow errors detected"
    );
    let recent = &state.errors()[error_count.saturating_sub(ERROR_WINDOW)..];
    let mut details = Map::new();
    details.insert("error_count".into(), Value::from(error_count));
    details.insert("errors".into(), json!(recent));
    state.record_step("error_handling", details);
    state
}

pub fn performance_tracker(mut state: ExecutionState) -> ExecutionState {
    let now = Utc::now();
    let metrics = &mut state.execution_metrics;
    let elapsed = now - metrics.start_time;
    metrics.current_duration = Some(elapsed.num_microseconds().unwrap_or(i64::MAX) as f64 / 1e6);
    metrics.last_checkpoint = Some(now);
    state
}

pub fn debug_logger(mut state: ExecutionState) -> ExecutionState {
    let snapshot = json!({
        "current_step": "debug_checkpoint",
        "timestamp": Utc::now(),
        "state_keys": state.key_inventory(),
        "trace_length": state.trace().len(),
        "error_count": state.errors().len(),
    });
    debug!(
        workflow = %state.workflow_metadata.workflow_id,
        snapshot = %snapshot,
        "debug checkpoint"
    );
    if let Value::Object(entries) = snapshot {
        state.debug_info.extend(entries);
    }
    state
}

pub fn mcp_processor(mut state: ExecutionState) -> ExecutionState {
    if state.mcp_context.is_empty() {
        return state;
    }
    let operations: Vec<String> = state.mcp_context.keys().cloned().collect();
    debug!(operations = ?operations, "processing tool context");
    let mut details = Map::new();
    details.insert("mcp_operations".into(), json!(operations));
    state.record_step("mcp_processing", details);
    state
}

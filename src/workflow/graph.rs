use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{AgentStudioError, Result};

use super::state::ExecutionState;

/// A graph step: takes the execution state and hands back the transformed state.
pub type NodeFn = Arc<dyn Fn(ExecutionState) -> BoxFuture<'static, Result<ExecutionState>> + Send + Sync>;

pub fn node_fn<F, Fut>(transform: F) -> NodeFn
where
    F: Fn(ExecutionState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ExecutionState>> + Send + 'static,
{
    Arc::new(move |state| transform(state).boxed())
}

/// Wraps an infallible, synchronous transform.
pub fn pure_node<F>(transform: F) -> NodeFn
where
    F: Fn(ExecutionState) -> ExecutionState + Send + Sync + 'static,
{
    Arc::new(move |state| {
        let next = transform(state);
        futures::future::ready(Ok(next)).boxed()
    })
}

#[derive(Clone)]
pub struct GraphNode {
    pub name: String,
    pub transform: NodeFn,
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode").field("name", &self.name).finish()
    }
}

/// The graph handle handed to an engine for compilation.
#[derive(Clone, Debug)]
pub struct WorkflowGraph {
    name: String,
    entry: Option<String>,
    finish: Option<String>,
    nodes: HashMap<String, GraphNode>,
    order: Vec<String>,
    edges: HashMap<String, Vec<String>>,
}

impl WorkflowGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    pub fn finish(&self) -> Option<&str> {
        self.finish.as_deref()
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Node names in insertion order.
    pub fn node_names(&self) -> &[String] {
        &self.order
    }

    pub fn successors(&self, name: &str) -> &[String] {
        self.edges.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Appends `name` after the current finish point (or the last inserted
    /// node) and makes it the new finish point.
    pub fn chain_after_finish(&mut self, name: &str, transform: NodeFn) {
        let tail = self.finish.clone().or_else(|| self.order.last().cloned());
        self.insert(name, transform);
        match tail {
            Some(tail) => {
                self.edges.entry(tail).or_default().push(name.to_string());
            }
            None => self.entry = Some(name.to_string()),
        }
        self.finish = Some(name.to_string());
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| AgentStudioError::InvalidGraph {
            graph: self.name.clone(),
            reason,
        };
        let entry = self
            .entry
            .as_ref()
            .ok_or_else(|| invalid("no entry point".to_string()))?;
        if !self.contains(entry) {
            return Err(invalid(format!("entry point `{entry}` is not a node")));
        }
        if let Some(finish) = &self.finish {
            if !self.contains(finish) {
                return Err(invalid(format!("finish point `{finish}` is not a node")));
            }
        }
        for (from, targets) in &self.edges {
            if !self.contains(from) {
                return Err(AgentStudioError::UnknownNode(from.clone()));
            }
            if let Some(to) = targets.iter().find(|to| !self.contains(to)) {
                return Err(AgentStudioError::UnknownNode(to.clone()));
            }
        }
        Ok(())
    }

    fn insert(&mut self, name: &str, transform: NodeFn) {
        if !self.nodes.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.nodes.insert(
            name.to_string(),
            GraphNode {
                name: name.to_string(),
                transform,
            },
        );
    }
}

/// 工作流图构建器
pub struct GraphBuilder {
    graph: WorkflowGraph,
}

impl GraphBuilder {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            graph: WorkflowGraph {
                name: name.into(),
                entry: None,
                finish: None,
                nodes: HashMap::new(),
                order: Vec::new(),
                edges: HashMap::new(),
            },
        }
    }

    pub fn add_node(&mut self, name: &str, transform: NodeFn) -> &mut Self {
        self.graph.insert(name, transform);
        self
    }

    pub fn connect(&mut self, from: &str, to: &str) -> &mut Self {
        self.graph
            .edges
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        self
    }

    pub fn set_entry(&mut self, name: &str) -> &mut Self {
        self.graph.entry = Some(name.to_string());
        self
    }

    pub fn set_finish(&mut self, name: &str) -> &mut Self {
        self.graph.finish = Some(name.to_string());
        self
    }

    pub fn build(&mut self) -> WorkflowGraph {
        self.graph.clone()
    }
}

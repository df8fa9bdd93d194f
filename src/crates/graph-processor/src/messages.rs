//! Message payloads exchanged between the graph processor, its node
//! processors, and its parent.

use graph_model::{NodeEvalError, NodeId, NodeValue};

/// Sent to self to re-run the viability scan; also the very first message
/// a `GraphProcessor` sends itself on start.
#[derive(Debug)]
pub struct SubmitViableNodes;

/// A `NodeProcessor` reporting its node's successful result back to the
/// `GraphProcessor` that spawned it.
#[derive(Debug)]
pub struct NodeSucceeded {
    pub node_id: NodeId,
    pub result: NodeValue,
}

/// A `NodeProcessor` reporting its node's evaluation failure.
#[derive(Debug)]
pub struct NodeFailed {
    pub node_id: NodeId,
    pub error: NodeEvalError,
}

/// Triggers a spawned `NodeProcessor` to invoke its function.
#[derive(Debug)]
pub struct EvaluateNode;

/// Sent by a `GraphProcessor` to its parent once the job's root node has
/// succeeded and no node remains pending, active, or failed.
#[derive(Debug)]
pub struct JobSucceeded {
    pub result: Option<NodeValue>,
}

/// Sent by a `GraphProcessor` to its parent once the terminal rule
/// determines the job cannot succeed (some node failed, or the graph
/// deadlocked).
#[derive(Debug)]
pub struct JobFailed {
    pub reason: String,
}

//! The execution-time view of a graph: per-node records plus the four
//! partitions the processor moves node ids through.

use crate::function::{NodeEvalError, NodeFunction, NodeValue};
use crate::id::NodeId;
use crate::node::{DependencyType, Node};
use std::collections::{HashMap, HashSet};

/// Per-node execution record.
///
/// `function` is filled in by the resolver once, before execution starts;
/// exactly one of `result`/`error` is set once the node leaves `active`.
pub struct GraphContextNode {
    pub node: Node,
    pub dependencies: HashMap<NodeId, DependencyType>,
    pub function: Option<Box<dyn NodeFunction>>,
    pub result: Option<NodeValue>,
    pub error: Option<NodeEvalError>,
}

impl GraphContextNode {
    pub fn new(node: Node) -> Self {
        let dependencies = node.dependencies.clone();
        GraphContextNode {
            node,
            dependencies,
            function: None,
            result: None,
            error: None,
        }
    }

    /// A read-only copy omitting the resolved function: a node's own
    /// function is only ever invoked once, so the dependency snapshot
    /// handed to it never needs to call back into another node's.
    pub fn snapshot(&self) -> GraphContextNode {
        GraphContextNode {
            node: self.node.clone(),
            dependencies: self.dependencies.clone(),
            function: None,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// The full execution snapshot of a job's graph.
///
/// Invariant: `pending`, `active`, `succeeded`, and `failed` are pairwise
/// disjoint and their union is exactly `nodes.keys()`.
pub struct GraphContext {
    pub nodes: HashMap<NodeId, GraphContextNode>,
    pub pending: HashSet<NodeId>,
    pub active: HashSet<NodeId>,
    pub succeeded: HashSet<NodeId>,
    pub failed: HashSet<NodeId>,
}

impl GraphContext {
    /// Build a fresh context with every node starting out `pending`.
    pub fn new(nodes: HashMap<NodeId, GraphContextNode>) -> Self {
        let pending = nodes.keys().cloned().collect();
        GraphContext {
            nodes,
            pending,
            active: HashSet::new(),
            succeeded: HashSet::new(),
            failed: HashSet::new(),
        }
    }

    /// Check the partition invariant. Exposed for tests and for defensive
    /// assertions at processor checkpoints.
    pub fn partitions_are_valid(&self) -> bool {
        let total = self.pending.len() + self.active.len() + self.succeeded.len() + self.failed.len();
        if total != self.nodes.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(total);
        for id in self
            .pending
            .iter()
            .chain(self.active.iter())
            .chain(self.succeeded.iter())
            .chain(self.failed.iter())
        {
            if !seen.insert(id) {
                return false;
            }
            if !self.nodes.contains_key(id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn noop_node() -> GraphContextNode {
        GraphContextNode::new(Node::with_no_dependencies(NodeKind::Noop))
    }

    #[test]
    fn fresh_context_has_all_nodes_pending() {
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::root("a"), noop_node());
        nodes.insert(NodeId::root("b"), noop_node());
        let ctx = GraphContext::new(nodes);
        assert_eq!(ctx.pending.len(), 2);
        assert!(ctx.active.is_empty());
        assert!(ctx.partitions_are_valid());
    }

    #[test]
    fn moving_a_node_between_partitions_keeps_invariant() {
        let mut nodes = HashMap::new();
        let id = NodeId::root("a");
        nodes.insert(id.clone(), noop_node());
        let mut ctx = GraphContext::new(nodes);

        ctx.pending.remove(&id);
        ctx.active.insert(id.clone());
        assert!(ctx.partitions_are_valid());

        ctx.active.remove(&id);
        ctx.succeeded.insert(id);
        assert!(ctx.partitions_are_valid());
    }
}

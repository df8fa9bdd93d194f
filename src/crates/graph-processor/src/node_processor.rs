//! A short-lived actor that evaluates exactly one node.

use crate::messages::{EvaluateNode, NodeFailed, NodeSucceeded};
use actor_runtime::{downcast_payload, Actor, ActorContext, MessageSlot, Payload, Result};
use graph_model::{GraphContextNode, NodeFunction, NodeId};
use std::collections::HashMap;

/// Evaluates `node_id`'s function against the dependency snapshot it was
/// spawned with, then reports the outcome to its parent and stops.
///
/// The snapshot is exactly the graph as it stood when the `GraphProcessor`
/// dispatched this node: it must already contain the result of every
/// declared dependency.
pub struct NodeProcessor {
    node_id: NodeId,
    function: Box<dyn NodeFunction>,
    snapshot: HashMap<NodeId, GraphContextNode>,
}

impl NodeProcessor {
    pub fn new(
        node_id: NodeId,
        function: Box<dyn NodeFunction>,
        snapshot: HashMap<NodeId, GraphContextNode>,
    ) -> Self {
        NodeProcessor {
            node_id,
            function,
            snapshot,
        }
    }
}

impl Actor for NodeProcessor {
    fn class_name(&self) -> &'static str {
        "nodeprocessor"
    }

    fn message_table(&self) -> Vec<MessageSlot> {
        vec![MessageSlot::of::<EvaluateNode>("evaluate_node")]
    }

    fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        ctx.send(ctx.id.clone(), "evaluate_node", EvaluateNode);
        Ok(())
    }

    fn handle(&mut self, ctx: &mut ActorContext, name: &str, payload: Payload) -> Result<()> {
        debug_assert_eq!(name, "evaluate_node");
        let _ = downcast_payload::<EvaluateNode>(payload);

        match self.function.call(&self.snapshot) {
            Ok(result) => ctx.send_parent(
                "node_succeeded",
                NodeSucceeded {
                    node_id: self.node_id.clone(),
                    result,
                },
            ),
            Err(error) => ctx.send_parent(
                "node_failed",
                NodeFailed {
                    node_id: self.node_id.clone(),
                    error,
                },
            ),
        }

        ctx.stop(None);
        Ok(())
    }
}

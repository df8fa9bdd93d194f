//! Drives a single job's [`GraphContext`] to completion.

use crate::error::ProcessorError;
use crate::messages::{JobFailed, JobSucceeded, NodeFailed, NodeSucceeded, SubmitViableNodes};
use crate::node_processor::NodeProcessor;
use actor_runtime::{downcast_payload, Actor, ActorContext, MessageSlot, Payload, Result};
use graph_model::{DependencyType, GraphContext, GraphContextNode, NodeId};
use std::collections::HashMap;

/// Evaluates a job's graph to a terminal `job_succeeded`/`job_failed`
/// outcome, reported to whichever actor spawned it.
///
/// Owns its `GraphContext` exclusively: the context is written only by
/// its owning processor, and `NodeProcessor`s it spawns only ever read
/// the snapshot they were handed.
pub struct GraphProcessor {
    context: GraphContext,
    root_id: NodeId,
}

impl GraphProcessor {
    pub fn new(context: GraphContext, root_id: NodeId) -> std::result::Result<Self, ProcessorError> {
        if !context.nodes.contains_key(&root_id) {
            return Err(ProcessorError::MissingRoot(root_id));
        }
        Ok(GraphProcessor { context, root_id })
    }

    /// A dependency is satisfied once its node has a usable outcome: it
    /// succeeded outright, or it failed but the edge tolerates that.
    fn dependency_satisfied(&self, dep_id: &NodeId, dep_type: &DependencyType) -> bool {
        self.context.succeeded.contains(dep_id)
            || (dep_type.tolerant && self.context.failed.contains(dep_id))
    }

    fn is_poisoned(&self, dependencies: &HashMap<NodeId, DependencyType>) -> bool {
        dependencies
            .iter()
            .any(|(dep_id, dep_type)| !dep_type.tolerant && self.context.failed.contains(dep_id))
    }

    fn is_viable(&self, dependencies: &HashMap<NodeId, DependencyType>) -> bool {
        !self.is_poisoned(dependencies)
            && dependencies
                .iter()
                .all(|(dep_id, dep_type)| self.dependency_satisfied(dep_id, dep_type))
    }

    /// Poison to a fixed point, then dispatch every node that became
    /// viable, then check the terminal rule.
    fn submit_viable_nodes(&mut self, ctx: &mut ActorContext) {
        loop {
            let newly_failed: Vec<NodeId> = self
                .context
                .pending
                .iter()
                .filter(|id| self.is_poisoned(&self.context.nodes[*id].dependencies))
                .cloned()
                .collect();
            if newly_failed.is_empty() {
                break;
            }
            for id in newly_failed {
                tracing::warn!(node = %id, "upstream failure");
                self.context.pending.remove(&id);
                self.context.failed.insert(id);
            }
        }

        let viable: Vec<NodeId> = self
            .context
            .pending
            .iter()
            .filter(|id| self.is_viable(&self.context.nodes[*id].dependencies))
            .cloned()
            .collect();

        for id in viable {
            self.dispatch_node(ctx, id);
        }

        self.apply_terminal_rule(ctx);
    }

    fn dispatch_node(&mut self, ctx: &mut ActorContext, id: NodeId) {
        let function = self.context.nodes.get_mut(&id).and_then(|n| n.function.take());
        let function = match function {
            Some(f) => f,
            None => {
                tracing::error!(node = %id, "node dispatched with no resolved function");
                self.context.pending.remove(&id);
                self.context.failed.insert(id);
                return;
            }
        };

        let snapshot: HashMap<NodeId, GraphContextNode> =
            self.context.nodes.iter().map(|(k, v)| (k.clone(), v.snapshot())).collect();

        self.context.pending.remove(&id);
        self.context.active.insert(id.clone());
        tracing::debug!(node = %id, "dispatching");
        ctx.spawn(NodeProcessor::new(id, function, snapshot));
    }

    fn node_succeeded(&mut self, ctx: &mut ActorContext, node_id: NodeId, result: graph_model::NodeValue) {
        self.context.active.remove(&node_id);
        if let Some(node) = self.context.nodes.get_mut(&node_id) {
            node.result = Some(result);
        }
        tracing::debug!(node = %node_id, "succeeded");
        self.context.succeeded.insert(node_id);
        self.submit_viable_nodes(ctx);
    }

    fn node_failed(&mut self, ctx: &mut ActorContext, node_id: NodeId, error: graph_model::NodeEvalError) {
        self.context.active.remove(&node_id);
        tracing::warn!(node = %node_id, %error, "failed");
        if let Some(node) = self.context.nodes.get_mut(&node_id) {
            node.error = Some(error);
        }
        self.context.failed.insert(node_id);
        self.submit_viable_nodes(ctx);
    }

    fn apply_terminal_rule(&mut self, ctx: &mut ActorContext) {
        if !self.context.active.is_empty() {
            return;
        }
        if !self.context.pending.is_empty() {
            let reason = format!(
                "deadlock: {} node(s) never became viable (cyclic or missing dependency)",
                self.context.pending.len()
            );
            tracing::error!(%reason, "graph processor terminal");
            ctx.send_parent("job_failed", JobFailed { reason });
            return;
        }
        if !self.context.failed.is_empty() {
            let reason = format!("{} node(s) failed", self.context.failed.len());
            ctx.send_parent("job_failed", JobFailed { reason });
            return;
        }
        let result = self.context.nodes.get(&self.root_id).and_then(|n| n.result.clone());
        ctx.send_parent("job_succeeded", JobSucceeded { result });
    }
}

impl Actor for GraphProcessor {
    fn class_name(&self) -> &'static str {
        "graphprocessor"
    }

    fn message_table(&self) -> Vec<MessageSlot> {
        vec![
            MessageSlot::of::<SubmitViableNodes>("submit_viable_nodes"),
            MessageSlot::of::<NodeSucceeded>("node_succeeded"),
            MessageSlot::of::<NodeFailed>("node_failed"),
        ]
    }

    fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        ctx.send(ctx.id.clone(), "submit_viable_nodes", SubmitViableNodes);
        Ok(())
    }

    fn handle(&mut self, ctx: &mut ActorContext, name: &str, payload: Payload) -> Result<()> {
        match name {
            "submit_viable_nodes" => {
                let _ = downcast_payload::<SubmitViableNodes>(payload);
                self.submit_viable_nodes(ctx);
            }
            "node_succeeded" => {
                if let Some(msg) = downcast_payload::<NodeSucceeded>(payload) {
                    self.node_succeeded(ctx, msg.node_id, msg.result);
                }
            }
            "node_failed" => {
                if let Some(msg) = downcast_payload::<NodeFailed>(payload) {
                    self.node_failed(ctx, msg.node_id, msg.error);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_runtime::ActorSystem;
    use graph_model::{Node, NodeFunction, NodeKind};
    use std::sync::{Arc, Mutex};

    enum Outcome {
        Succeeded(Option<graph_model::NodeValue>),
        Failed(String),
    }

    struct JobHarness {
        context: Option<GraphContext>,
        root_id: NodeId,
        outcome: Arc<Mutex<Option<Outcome>>>,
    }

    impl Actor for JobHarness {
        fn class_name(&self) -> &'static str {
            "jobharness"
        }

        fn message_table(&self) -> Vec<MessageSlot> {
            vec![
                MessageSlot::of::<JobSucceeded>("job_succeeded"),
                MessageSlot::of::<JobFailed>("job_failed"),
            ]
        }

        fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
            let context = self.context.take().expect("context only consumed once");
            let processor = GraphProcessor::new(context, self.root_id.clone()).expect("valid root id");
            ctx.spawn(processor);
            Ok(())
        }

        fn handle(&mut self, ctx: &mut ActorContext, name: &str, payload: Payload) -> Result<()> {
            match name {
                "job_succeeded" => {
                    if let Some(msg) = downcast_payload::<JobSucceeded>(payload) {
                        *self.outcome.lock().unwrap() = Some(Outcome::Succeeded(msg.result));
                    }
                }
                "job_failed" => {
                    if let Some(msg) = downcast_payload::<JobFailed>(payload) {
                        *self.outcome.lock().unwrap() = Some(Outcome::Failed(msg.reason));
                    }
                }
                _ => {}
            }
            ctx.stop(None);
            Ok(())
        }
    }

    fn run_job(context: GraphContext, root_id: NodeId) -> Outcome {
        let outcome = Arc::new(Mutex::new(None));
        let mut system = ActorSystem::new();
        system.start(JobHarness {
            context: Some(context),
            root_id,
            outcome: outcome.clone(),
        });
        system.wait_for_shutdown();
        Arc::try_unwrap(outcome)
            .ok()
            .expect("harness actor dropped with the system")
            .into_inner()
            .unwrap()
            .expect("job reported a terminal outcome")
    }

    struct ConstFunc(graph_model::NodeValue);
    impl NodeFunction for ConstFunc {
        fn call(&self, _ctx: graph_model::NodeContext) -> std::result::Result<graph_model::NodeValue, graph_model::NodeEvalError> {
            Ok(self.0.clone())
        }
    }

    struct PassThroughFunc(NodeId);
    impl NodeFunction for PassThroughFunc {
        fn call(&self, ctx: graph_model::NodeContext) -> std::result::Result<graph_model::NodeValue, graph_model::NodeEvalError> {
            ctx.get(&self.0)
                .and_then(|n| n.result.clone())
                .ok_or_else(|| graph_model::NodeEvalError::MissingInput(self.0.clone()))
        }
    }

    struct FailFunc(String);
    impl NodeFunction for FailFunc {
        fn call(&self, _ctx: graph_model::NodeContext) -> std::result::Result<graph_model::NodeValue, graph_model::NodeEvalError> {
            Err(graph_model::NodeEvalError::ModelFailed(self.0.clone()))
        }
    }

    /// A function that records whether it was ever invoked, so a test can
    /// assert a poisoned node's function never runs.
    struct TrackedFunc {
        invoked: Arc<Mutex<bool>>,
        value: graph_model::NodeValue,
    }
    impl NodeFunction for TrackedFunc {
        fn call(&self, _ctx: graph_model::NodeContext) -> std::result::Result<graph_model::NodeValue, graph_model::NodeEvalError> {
            *self.invoked.lock().unwrap() = true;
            Ok(self.value.clone())
        }
    }

    fn node_with(f: impl NodeFunction + 'static, deps: HashMap<NodeId, DependencyType>) -> GraphContextNode {
        let mut n = GraphContextNode::new(Node::new(NodeKind::Noop, deps));
        n.function = Some(Box::new(f));
        n
    }

    #[test]
    fn linear_success() {
        let a = NodeId::root("a");
        let b = NodeId::root("b");
        let c = NodeId::root("c");

        let mut nodes = HashMap::new();
        nodes.insert(a.clone(), node_with(ConstFunc(graph_model::NodeValue::Bool(true)), HashMap::new()));
        nodes.insert(
            b.clone(),
            node_with(PassThroughFunc(a.clone()), HashMap::from([(a.clone(), DependencyType::required())])),
        );
        nodes.insert(
            c.clone(),
            node_with(PassThroughFunc(b.clone()), HashMap::from([(b.clone(), DependencyType::required())])),
        );

        let context = GraphContext::new(nodes);
        let outcome = run_job(context, c);
        match outcome {
            Outcome::Succeeded(Some(graph_model::NodeValue::Bool(true))) => {}
            _ => panic!("expected the job to succeed with c's passed-through value"),
        }
    }

    #[test]
    fn fan_out_fan_in() {
        let a = NodeId::root("a");
        let b = NodeId::root("b");
        let c = NodeId::root("c");
        let d = NodeId::root("d");

        let both_present = Arc::new(Mutex::new(false));
        let both_present_for_d = both_present.clone();
        let b_for_d = b.clone();
        let c_for_d = c.clone();

        struct FanInFunc {
            b: NodeId,
            c: NodeId,
            both_present: Arc<Mutex<bool>>,
        }
        impl NodeFunction for FanInFunc {
            fn call(&self, ctx: graph_model::NodeContext) -> std::result::Result<graph_model::NodeValue, graph_model::NodeEvalError> {
                let seen = ctx.get(&self.b).and_then(|n| n.result.as_ref()).is_some()
                    && ctx.get(&self.c).and_then(|n| n.result.as_ref()).is_some();
                *self.both_present.lock().unwrap() = seen;
                Ok(graph_model::NodeValue::Bool(true))
            }
        }

        let mut nodes = HashMap::new();
        nodes.insert(a.clone(), node_with(ConstFunc(graph_model::NodeValue::Bool(true)), HashMap::new()));
        nodes.insert(
            b.clone(),
            node_with(PassThroughFunc(a.clone()), HashMap::from([(a.clone(), DependencyType::required())])),
        );
        nodes.insert(
            c.clone(),
            node_with(
                ConstFunc(graph_model::NodeValue::Item(graph_model::DataItem {
                    schema: graph_model::TableDefinition { fields: vec![] },
                    rows: vec![],
                })),
                HashMap::from([(a.clone(), DependencyType::required())]),
            ),
        );
        nodes.insert(
            d.clone(),
            node_with(
                FanInFunc {
                    b: b_for_d,
                    c: c_for_d,
                    both_present: both_present_for_d,
                },
                HashMap::from([(b.clone(), DependencyType::required()), (c.clone(), DependencyType::required())]),
            ),
        );

        let context = GraphContext::new(nodes);
        let outcome = run_job(context, d);
        assert!(matches!(outcome, Outcome::Succeeded(_)));
        assert!(*both_present.lock().unwrap(), "D must see both B's and C's results");
    }

    #[test]
    fn intolerant_upstream_failure() {
        let a = NodeId::root("a");
        let b = NodeId::root("b");
        let c = NodeId::root("c");
        let c_invoked = Arc::new(Mutex::new(false));

        let mut nodes = HashMap::new();
        nodes.insert(a.clone(), node_with(ConstFunc(graph_model::NodeValue::Bool(true)), HashMap::new()));
        nodes.insert(
            b.clone(),
            node_with(FailFunc("boom".to_string()), HashMap::from([(a.clone(), DependencyType::required())])),
        );
        nodes.insert(
            c.clone(),
            node_with(
                TrackedFunc {
                    invoked: c_invoked.clone(),
                    value: graph_model::NodeValue::Bool(true),
                },
                HashMap::from([(b.clone(), DependencyType::required())]),
            ),
        );

        let context = GraphContext::new(nodes);
        let outcome = run_job(context, c);
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert!(!*c_invoked.lock().unwrap(), "c is poisoned by b's intolerant failure and must never run");
    }

    #[test]
    fn tolerant_upstream_failure() {
        let a = NodeId::root("a");
        let b = NodeId::root("b");
        let c = NodeId::root("c");
        let c_invoked = Arc::new(Mutex::new(false));

        let mut nodes = HashMap::new();
        nodes.insert(a.clone(), node_with(ConstFunc(graph_model::NodeValue::Bool(true)), HashMap::new()));
        nodes.insert(
            b.clone(),
            node_with(FailFunc("boom".to_string()), HashMap::from([(a.clone(), DependencyType::required())])),
        );
        nodes.insert(
            c.clone(),
            node_with(
                TrackedFunc {
                    invoked: c_invoked.clone(),
                    value: graph_model::NodeValue::Bool(true),
                },
                HashMap::from([(b.clone(), DependencyType::tolerant())]),
            ),
        );

        let context = GraphContext::new(nodes);
        let outcome = run_job(context, c);
        assert!(*c_invoked.lock().unwrap(), "c tolerates b's failure and must still run");
        assert!(matches!(outcome, Outcome::Failed(_)), "the job as a whole still fails since b is in `failed`");
    }

    #[test]
    fn deadlock_on_missing_dependency() {
        let x = NodeId::root("x");
        let ghost = NodeId::root("ghost");

        let mut nodes = HashMap::new();
        nodes.insert(
            x.clone(),
            node_with(
                ConstFunc(graph_model::NodeValue::Bool(true)),
                HashMap::from([(ghost, DependencyType::required())]),
            ),
        );

        let context = GraphContext::new(nodes);
        let outcome = run_job(context, x);
        match outcome {
            Outcome::Failed(reason) => assert!(reason.contains("deadlock")),
            Outcome::Succeeded(_) => panic!("a dependency on a nonexistent node can never be satisfied"),
        }
    }
}

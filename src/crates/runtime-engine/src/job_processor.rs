//! Owns one job end to end: build its graph, resolve every node to a
//! callable, hand it to a [`GraphProcessor`] child, and relay the
//! terminal outcome to the engine, tagged with this job's id.

use crate::error::EngineError;
use crate::messages::{JobFailed, JobSucceeded};
use actor_runtime::{downcast_payload, Actor, ActorContext, MessageSlot, Payload, Result};
use graph_builder::{FunctionResolver, GraphBuilder};
use graph_model::{GraphContext, GraphContextNode, JobConfig};
use graph_processor::GraphProcessor;
use std::sync::Arc;

#[derive(Debug)]
struct BuildGraph;

pub struct JobProcessor {
    job_id: String,
    job_config: Arc<JobConfig>,
    resolver: Arc<FunctionResolver>,
}

impl JobProcessor {
    pub fn new(job_id: String, job_config: Arc<JobConfig>, resolver: Arc<FunctionResolver>) -> Self {
        JobProcessor {
            job_id,
            job_config,
            resolver,
        }
    }

    fn build_and_dispatch(&mut self, ctx: &mut ActorContext) -> std::result::Result<(), EngineError> {
        let graph = GraphBuilder::build_job(&self.job_config).map_err(|source| EngineError::GraphBuild {
            job_id: self.job_id.clone(),
            source,
        })?;

        let mut nodes = std::collections::HashMap::with_capacity(graph.nodes.len());
        for (node_id, node) in graph.nodes {
            let function = self
                .resolver
                .resolve_node(&self.job_config, &node)
                .map_err(|source| EngineError::Resolve {
                    job_id: self.job_id.clone(),
                    node_id: node_id.clone(),
                    source,
                })?;
            let mut ctx_node = GraphContextNode::new(node);
            ctx_node.function = Some(function);
            nodes.insert(node_id, ctx_node);
        }

        let context = GraphContext::new(nodes);
        let processor = GraphProcessor::new(context, graph.root_id).map_err(|source| EngineError::Processor {
            job_id: self.job_id.clone(),
            source,
        })?;

        ctx.spawn(processor);
        Ok(())
    }
}

impl Actor for JobProcessor {
    fn class_name(&self) -> &'static str {
        "jobprocessor"
    }

    fn message_table(&self) -> Vec<MessageSlot> {
        vec![
            MessageSlot::of::<BuildGraph>("build_graph"),
            MessageSlot::of::<graph_processor::JobSucceeded>("job_succeeded"),
            MessageSlot::of::<graph_processor::JobFailed>("job_failed"),
        ]
    }

    fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        ctx.send(ctx.id.clone(), "build_graph", BuildGraph);
        Ok(())
    }

    fn handle(&mut self, ctx: &mut ActorContext, name: &str, payload: Payload) -> Result<()> {
        match name {
            "build_graph" => {
                let _ = downcast_payload::<BuildGraph>(payload);
                if let Err(error) = self.build_and_dispatch(ctx) {
                    tracing::error!(job_id = %self.job_id, %error, "failed to set up job");
                    ctx.send_parent(
                        "job_failed",
                        JobFailed {
                            job_id: self.job_id.clone(),
                            reason: error.to_string(),
                        },
                    );
                    ctx.stop(None);
                }
            }
            "job_succeeded" => {
                if let Some(msg) = downcast_payload::<graph_processor::JobSucceeded>(payload) {
                    ctx.send_parent(
                        "job_succeeded",
                        JobSucceeded {
                            job_id: self.job_id.clone(),
                            result: msg.result,
                        },
                    );
                }
                ctx.stop(None);
            }
            "job_failed" => {
                if let Some(msg) = downcast_payload::<graph_processor::JobFailed>(payload) {
                    ctx.send_parent(
                        "job_failed",
                        JobFailed {
                            job_id: self.job_id.clone(),
                            reason: msg.reason,
                        },
                    );
                }
                ctx.stop(None);
            }
            _ => {}
        }
        Ok(())
    }
}

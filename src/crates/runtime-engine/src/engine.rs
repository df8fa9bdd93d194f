//! The engine façade: tracks in-flight jobs and, in batch mode, shuts
//! the whole tree down once the first one finishes.

use crate::job_processor::JobProcessor;
use crate::messages::{JobFailed, JobSucceeded, SubmitJob};
use actor_runtime::{downcast_payload, Actor, ActorContext, ActorId, MessageSlot, Payload, Result};
use graph_builder::{FunctionResolver, Repositories, StorageManager};
use std::collections::HashMap;
use std::sync::Arc;

/// Bookkeeping the engine keeps across the jobs it has spawned.
///
/// The original's `EngineContext` paired a `jobs` map with an always-empty
/// `data` placeholder; here `data`'s role is filled by the concrete
/// collaborator handles every job's resolver is built from, since this
/// port actually wires storage/model loading rather than stubbing it out.
pub struct EngineContext {
    pub jobs: HashMap<String, ActorId>,
    pub repositories: Arc<dyn Repositories>,
    pub storage: Arc<dyn StorageManager>,
}

pub struct Engine {
    context: EngineContext,
    batch_mode: bool,
}

impl Engine {
    pub fn new(repositories: Arc<dyn Repositories>, storage: Arc<dyn StorageManager>, batch_mode: bool) -> Self {
        Engine {
            context: EngineContext {
                jobs: HashMap::new(),
                repositories,
                storage,
            },
            batch_mode,
        }
    }

    fn submit_job(&mut self, ctx: &mut ActorContext, msg: SubmitJob) {
        let job_id = msg.job_config.job_id.clone();
        let resolver = Arc::new(FunctionResolver::new(
            self.context.repositories.clone(),
            self.context.storage.clone(),
        ));
        let processor = JobProcessor::new(job_id.clone(), msg.job_config, resolver);
        let actor_id = ctx.spawn(processor);
        tracing::info!(job_id = %job_id, actor = %actor_id, "job submitted");
        self.context.jobs.insert(job_id, actor_id);
    }

    fn job_finished(&mut self, ctx: &mut ActorContext, job_id: &str) {
        self.context.jobs.remove(job_id);
        if self.batch_mode {
            tracing::info!(job_id, "batch mode: stopping engine after first job");
            ctx.stop(None);
        }
    }
}

impl Actor for Engine {
    fn class_name(&self) -> &'static str {
        "engine"
    }

    fn message_table(&self) -> Vec<MessageSlot> {
        vec![
            MessageSlot::of::<SubmitJob>("submit_job"),
            MessageSlot::of::<JobSucceeded>("job_succeeded"),
            MessageSlot::of::<JobFailed>("job_failed"),
        ]
    }

    fn handle(&mut self, ctx: &mut ActorContext, name: &str, payload: Payload) -> Result<()> {
        match name {
            "submit_job" => {
                if let Some(msg) = downcast_payload::<SubmitJob>(payload) {
                    self.submit_job(ctx, *msg);
                }
            }
            "job_succeeded" => {
                if let Some(msg) = downcast_payload::<JobSucceeded>(payload) {
                    tracing::info!(job_id = %msg.job_id, "job succeeded");
                    self.job_finished(ctx, &msg.job_id);
                }
            }
            "job_failed" => {
                if let Some(msg) = downcast_payload::<JobFailed>(payload) {
                    tracing::warn!(job_id = %msg.job_id, reason = %msg.reason, "job failed");
                    self.job_finished(ctx, &msg.job_id);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

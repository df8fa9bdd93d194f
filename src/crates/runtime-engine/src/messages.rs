use graph_model::{JobConfig, NodeValue};
use std::sync::Arc;

/// Submit one job for execution. The job id is assigned by the caller
/// (see [`crate::runtime::Runtime::submit_job`]) rather than generated
/// inside the actor tree, so `submit_job` can hand the id back
/// synchronously without waiting on a reply message.
#[derive(Debug)]
pub struct SubmitJob {
    pub job_config: Arc<JobConfig>,
}

#[derive(Debug)]
pub struct JobSucceeded {
    pub job_id: String,
    pub result: Option<NodeValue>,
}

#[derive(Debug)]
pub struct JobFailed {
    pub job_id: String,
    pub reason: String,
}

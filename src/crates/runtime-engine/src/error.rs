//! Errors the engine façade can raise setting up or tracking a job.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("failed to build graph for job '{job_id}': {source}")]
    GraphBuild {
        job_id: String,
        #[source]
        source: graph_builder::GraphBuildError,
    },

    #[error("failed to resolve node {node_id} for job '{job_id}': {source}")]
    Resolve {
        job_id: String,
        node_id: graph_model::NodeId,
        #[source]
        source: graph_builder::ResolveError,
    },

    #[error("graph processor setup failed for job '{job_id}': {source}")]
    Processor {
        job_id: String,
        #[source]
        source: graph_processor::ProcessorError,
    },
}

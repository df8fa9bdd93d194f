//! Error types for graph building and node resolution.

use graph_model::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GraphBuildError {
    #[error("job target '{0}' is not a declared object")]
    UnknownTarget(String),
    #[error("job target '{0}' is not a model")]
    TargetNotAModel(String),
    #[error("input '{0}' is not bound to a declared object")]
    UnboundInput(String),
    #[error("output '{0}' is not bound to a declared object")]
    UnboundOutput(String),
    #[error("object '{0}' referenced by the job is not a dataset")]
    NotADataset(String),
    #[error("graph would contain a cycle through {0}")]
    Cyclic(NodeId),
}

#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("no resolution rule registered for node kind {0}")]
    NoResolver(&'static str),
    #[error("model repository '{0}' is not configured")]
    UnknownRepository(String),
    #[error("failed to load model '{entry_point}' from repository '{repository}': {reason}")]
    ModelLoadFailed {
        repository: String,
        entry_point: String,
        reason: String,
    },
    #[error("invalid storage metadata for data item '{0}'")]
    InvalidStorageMetadata(String),
    #[error("data item '{0}' is not available (expunged or no reachable copy)")]
    DataNotAvailable(String),
}

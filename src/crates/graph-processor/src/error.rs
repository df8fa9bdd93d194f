//! Errors the graph processor itself can raise.
//!
//! Node evaluation failures are *data* (`graph_model::NodeEvalError`
//! recorded on a node), not exceptions. This taxonomy only covers the
//! processor's own setup/lifecycle errors.

use graph_model::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ProcessorError {
    #[error("graph root node '{0}' is not present among its own nodes")]
    MissingRoot(NodeId),
}

//! Node results and the `NodeFunction` callable.

use crate::context::GraphContextNode;
use crate::id::NodeId;
use crate::metadata::TableDefinition;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A key identifying one partition (and, within it, one delta) of a
/// dataset view. Only the root partition is produced by this core; the
/// type exists so a future partitioned-storage backend has somewhere to
/// plug in without changing the node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPartKey(String);

impl DataPartKey {
    pub fn for_root() -> Self {
        DataPartKey("root".to_string())
    }
}

impl fmt::Display for DataPartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single loaded or produced unit of tabular data.
///
/// The actual read/write machinery lives behind [`crate::storage::StorageManager`];
/// this is just the in-memory handle a node function passes along.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    pub schema: TableDefinition,
    pub rows: Vec<HashMap<String, serde_json::Value>>,
}

/// A typed view over one or more data item deltas, keyed by partition.
#[derive(Debug, Clone, PartialEq)]
pub struct DataView {
    pub schema: TableDefinition,
    pub parts: HashMap<DataPartKey, Vec<DataItem>>,
}

impl DataView {
    pub fn root_delta(&self) -> Option<&DataItem> {
        self.parts.get(&DataPartKey::for_root()).and_then(|deltas| deltas.first())
    }
}

/// Everything a node function can hand back as its result.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// No meaningful value (noop / terminal metadata markers).
    Unit,
    /// A reshaped sub-context, as produced by context push/pop.
    Context(HashMap<NodeId, NodeValue>),
    /// A name-keyed bag of values, as produced by a model's input/output
    /// binding (model parameters and data views are addressed by name,
    /// not by node id).
    NamedContext(HashMap<String, NodeValue>),
    Item(DataItem),
    View(DataView),
    Bool(bool),
}

impl NodeValue {
    pub fn as_item(&self) -> Option<&DataItem> {
        match self {
            NodeValue::Item(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&DataView> {
        match self {
            NodeValue::View(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&HashMap<NodeId, NodeValue>> {
        match self {
            NodeValue::Context(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_named_context(&self) -> Option<&HashMap<String, NodeValue>> {
        match self {
            NodeValue::NamedContext(c) => Some(c),
            _ => None,
        }
    }
}

/// Errors a node function can raise while evaluating. These are *data* to
/// the graph processor: they never unwind past `NodeProcessor::evaluate_node`,
/// which turns them into `node_failed`.
#[derive(Error, Debug, Clone)]
pub enum NodeEvalError {
    #[error("missing required input {0}")]
    MissingInput(NodeId),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("data item not available: {0}")]
    DataNotAvailable(String),
    #[error("model execution failed: {0}")]
    ModelFailed(String),
    #[error("directory storage format not available yet")]
    UnsupportedStorageFormat,
}

/// The read-only snapshot of already-evaluated results a node function
/// sees. Always contains exactly the declared dependencies' results.
pub type NodeContext<'a> = &'a HashMap<NodeId, GraphContextNode>;

/// A pure callable resolved once per node at graph-build time and invoked
/// at most once during execution.
pub trait NodeFunction: Send {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError>;
}

impl fmt::Debug for dyn NodeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeFunction")
    }
}

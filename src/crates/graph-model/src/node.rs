//! Node kinds and their dependency edges.

use crate::id::NodeId;
use crate::metadata::{DataDefinition, ModelDefinition, StorageDefinition, TableDefinition};
use std::collections::HashMap;

/// Whether a dependency edge poisons its dependent when it fails.
///
/// `tolerant = true` means the dependent may still run (without that
/// dependency's result in its context) even if the dependency ends up
/// in `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DependencyType {
    pub tolerant: bool,
}

impl DependencyType {
    pub fn required() -> Self {
        DependencyType { tolerant: false }
    }

    pub fn tolerant() -> Self {
        DependencyType { tolerant: true }
    }
}

impl Default for DependencyType {
    fn default() -> Self {
        DependencyType::required()
    }
}

/// The payload carried by each node kind, mirroring the original's class
/// hierarchy as a single sum type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pass through the context unchanged.
    Identity,
    /// The job's terminal node; its result is the job's result.
    Job,
    /// A node with no meaningful result, used as a structural marker.
    Noop,
    /// Reshape the context entering a subgraph: `mapping` maps a node id
    /// in the new (inner) namespace to the node id in the outer context
    /// it is bound from.
    ContextPush {
        mapping: HashMap<NodeId, NodeId>,
        namespace: Vec<String>,
    },
    /// Reshape the context leaving a subgraph: `mapping` maps a node id
    /// in the inner namespace to the node id it is exposed as outside.
    ContextPop { mapping: HashMap<NodeId, NodeId> },
    /// Pass a prior node's result through unchanged.
    MapIdentity { src_id: NodeId },
    /// Select one keyed item out of a prior node's mapping-shaped result.
    MapKeyedItem { src_id: NodeId, src_item: String },
    /// Build a typed dataset view rooted at a prior data item.
    DataView { schema: TableDefinition, root_item: NodeId },
    /// Extract the default (root partition, delta 0) item from a view.
    MapDataItem { data_view_id: NodeId },
    /// Load a data item from storage.
    LoadData {
        data_item: String,
        data_def: DataDefinition,
        storage_def: StorageDefinition,
    },
    /// Persist a data item to storage.
    SaveData { data_item_id: NodeId, data_def: DataDefinition },
    /// Invoke a user model.
    Model { model_def: ModelDefinition, id: NodeId },
    /// Terminal metadata marker for a job's output set; resolved as a no-op.
    JobOutputMetadata,
    /// Terminal metadata marker for a job's result; resolved as a no-op.
    JobResultMetadata,
}

impl NodeKind {
    /// The class-name-shaped label used in node lifecycle logging,
    /// matching the original's `type(self.node.node).__name__` lines.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Identity => "IdentityNode",
            NodeKind::Job => "JobNode",
            NodeKind::Noop => "NoopNode",
            NodeKind::ContextPush { .. } => "ContextPushNode",
            NodeKind::ContextPop { .. } => "ContextPopNode",
            NodeKind::MapIdentity { .. } => "MapIdentityNode",
            NodeKind::MapKeyedItem { .. } => "MapKeyedItemNode",
            NodeKind::DataView { .. } => "DataViewNode",
            NodeKind::MapDataItem { .. } => "MapDataItemNode",
            NodeKind::LoadData { .. } => "LoadDataNode",
            NodeKind::SaveData { .. } => "SaveDataNode",
            NodeKind::Model { .. } => "ModelNode",
            NodeKind::JobOutputMetadata => "JobOutputMetadataNode",
            NodeKind::JobResultMetadata => "JobResultMetadataNode",
        }
    }
}

/// A single node in a job's execution graph: its kind plus the
/// dependency edges the processor must satisfy before it is viable.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub dependencies: HashMap<NodeId, DependencyType>,
}

impl Node {
    pub fn new(kind: NodeKind, dependencies: HashMap<NodeId, DependencyType>) -> Self {
        Node { kind, dependencies }
    }

    pub fn with_no_dependencies(kind: NodeKind) -> Self {
        Node::new(kind, HashMap::new())
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

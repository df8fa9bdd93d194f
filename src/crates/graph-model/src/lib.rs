//! Data model for a job's execution graph: node identifiers, node kinds
//! and their dependency edges, the execution-time context the processor
//! mutates, and the declarative config/metadata types the builder and
//! resolver consume.

mod config;
mod context;
mod function;
mod graph;
mod id;
mod metadata;
mod node;

pub use config::{JobConfig, RuntimeConfig, SparkSettings, StorageConfig, StorageSettings};
pub use context::{GraphContext, GraphContextNode};
pub use function::{DataItem, DataPartKey, DataView, NodeContext, NodeEvalError, NodeFunction, NodeValue};
pub use graph::Graph;
pub use id::NodeId;
pub use metadata::{
    BasicType, CopyStatus, DataDefinition, FieldDefinition, IncarnationStatus, ModelDefinition,
    ModelParameter, ObjectDefinition, StorageCopy, StorageDefinition, StorageIncarnation, StorageItem,
    TableDefinition, TypeDescriptor,
};
pub use node::{DependencyType, Node, NodeKind};

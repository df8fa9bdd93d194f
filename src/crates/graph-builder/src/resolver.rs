//! Binds each node kind to an executable [`NodeFunction`].
//!
//! Mirrors the original's two dispatch tables: "basic" nodes whose
//! resolution is just wrapping the node in a function with no external
//! services, and nodes that need the job config and/or storage/model
//! services to resolve.

use crate::collaborators::{ModelContext as ExternalModelContext, Repositories, StorageManager};
use crate::error::ResolveError;
use graph_model::{
    CopyStatus, DataItem, IncarnationStatus, JobConfig, Node, NodeContext, NodeEvalError, NodeFunction,
    NodeId, NodeKind, NodeValue, StorageCopy, StorageDefinition,
};
use std::collections::HashMap;
use std::sync::Arc;

struct IdentityFunc;
struct JobFunc;
struct NoopFunc;

fn snapshot_of(ctx: NodeContext) -> HashMap<NodeId, NodeValue> {
    ctx.iter()
        .filter_map(|(id, n)| n.result.clone().map(|r| (id.clone(), r)))
        .collect()
}

impl NodeFunction for IdentityFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        Ok(NodeValue::Context(snapshot_of(ctx)))
    }
}

impl NodeFunction for JobFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        Ok(NodeValue::Context(snapshot_of(ctx)))
    }
}

impl NodeFunction for NoopFunc {
    fn call(&self, _ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        Ok(NodeValue::Unit)
    }
}

struct ContextPushFunc {
    mapping: HashMap<NodeId, NodeId>,
    namespace: Vec<String>,
}

impl NodeFunction for ContextPushFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        let mut target_ctx = HashMap::new();
        for (target_id, source_id) in &self.mapping {
            let source_item = ctx
                .get(source_id)
                .and_then(|n| n.result.clone())
                .ok_or_else(|| NodeEvalError::MissingInput(source_id.clone()))?;
            if target_id.namespace != self.namespace {
                return Err(NodeEvalError::InvalidMetadata(format!(
                    "context push target {target_id} does not belong to namespace {:?}",
                    self.namespace
                )));
            }
            target_ctx.insert(target_id.clone(), source_item);
        }
        Ok(NodeValue::Context(target_ctx))
    }
}

struct ContextPopFunc {
    mapping: HashMap<NodeId, NodeId>,
}

impl NodeFunction for ContextPopFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        let mut target_ctx = HashMap::new();
        for (source_id, target_id) in &self.mapping {
            let source_item = ctx
                .get(source_id)
                .and_then(|n| n.result.clone())
                .ok_or_else(|| NodeEvalError::MissingInput(source_id.clone()))?;
            target_ctx.insert(target_id.clone(), source_item);
        }
        Ok(NodeValue::Context(target_ctx))
    }
}

struct MapIdentityFunc {
    src_id: NodeId,
}

impl NodeFunction for MapIdentityFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        ctx.get(&self.src_id)
            .and_then(|n| n.result.clone())
            .ok_or_else(|| NodeEvalError::MissingInput(self.src_id.clone()))
    }
}

struct MapKeyedItemFunc {
    src_id: NodeId,
    src_item: String,
}

impl NodeFunction for MapKeyedItemFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        let src_result = ctx
            .get(&self.src_id)
            .and_then(|n| n.result.as_ref())
            .ok_or_else(|| NodeEvalError::MissingInput(self.src_id.clone()))?;
        let named = src_result
            .as_named_context()
            .ok_or_else(|| NodeEvalError::InvalidMetadata(format!("{} is not a keyed result", self.src_id)))?;
        named
            .get(&self.src_item)
            .cloned()
            .ok_or_else(|| NodeEvalError::InvalidMetadata(format!("no item '{}' in {}", self.src_item, self.src_id)))
    }
}

struct DataViewFunc {
    schema: graph_model::TableDefinition,
    root_item: NodeId,
}

impl NodeFunction for DataViewFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        let root_item = ctx
            .get(&self.root_item)
            .and_then(|n| n.result.as_ref())
            .and_then(|r| r.as_item())
            .cloned()
            .ok_or_else(|| NodeEvalError::MissingInput(self.root_item.clone()))?;
        let mut parts = HashMap::new();
        parts.insert(graph_model::DataPartKey::for_root(), vec![root_item]);
        Ok(NodeValue::View(graph_model::DataView {
            schema: self.schema.clone(),
            parts,
        }))
    }
}

struct MapDataItemFunc {
    data_view_id: NodeId,
}

impl NodeFunction for MapDataItemFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        let view = ctx
            .get(&self.data_view_id)
            .and_then(|n| n.result.as_ref())
            .and_then(|r| r.as_view())
            .ok_or_else(|| NodeEvalError::MissingInput(self.data_view_id.clone()))?;
        let delta = view
            .root_delta()
            .cloned()
            .ok_or_else(|| NodeEvalError::DataNotAvailable(self.data_view_id.to_string()))?;
        Ok(NodeValue::Item(delta))
    }
}

/// Picks the first available incarnation (scanning from the newest) and,
/// within it, the first copy whose storage key the storage manager can
/// actually reach.
fn choose_copy(
    data_item: &str,
    storage_def: &StorageDefinition,
    storage: &dyn StorageManager,
) -> Result<StorageCopy, ResolveError> {
    let item = storage_def
        .data_items
        .get(data_item)
        .ok_or_else(|| ResolveError::InvalidStorageMetadata(data_item.to_string()))?;

    let incarnation = item
        .incarnations
        .iter()
        .rev()
        .find(|inc| inc.incarnation_status == IncarnationStatus::IncarnationAvailable)
        .ok_or_else(|| ResolveError::DataNotAvailable(data_item.to_string()))?;

    incarnation
        .copies
        .iter()
        .find(|c| c.copy_status == CopyStatus::CopyAvailable && storage.has_data_storage(&c.storage_key))
        .cloned()
        .ok_or_else(|| ResolveError::DataNotAvailable(data_item.to_string()))
}

struct LoadDataFunc {
    data_item: String,
    data_def: graph_model::DataDefinition,
    storage_def: StorageDefinition,
    storage: Arc<dyn StorageManager>,
}

impl NodeFunction for LoadDataFunc {
    fn call(&self, _ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        // Chosen here, not at resolve time: a copy that looked available
        // when the graph was built can still turn out unreachable, and a
        // missing copy is an ordinary node failure, not a job setup error.
        let copy = choose_copy(&self.data_item, &self.storage_def, self.storage.as_ref())
            .map_err(|e| NodeEvalError::DataNotAvailable(e.to_string()))?;

        let file_storage = self
            .storage
            .get_file_storage(&copy.storage_key)
            .map_err(|e| NodeEvalError::DataNotAvailable(e.to_string()))?;
        let stat = file_storage
            .stat(&copy.storage_path)
            .map_err(|e| NodeEvalError::DataNotAvailable(e.to_string()))?;

        if stat.file_type != crate::collaborators::FileType::File {
            return Err(NodeEvalError::UnsupportedStorageFormat);
        }

        let data_storage = self
            .storage
            .get_data_storage(&copy.storage_key)
            .map_err(|e| NodeEvalError::DataNotAvailable(e.to_string()))?;

        let item: DataItem = data_storage
            .read_table(&self.data_def.schema, &copy.storage_path, &copy.storage_format)
            .map_err(|e| NodeEvalError::DataNotAvailable(format!("{}: {e}", self.data_item)))?;

        Ok(NodeValue::Item(item))
    }
}

struct SaveDataFunc {
    data_item_id: NodeId,
    data_def: graph_model::DataDefinition,
    storage_key: String,
    storage_path: String,
    storage_format: String,
    storage: Arc<dyn StorageManager>,
}

impl NodeFunction for SaveDataFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        let item = ctx
            .get(&self.data_item_id)
            .and_then(|n| n.result.as_ref())
            .and_then(|r| r.as_item())
            .ok_or_else(|| NodeEvalError::MissingInput(self.data_item_id.clone()))?;

        let data_storage = self
            .storage
            .get_data_storage(&self.storage_key)
            .map_err(|e| NodeEvalError::DataNotAvailable(e.to_string()))?;

        data_storage
            .write_table(&self.data_def.schema, item, &self.storage_path, &self.storage_format)
            .map_err(|e| NodeEvalError::DataNotAvailable(e.to_string()))?;

        Ok(NodeValue::Bool(true))
    }
}

struct ModelFunc {
    model_def: graph_model::ModelDefinition,
    id: NodeId,
    job_config: Arc<JobConfig>,
    entry_point: Arc<dyn crate::collaborators::ModelEntryPoint>,
}

impl NodeFunction for ModelFunc {
    fn call(&self, ctx: NodeContext) -> Result<NodeValue, NodeEvalError> {
        let mut data = HashMap::new();

        for input_name in self.model_def.input.keys() {
            let nid = NodeId::new(input_name.clone(), self.id.namespace.clone());
            let result = ctx
                .get(&nid)
                .and_then(|n| n.result.clone())
                .ok_or_else(|| NodeEvalError::MissingInput(nid.clone()))?;
            data.insert(input_name.clone(), result);
        }
        for (output_name, schema) in &self.model_def.output {
            data.insert(
                output_name.clone(),
                NodeValue::View(graph_model::DataView {
                    schema: schema.clone(),
                    parts: HashMap::new(),
                }),
            );
        }

        let mut model_ctx = ExternalModelContext {
            model_def: &self.model_def,
            parameters: &self.job_config.parameters,
            data,
        };

        self.entry_point
            .run(&mut model_ctx)
            .map_err(|e| NodeEvalError::ModelFailed(e.to_string()))?;

        Ok(NodeValue::NamedContext(model_ctx.data))
    }
}

/// Resolves every node in a graph to its executable [`NodeFunction`].
pub struct FunctionResolver {
    repositories: Arc<dyn Repositories>,
    storage: Arc<dyn StorageManager>,
}

impl FunctionResolver {
    pub fn new(repositories: Arc<dyn Repositories>, storage: Arc<dyn StorageManager>) -> Self {
        FunctionResolver { repositories, storage }
    }

    pub fn resolve_node(&self, job_config: &Arc<JobConfig>, node: &Node) -> Result<Box<dyn NodeFunction>, ResolveError> {
        match &node.kind {
            NodeKind::Identity => Ok(Box::new(IdentityFunc)),
            NodeKind::Job => Ok(Box::new(JobFunc)),
            NodeKind::Noop | NodeKind::JobOutputMetadata | NodeKind::JobResultMetadata => Ok(Box::new(NoopFunc)),
            NodeKind::ContextPush { mapping, namespace } => Ok(Box::new(ContextPushFunc {
                mapping: mapping.clone(),
                namespace: namespace.clone(),
            })),
            NodeKind::ContextPop { mapping } => Ok(Box::new(ContextPopFunc { mapping: mapping.clone() })),
            NodeKind::MapIdentity { src_id } => Ok(Box::new(MapIdentityFunc { src_id: src_id.clone() })),
            NodeKind::MapKeyedItem { src_id, src_item } => Ok(Box::new(MapKeyedItemFunc {
                src_id: src_id.clone(),
                src_item: src_item.clone(),
            })),
            NodeKind::DataView { schema, root_item } => Ok(Box::new(DataViewFunc {
                schema: schema.clone(),
                root_item: root_item.clone(),
            })),
            NodeKind::MapDataItem { data_view_id } => Ok(Box::new(MapDataItemFunc {
                data_view_id: data_view_id.clone(),
            })),
            NodeKind::LoadData {
                data_item,
                data_def,
                storage_def,
            } => Ok(Box::new(LoadDataFunc {
                data_item: data_item.clone(),
                data_def: data_def.clone(),
                storage_def: storage_def.clone(),
                storage: self.storage.clone(),
            })),
            NodeKind::SaveData { data_item_id, data_def } => Ok(Box::new(SaveDataFunc {
                data_item_id: data_item_id.clone(),
                data_def: data_def.clone(),
                storage_key: "default".to_string(),
                storage_path: format!("{}.csv", data_item_id.name),
                storage_format: "CSV".to_string(),
                storage: self.storage.clone(),
            })),
            NodeKind::Model { model_def, id } => {
                let loader = self.repositories.get_model_loader(&model_def.repository)?;
                let entry_point: Arc<dyn crate::collaborators::ModelEntryPoint> =
                    Arc::from(loader.load_model(model_def)?);
                Ok(Box::new(ModelFunc {
                    model_def: model_def.clone(),
                    id: id.clone(),
                    job_config: job_config.clone(),
                    entry_point,
                }))
            }
        }
    }
}

//! Narrow interfaces onto external collaborators: model repositories and
//! storage backends. Neither is implemented here — these are the seams a
//! host application wires real storage/model-loading code into.

use graph_model::{ModelDefinition, TableDefinition};
use std::fmt;

/// A callable entry point for a loaded user model.
///
/// `run` receives the model's declared parameters plus its input/output
/// data views (already materialized/ readied by the caller) and performs
/// the model's computation in place on the outputs.
pub trait ModelEntryPoint: Send {
    fn run(&self, ctx: &mut ModelContext) -> Result<(), ModelRunError>;
}

#[derive(Debug, Clone)]
pub struct ModelRunError(pub String);

impl fmt::Display for ModelRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ModelRunError {}

/// The read/write context a model entry point runs against: its
/// parameters, and its named input/output data views.
pub struct ModelContext<'a> {
    pub model_def: &'a ModelDefinition,
    pub parameters: &'a std::collections::HashMap<String, serde_json::Value>,
    pub data: std::collections::HashMap<String, graph_model::NodeValue>,
}

impl<'a> ModelContext<'a> {
    pub fn input(&self, name: &str) -> Option<&graph_model::NodeValue> {
        self.data.get(name)
    }

    pub fn set_output(&mut self, name: &str, value: graph_model::NodeValue) {
        self.data.insert(name.to_string(), value);
    }
}

/// Loads a model's code given its static definition.
pub trait ModelLoader: Send + Sync {
    fn load_model(
        &self,
        model_def: &ModelDefinition,
    ) -> Result<Box<dyn ModelEntryPoint>, crate::error::ResolveError>;
}

/// Resolves a model's declared repository to the loader that knows how
/// to fetch code from it.
pub trait Repositories: Send + Sync {
    fn get_model_loader(&self, repository: &str) -> Result<&dyn ModelLoader, crate::error::ResolveError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub file_type: FileType,
}

/// Stat and resolve paths within one storage location.
pub trait FileStorage: Send + Sync {
    fn stat(&self, path: &str) -> Result<FileStat, crate::error::ResolveError>;
}

/// Read/write tabular data within one storage location.
pub trait DataStorage: Send + Sync {
    fn read_table(
        &self,
        schema: &TableDefinition,
        path: &str,
        format: &str,
    ) -> Result<graph_model::DataItem, crate::error::ResolveError>;

    fn write_table(
        &self,
        schema: &TableDefinition,
        item: &graph_model::DataItem,
        path: &str,
        format: &str,
    ) -> Result<(), crate::error::ResolveError>;
}

/// Looks up the file/data storage backend registered under a storage key.
pub trait StorageManager: Send + Sync {
    fn has_data_storage(&self, key: &str) -> bool;
    fn get_file_storage(&self, key: &str) -> Result<&dyn FileStorage, crate::error::ResolveError>;
    fn get_data_storage(&self, key: &str) -> Result<&dyn DataStorage, crate::error::ResolveError>;
}

//! Declarative metadata types consumed by the graph builder and resolver.
//!
//! These describe *what* a model, dataset, or storage location looks like;
//! none of it is interpreted here. Parsing a metadata document from disk
//! is out of scope — these are plain `serde` data types a caller wires up
//! to their own loader.

use std::collections::HashMap;

/// The primitive scalar kinds a table or parameter field can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BasicType {
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    Date,
    DateTime,
}

/// The type of a field or parameter, including whether it's nullable.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypeDescriptor {
    pub basic_type: BasicType,
    #[serde(default)]
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldDefinition {
    pub field_name: String,
    pub field_type: TypeDescriptor,
    #[serde(default)]
    pub business_key: bool,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TableDefinition {
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelParameter {
    pub param_name: String,
    pub param_type: TypeDescriptor,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
}

/// Static description of a user model: where its code lives, and the
/// named inputs/outputs/parameters it declares.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelDefinition {
    pub repository: String,
    pub entry_point: String,
    #[serde(default)]
    pub parameters: HashMap<String, ModelParameter>,
    /// input name -> schema
    #[serde(default)]
    pub input: HashMap<String, TableDefinition>,
    /// output name -> schema
    #[serde(default)]
    pub output: HashMap<String, TableDefinition>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataDefinition {
    pub schema: TableDefinition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncarnationStatus {
    IncarnationAvailable,
    IncarnationExpunged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopyStatus {
    CopyAvailable,
    CopyExpunged,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StorageCopy {
    pub copy_status: CopyStatus,
    pub storage_key: String,
    pub storage_path: String,
    pub storage_format: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StorageIncarnation {
    pub incarnation_status: IncarnationStatus,
    pub copies: Vec<StorageCopy>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StorageItem {
    pub incarnations: Vec<StorageIncarnation>,
}

/// Where the copies of a dataset's data items physically live.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct StorageDefinition {
    #[serde(default)]
    pub data_items: HashMap<String, StorageItem>,
}

/// Any declared object a job config can reference by id: a model, a
/// dataset, or a storage location.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "objectType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectDefinition {
    Model(ModelDefinition),
    Data(DataDefinition),
    Storage(StorageDefinition),
}

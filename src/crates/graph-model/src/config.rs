//! Configuration data types.
//!
//! These are plain `serde` structs; loading them from a YAML or JSON file
//! is a caller concern — nothing here parses a config file from disk.

use crate::metadata::{ObjectDefinition, StorageDefinition};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SparkSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub default_storage: Option<String>,
    #[serde(default)]
    pub storage: HashMap<String, StorageSettings>,
    #[serde(default)]
    pub spark: SparkSettings,
}

/// Process-wide configuration for a runtime instance: which storage
/// locations and model repositories it knows how to reach.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub repositories: HashMap<String, String>,
    #[serde(default)]
    pub batch_mode: bool,
}

/// A single job's specification: the model (or other object) to run,
/// its parameter bindings, input/output bindings, and every object the
/// job references by id.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobConfig {
    pub job_id: String,
    pub target: String,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub inputs: HashMap<String, String>,
    #[serde(default)]
    pub outputs: HashMap<String, String>,
    #[serde(default)]
    pub objects: HashMap<String, ObjectDefinition>,
    /// Storage metadata for each data object referenced above, keyed by
    /// the same object id. Kept separate from `objects` because a data
    /// item's schema and its physical storage location are independent
    /// concerns the builder resolves at different points.
    #[serde(default)]
    pub storage: HashMap<String, StorageDefinition>,
}

impl JobConfig {
    pub fn target_object(&self) -> Option<&ObjectDefinition> {
        self.objects.get(&self.target)
    }
}

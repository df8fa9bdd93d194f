//! End-to-end coverage of the whole stack: a `Runtime` submitting a real
//! job through the engine, graph builder, resolver, and graph processor,
//! backed by in-memory storage and model collaborators.

use graph_builder::{
    DataStorage, FileStat, FileStorage, FileType, ModelContext, ModelEntryPoint, ModelLoader,
    ModelRunError, Repositories, ResolveError, StorageManager,
};
use graph_model::{
    CopyStatus, DataDefinition, DataItem, IncarnationStatus, JobConfig, ModelDefinition, NodeValue,
    ObjectDefinition, RuntimeConfig, StorageCopy, StorageDefinition, StorageIncarnation, StorageItem,
    TableDefinition,
};
use runtime_engine::Runtime;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

struct InMemoryFileStorage;

impl FileStorage for InMemoryFileStorage {
    fn stat(&self, _path: &str) -> Result<FileStat, ResolveError> {
        Ok(FileStat { file_type: FileType::File })
    }
}

struct InMemoryDataStorage {
    rows: Vec<HashMap<String, serde_json::Value>>,
    written: Arc<Mutex<HashMap<String, DataItem>>>,
}

impl DataStorage for InMemoryDataStorage {
    fn read_table(&self, schema: &TableDefinition, _path: &str, _format: &str) -> Result<DataItem, ResolveError> {
        Ok(DataItem {
            schema: schema.clone(),
            rows: self.rows.clone(),
        })
    }

    fn write_table(&self, _schema: &TableDefinition, item: &DataItem, path: &str, _format: &str) -> Result<(), ResolveError> {
        self.written.lock().unwrap().insert(path.to_string(), item.clone());
        Ok(())
    }
}

struct InMemoryStorageManager {
    files: InMemoryFileStorage,
    data: InMemoryDataStorage,
}

impl StorageManager for InMemoryStorageManager {
    fn has_data_storage(&self, _key: &str) -> bool {
        true
    }

    fn get_file_storage(&self, _key: &str) -> Result<&dyn FileStorage, ResolveError> {
        Ok(&self.files)
    }

    fn get_data_storage(&self, _key: &str) -> Result<&dyn DataStorage, ResolveError> {
        Ok(&self.data)
    }
}

/// Doubles every row's `value` field. Stands in for a real scoring model.
struct DoublingModel;

impl ModelEntryPoint for DoublingModel {
    fn run(&self, ctx: &mut ModelContext) -> Result<(), ModelRunError> {
        let input = ctx
            .input("customers")
            .and_then(NodeValue::as_item)
            .cloned()
            .ok_or_else(|| ModelRunError("missing 'customers' input".to_string()))?;

        let scored_rows = input
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                if let Some(v) = row.get("value").and_then(|v| v.as_f64()) {
                    row.insert("value".to_string(), serde_json::json!(v * 2.0));
                }
                row
            })
            .collect();

        ctx.set_output(
            "scored",
            NodeValue::Item(DataItem {
                schema: input.schema,
                rows: scored_rows,
            }),
        );
        Ok(())
    }
}

struct SingleModelLoader;

impl ModelLoader for SingleModelLoader {
    fn load_model(&self, _model_def: &ModelDefinition) -> Result<Box<dyn ModelEntryPoint>, ResolveError> {
        Ok(Box::new(DoublingModel))
    }
}

struct SingleRepository {
    loader: SingleModelLoader,
}

impl Repositories for SingleRepository {
    fn get_model_loader(&self, _repository: &str) -> Result<&dyn ModelLoader, ResolveError> {
        Ok(&self.loader)
    }
}

fn sample_job() -> JobConfig {
    let mut model_inputs = HashMap::new();
    model_inputs.insert("customers".to_string(), TableDefinition { fields: vec![] });
    let mut model_outputs = HashMap::new();
    model_outputs.insert("scored".to_string(), TableDefinition { fields: vec![] });

    let model_def = ModelDefinition {
        repository: "example_repo".to_string(),
        entry_point: "models.scoring.ScoreModel".to_string(),
        parameters: HashMap::new(),
        input: model_inputs,
        output: model_outputs,
    };

    let mut objects = HashMap::new();
    objects.insert("model_1".to_string(), ObjectDefinition::Model(model_def));
    objects.insert(
        "customers_data".to_string(),
        ObjectDefinition::Data(DataDefinition {
            schema: TableDefinition { fields: vec![] },
        }),
    );
    objects.insert(
        "scored_data".to_string(),
        ObjectDefinition::Data(DataDefinition {
            schema: TableDefinition { fields: vec![] },
        }),
    );

    let mut inputs = HashMap::new();
    inputs.insert("customers".to_string(), "customers_data".to_string());
    let mut outputs = HashMap::new();
    outputs.insert("scored".to_string(), "scored_data".to_string());

    let mut storage = HashMap::new();
    storage.insert(
        "customers_data".to_string(),
        StorageDefinition {
            data_items: HashMap::from([(
                "customers_data".to_string(),
                StorageItem {
                    incarnations: vec![StorageIncarnation {
                        incarnation_status: IncarnationStatus::IncarnationAvailable,
                        copies: vec![StorageCopy {
                            copy_status: CopyStatus::CopyAvailable,
                            storage_key: "default".to_string(),
                            storage_path: "customers.csv".to_string(),
                            storage_format: "CSV".to_string(),
                        }],
                    }],
                },
            )]),
        },
    );

    JobConfig {
        job_id: String::new(),
        target: "model_1".to_string(),
        parameters: HashMap::new(),
        inputs,
        outputs,
        objects,
        storage,
    }
}

#[test]
fn runs_a_job_end_to_end_and_writes_its_output() {
    let written = Arc::new(Mutex::new(HashMap::new()));
    let storage = Arc::new(InMemoryStorageManager {
        files: InMemoryFileStorage,
        data: InMemoryDataStorage {
            rows: vec![HashMap::from([("value".to_string(), serde_json::json!(21.0))])],
            written: written.clone(),
        },
    });
    let repositories = Arc::new(SingleRepository {
        loader: SingleModelLoader,
    });

    let mut runtime = Runtime::new(
        RuntimeConfig {
            batch_mode: true,
            ..Default::default()
        },
        repositories,
        storage,
    );
    runtime.start();
    let job_id = runtime.submit_job(sample_job());
    assert!(!job_id.is_empty());

    let exit_code = runtime.wait_for_shutdown();
    assert_eq!(exit_code, 0);

    let written = written.lock().unwrap();
    let output = written.get("scored.csv").expect("the model's output must have been persisted");
    assert_eq!(output.rows[0]["value"], serde_json::json!(42.0));
}

/// Same pipeline, awaited from a tokio executor rather than blocked on
/// directly, for a host that cannot afford to block its own thread.
#[tokio::test]
async fn runs_a_job_end_to_end_when_awaited_from_an_async_host() {
    let written = Arc::new(Mutex::new(HashMap::new()));
    let storage = Arc::new(InMemoryStorageManager {
        files: InMemoryFileStorage,
        data: InMemoryDataStorage {
            rows: vec![HashMap::from([("value".to_string(), serde_json::json!(10.0))])],
            written: written.clone(),
        },
    });
    let repositories = Arc::new(SingleRepository {
        loader: SingleModelLoader,
    });

    let mut runtime = Runtime::new(
        RuntimeConfig {
            batch_mode: true,
            ..Default::default()
        },
        repositories,
        storage,
    );
    runtime.start();
    runtime.submit_job(sample_job());

    let exit_code = runtime.wait_for_shutdown_async().await;
    assert_eq!(exit_code, 0);

    let written = written.lock().unwrap();
    let output = written.get("scored.csv").expect("the model's output must have been persisted");
    assert_eq!(output.rows[0]["value"], serde_json::json!(20.0));
}

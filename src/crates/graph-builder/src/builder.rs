//! Lowers a [`JobConfig`] into an executable [`Graph`].
//!
//! Follows the original's per-job-kind lowering rules: data loads for
//! each declared input, a context push into the model's namespace, the
//! model invocation itself, a context pop back out, and data saves for
//! each declared output — plus terminal metadata markers feeding a single
//! job node.

use crate::error::GraphBuildError;
use graph_model::{
    DependencyType, Graph, JobConfig, Node, NodeId, NodeKind, ObjectDefinition,
};
use std::collections::HashMap;

const CTX_LABEL_SUFFIX: &str = "_ctx";

pub struct GraphBuilder;

impl GraphBuilder {
    /// Build the execution graph for one job.
    pub fn build_job(job_config: &JobConfig) -> Result<Graph, GraphBuildError> {
        let model_def = match job_config.target_object() {
            Some(ObjectDefinition::Model(m)) => m.clone(),
            Some(_) => return Err(GraphBuildError::TargetNotAModel(job_config.target.clone())),
            None => return Err(GraphBuildError::UnknownTarget(job_config.target.clone())),
        };

        let mut nodes: HashMap<NodeId, Node> = HashMap::new();
        let ctx_label = format!("{}{CTX_LABEL_SUFFIX}", job_config.target);
        let namespace = vec![ctx_label.clone()];

        // 1. Data loads for each declared input, one load -> view -> item chain.
        let mut input_items: HashMap<String, NodeId> = HashMap::new();
        for input_name in model_def.input.keys() {
            let object_id = job_config
                .inputs
                .get(input_name)
                .ok_or_else(|| GraphBuildError::UnboundInput(input_name.clone()))?;
            let data_def = match job_config.objects.get(object_id) {
                Some(ObjectDefinition::Data(d)) => d.clone(),
                _ => return Err(GraphBuildError::NotADataset(object_id.clone())),
            };
            let storage_def = job_config.storage.get(object_id).cloned().unwrap_or_default();

            let load_id = NodeId::root(format!("load_{input_name}"));
            nodes.insert(
                load_id.clone(),
                Node::with_no_dependencies(NodeKind::LoadData {
                    data_item: object_id.clone(),
                    data_def: data_def.clone(),
                    storage_def,
                }),
            );

            let view_id = NodeId::root(format!("view_{input_name}"));
            nodes.insert(
                view_id.clone(),
                Node::new(
                    NodeKind::DataView {
                        schema: data_def.schema.clone(),
                        root_item: load_id.clone(),
                    },
                    deps([(load_id.clone(), DependencyType::required())]),
                ),
            );

            let item_id = NodeId::root(format!("item_{input_name}"));
            nodes.insert(
                item_id.clone(),
                Node::new(
                    NodeKind::MapDataItem {
                        data_view_id: view_id.clone(),
                    },
                    deps([(view_id, DependencyType::required())]),
                ),
            );

            input_items.insert(input_name.clone(), item_id);
        }

        // 2. Context push: carries every input across the namespace boundary.
        let push_id = NodeId::root(format!("{}_push", job_config.target));
        let push_mapping: HashMap<NodeId, NodeId> = model_def
            .input
            .keys()
            .map(|name| (NodeId::new(name.clone(), namespace.clone()), input_items[name].clone()))
            .collect();
        nodes.insert(
            push_id.clone(),
            Node::new(
                NodeKind::ContextPush {
                    mapping: push_mapping,
                    namespace: namespace.clone(),
                },
                deps(input_items.values().cloned().map(|id| (id, DependencyType::required()))),
            ),
        );

        // 3. One bridge node per input inside the model's namespace, so the
        // model can look each one up by its namespaced id directly.
        for (input_name, item_id) in &input_items {
            let bridge_id = NodeId::new(input_name.clone(), namespace.clone());
            nodes.insert(
                bridge_id,
                Node::new(
                    NodeKind::MapIdentity { src_id: item_id.clone() },
                    deps([
                        (item_id.clone(), DependencyType::required()),
                        (push_id.clone(), DependencyType::required()),
                    ]),
                ),
            );
        }

        // 4. The model invocation itself.
        let model_id = NodeId::new(job_config.target.clone(), namespace.clone());
        let model_deps = deps(model_def.input.keys().map(|name| {
            (NodeId::new(name.clone(), namespace.clone()), DependencyType::required())
        }));
        nodes.insert(
            model_id.clone(),
            Node::new(
                NodeKind::Model {
                    model_def: model_def.clone(),
                    id: model_id.clone(),
                },
                model_deps,
            ),
        );

        // 5. Extract each declared output from the model's keyed result.
        let mut output_inner_items: HashMap<String, NodeId> = HashMap::new();
        for output_name in model_def.output.keys() {
            let inner_id = NodeId::new(format!("{output_name}_item"), namespace.clone());
            nodes.insert(
                inner_id.clone(),
                Node::new(
                    NodeKind::MapKeyedItem {
                        src_id: model_id.clone(),
                        src_item: output_name.clone(),
                    },
                    deps([(model_id.clone(), DependencyType::required())]),
                ),
            );
            output_inner_items.insert(output_name.clone(), inner_id);
        }

        // 6. Context pop: carries every output back across the boundary.
        let pop_id = NodeId::root(format!("{}_pop", job_config.target));
        let pop_mapping: HashMap<NodeId, NodeId> = output_inner_items
            .iter()
            .map(|(name, inner_id)| (inner_id.clone(), NodeId::root(format!("{name}_result"))))
            .collect();
        nodes.insert(
            pop_id.clone(),
            Node::new(
                NodeKind::ContextPop { mapping: pop_mapping },
                deps(output_inner_items.values().cloned().map(|id| (id, DependencyType::required()))),
            ),
        );

        // 7. Bridge each output back into the outer namespace.
        let mut output_results: HashMap<String, NodeId> = HashMap::new();
        for (output_name, inner_id) in &output_inner_items {
            let result_id = NodeId::root(format!("{output_name}_result"));
            nodes.insert(
                result_id.clone(),
                Node::new(
                    NodeKind::MapIdentity { src_id: inner_id.clone() },
                    deps([
                        (inner_id.clone(), DependencyType::required()),
                        (pop_id.clone(), DependencyType::required()),
                    ]),
                ),
            );
            output_results.insert(output_name.clone(), result_id);
        }

        // 8. Persist every declared output.
        let mut save_ids = Vec::new();
        for (output_name, result_id) in &output_results {
            let object_id = job_config
                .outputs
                .get(output_name)
                .ok_or_else(|| GraphBuildError::UnboundOutput(output_name.clone()))?;
            let data_def = match job_config.objects.get(object_id) {
                Some(ObjectDefinition::Data(d)) => d.clone(),
                _ => return Err(GraphBuildError::NotADataset(object_id.clone())),
            };
            let save_id = NodeId::root(format!("save_{output_name}"));
            nodes.insert(
                save_id.clone(),
                Node::new(
                    NodeKind::SaveData {
                        data_item_id: result_id.clone(),
                        data_def,
                    },
                    deps([(result_id.clone(), DependencyType::required())]),
                ),
            );
            save_ids.push(save_id);
        }

        // 9./10. Terminal metadata markers, resolved as no-ops.
        let output_metadata_id = NodeId::root("job_output_metadata");
        nodes.insert(
            output_metadata_id.clone(),
            Node::new(
                NodeKind::JobOutputMetadata,
                deps(save_ids.iter().cloned().map(|id| (id, DependencyType::required()))),
            ),
        );

        let result_metadata_id = NodeId::root("job_result_metadata");
        nodes.insert(
            result_metadata_id.clone(),
            Node::new(
                NodeKind::JobResultMetadata,
                deps(output_results.values().cloned().map(|id| (id, DependencyType::required()))),
            ),
        );

        // 11. The job's root node.
        let job_id = NodeId::root("job");
        nodes.insert(
            job_id.clone(),
            Node::new(
                NodeKind::Job,
                deps([
                    (output_metadata_id, DependencyType::required()),
                    (result_metadata_id, DependencyType::required()),
                ]),
            ),
        );

        Ok(Graph::new(nodes, job_id))
    }
}

fn deps(pairs: impl IntoIterator<Item = (NodeId, DependencyType)>) -> HashMap<NodeId, DependencyType> {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_model::{ModelDefinition, TableDefinition};
    use std::collections::HashMap as Map;

    fn sample_job() -> JobConfig {
        let mut model_inputs = Map::new();
        model_inputs.insert("customers".to_string(), TableDefinition { fields: vec![] });
        let mut model_outputs = Map::new();
        model_outputs.insert("scored".to_string(), TableDefinition { fields: vec![] });

        let model_def = ModelDefinition {
            repository: "example_repo".to_string(),
            entry_point: "models.scoring.ScoreModel".to_string(),
            parameters: Map::new(),
            input: model_inputs,
            output: model_outputs,
        };

        let mut objects = Map::new();
        objects.insert("model_1".to_string(), ObjectDefinition::Model(model_def));
        objects.insert(
            "customers_data".to_string(),
            ObjectDefinition::Data(graph_model::DataDefinition {
                schema: TableDefinition { fields: vec![] },
            }),
        );
        objects.insert(
            "scored_data".to_string(),
            ObjectDefinition::Data(graph_model::DataDefinition {
                schema: TableDefinition { fields: vec![] },
            }),
        );

        let mut inputs = Map::new();
        inputs.insert("customers".to_string(), "customers_data".to_string());
        let mut outputs = Map::new();
        outputs.insert("scored".to_string(), "scored_data".to_string());

        JobConfig {
            job_id: "job-1".to_string(),
            target: "model_1".to_string(),
            parameters: Map::new(),
            inputs,
            outputs,
            objects,
            storage: Map::new(),
        }
    }

    #[test]
    fn builds_a_graph_rooted_at_job_node() {
        let graph = GraphBuilder::build_job(&sample_job()).expect("graph builds");
        assert_eq!(graph.root_id, NodeId::root("job"));
        assert!(graph.nodes.contains_key(&NodeId::root("load_customers")));
        assert!(graph.nodes.contains_key(&NodeId::root("save_scored")));
        assert!(graph.nodes.contains_key(&NodeId::root("job_output_metadata")));
        assert!(graph.nodes.contains_key(&NodeId::root("job_result_metadata")));
    }

    #[test]
    fn unbound_input_is_rejected() {
        let mut job = sample_job();
        job.inputs.clear();
        let err = GraphBuilder::build_job(&job).unwrap_err();
        assert!(matches!(err, GraphBuildError::UnboundInput(_)));
    }

    #[test]
    fn non_model_target_is_rejected() {
        let mut job = sample_job();
        job.target = "customers_data".to_string();
        let err = GraphBuilder::build_job(&job).unwrap_err();
        assert!(matches!(err, GraphBuildError::TargetNotAModel(_)));
    }
}

//! Node identifiers.

use std::fmt;

/// Identifies a single node within a job's execution graph.
///
/// `namespace` is the ordered stack of context labels the node lives
/// under (the outermost job context is the empty stack); pushing and
/// popping a context is exactly what [`crate::Node::ContextPush`] and
/// [`crate::Node::ContextPop`] do to the namespace of the ids they touch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NodeId {
    pub name: String,
    pub namespace: Vec<String>,
}

impl NodeId {
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        NodeId {
            name: name.into(),
            namespace,
        }
    }

    /// A node id in the root (outermost) namespace.
    pub fn root(name: impl Into<String>) -> Self {
        NodeId::new(name, Vec::new())
    }

    /// A new id for the same name one namespace level deeper.
    pub fn nested(&self, ctx_label: impl Into<String>) -> Self {
        let mut namespace = self.namespace.clone();
        namespace.push(ctx_label.into());
        NodeId::new(self.name.clone(), namespace)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace.join("/"), self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_id_has_empty_namespace() {
        let id = NodeId::root("load_customer_data");
        assert!(id.namespace.is_empty());
        assert_eq!(id.to_string(), "load_customer_data");
    }

    #[test]
    fn nested_id_extends_namespace() {
        let outer = NodeId::root("model_x");
        let inner = outer.nested("model_x_ctx");
        assert_eq!(inner.namespace, vec!["model_x_ctx".to_string()]);
        assert_eq!(inner.to_string(), "model_x_ctx/model_x");
    }

    #[test]
    fn ids_with_same_name_but_different_namespace_are_distinct() {
        use std::collections::HashSet;
        let a = NodeId::root("x");
        let b = a.nested("ctx1");
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nested_always_adds_exactly_one_namespace_level(
            name in "[a-z][a-z0-9_]{0,15}",
            label in "[a-z][a-z0-9_]{0,15}",
            depth in 0usize..8,
        ) {
            let mut id = NodeId::root(name);
            for _ in 0..depth {
                id = id.nested(label.clone());
            }
            prop_assert_eq!(id.namespace.len(), depth);
            let nested = id.nested(label.clone());
            prop_assert_eq!(nested.namespace.len(), id.namespace.len() + 1);
            prop_assert_eq!(nested.name, id.name);
        }

        #[test]
        fn display_round_trips_through_slash_join(
            name in "[a-z][a-z0-9_]{0,15}",
            namespace in proptest::collection::vec("[a-z][a-z0-9_]{0,15}", 0..5),
        ) {
            let id = NodeId::new(name.clone(), namespace.clone());
            let shown = id.to_string();
            if namespace.is_empty() {
                prop_assert_eq!(shown, name);
            } else {
                prop_assert_eq!(shown, format!("{}/{}", namespace.join("/"), name));
            }
        }
    }
}

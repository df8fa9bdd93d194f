//! Path-shaped actor identifiers.
//!
//! An [`ActorId`] is a `/`-delimited string, `/a/b-N/c-M`, rooted at `/`.
//! A child's id is derived from its parent and its class name; ids are
//! assigned once at spawn time and never change.

use std::fmt;

/// Delimiter and root id for the supervision tree.
pub const ROOT: &str = "/";

/// Sentinel sender label that is allowed to stop any actor.
pub const SYSTEM_SENDER: &str = "/system";

/// Sentinel sender label for messages injected from outside the actor tree.
pub const EXTERNAL_SENDER: &str = "/external";

/// A unique, path-shaped identifier for an actor.
///
/// Ids are unique for the lifetime of the owning [`crate::ActorSystem`].
/// The parent id is always recoverable by string surgery: the prefix up
/// to (not including) the last `/`, or the root if that was the first one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(String);

impl ActorId {
    /// The id of the tree root, which owns no behavior.
    pub fn root() -> Self {
        ActorId(ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the id of this actor's direct parent.
    ///
    /// Returns the root id if this actor is a direct child of the root.
    pub fn parent_id(&self) -> ActorId {
        if self.is_root() {
            return self.clone();
        }
        match self.0.rfind('/') {
            Some(0) => ActorId::root(),
            Some(idx) => ActorId(self.0[..idx].to_string()),
            None => ActorId::root(),
        }
    }

    /// Build the id for a new child of `self` with the given class name
    /// and per-parent child sequence number.
    ///
    /// Direct children of the root are named `/classname` with no
    /// numeric suffix; all other children are `parent/classname-seq`.
    /// This asymmetry is carried over from the reference implementation.
    pub(crate) fn child_id(&self, class_name: &str, seq: u64) -> ActorId {
        if self.is_root() {
            ActorId(format!("{ROOT}{class_name}"))
        } else {
            ActorId(format!("{}/{}-{}", self.0, class_name, seq))
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        ActorId(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent_surgery_needed() {
        let root = ActorId::root();
        assert!(root.is_root());
        assert_eq!(root.parent_id(), root);
    }

    #[test]
    fn direct_child_of_root_has_no_suffix() {
        let root = ActorId::root();
        let child = root.child_id("jobprocessor", 0);
        assert_eq!(child.as_str(), "/jobprocessor");
        assert_eq!(child.parent_id(), root);
    }

    #[test]
    fn nested_child_gets_sequence_suffix() {
        let root = ActorId::root();
        let job = root.child_id("jobprocessor", 0);
        let graph = job.child_id("graphprocessor", 0);
        let node = graph.child_id("nodeprocessor", 3);
        assert_eq!(node.as_str(), "/jobprocessor/graphprocessor/nodeprocessor-3");
        assert_eq!(node.parent_id(), graph);
        assert_eq!(graph.parent_id(), job);
    }
}

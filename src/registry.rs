//! Deduplication of class trees across root messages.
//!
//! Every message type reachable from the requested roots is emitted once.
//! The registry folds each built tree into a map keyed by type name and
//! checks that repeated occurrences of a type agree structurally.

use std::collections::{BTreeMap, BTreeSet};

use crate::class_tree::ClassNode;
use crate::error::{Error, Result};

/// Unique class nodes collected over one generation run.
#[derive(Debug, Default)]
pub struct Registry {
    excluded: BTreeSet<String>,
    nodes: BTreeMap<String, ClassNode>,
    excluded_hits: usize,
}

impl Registry {
    /// Create a registry that skips the given type names.
    pub fn new(excluded: BTreeSet<String>) -> Self {
        Self {
            excluded,
            ..Self::default()
        }
    }

    /// Fold `node` and every nested node reachable from it.
    ///
    /// Excluded types are skipped along with everything below them. A type
    /// seen before must match the stored node, otherwise the fold fails with
    /// [`Error::InconsistentSchema`]. The whole tree is checked before
    /// anything is registered, so a failed fold leaves the registry as it was.
    pub fn fold(&mut self, node: &ClassNode) -> Result<()> {
        let mut pending = BTreeMap::new();
        let mut excluded_hits = 0;
        self.collect(node, &mut pending, &mut excluded_hits)?;

        for (type_name, node) in pending {
            tracing::debug!(type_name, "registering type");
            self.nodes.insert(type_name.to_string(), node.clone());
        }
        self.excluded_hits += excluded_hits;
        Ok(())
    }

    fn collect<'n>(
        &self,
        node: &'n ClassNode,
        pending: &mut BTreeMap<&'n str, &'n ClassNode>,
        excluded_hits: &mut usize,
    ) -> Result<()> {
        if self.excluded.contains(&node.type_name) {
            tracing::debug!(type_name = %node.type_name, "skipping excluded type");
            *excluded_hits += 1;
            return Ok(());
        }

        let known = self
            .nodes
            .get(&node.type_name)
            .or_else(|| pending.get(node.type_name.as_str()).copied());
        match known {
            Some(existing) => {
                if let Some(detail) = existing.structural_mismatch(node) {
                    return Err(Error::InconsistentSchema {
                        type_name: node.type_name.clone(),
                        detail,
                    });
                }
            }
            None => {
                pending.insert(&node.type_name, node);
            }
        }

        for child in node.children() {
            self.collect(child, pending, excluded_hits)?;
        }
        Ok(())
    }

    pub fn is_excluded(&self, type_name: &str) -> bool {
        self.excluded.contains(type_name)
    }

    /// Unique nodes, sorted by type name.
    pub fn nodes(&self) -> impl Iterator<Item = &ClassNode> {
        self.nodes.values()
    }

    pub fn get(&self, type_name: &str) -> Option<&ClassNode> {
        self.nodes.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// How many times folding reached an excluded type.
    pub fn excluded_hits(&self) -> usize {
        self.excluded_hits
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::class_tree::{FieldEntry, ListShape};
    use crate::type_map::PrimitiveKind;

    fn primitive(kind: PrimitiveKind, default: serde_json::Value) -> FieldEntry {
        FieldEntry::Primitive {
            kind,
            default,
            shape: ListShape::Scalar,
        }
    }

    fn point() -> ClassNode {
        let mut node = ClassNode::new("geometry_msgs/Point");
        node.fields
            .insert("x".into(), primitive(PrimitiveKind::Float64, json!(0.0)));
        node
    }

    fn holder(type_name: &str, shape: ListShape) -> ClassNode {
        let mut node = ClassNode::new(type_name);
        node.fields.insert(
            "point".into(),
            FieldEntry::Composite {
                node: point(),
                shape,
            },
        );
        node
    }

    #[test]
    fn shared_nested_type_is_registered_once() {
        let mut registry = Registry::default();
        registry
            .fold(&holder("test_msgs/A", ListShape::Scalar))
            .unwrap();
        registry
            .fold(&holder("test_msgs/B", ListShape::VariableList))
            .unwrap();

        let names: Vec<&str> = registry.nodes().map(|n| n.type_name.as_str()).collect();
        assert_eq!(names, ["geometry_msgs/Point", "test_msgs/A", "test_msgs/B"]);
    }

    #[test]
    fn folding_the_same_root_twice_is_harmless() {
        let mut registry = Registry::default();
        let root = holder("test_msgs/A", ListShape::Scalar);
        registry.fold(&root).unwrap();
        registry.fold(&root).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn differing_field_sets_are_inconsistent() {
        let mut registry = Registry::default();
        registry.fold(&point()).unwrap();

        let mut other = point();
        other
            .fields
            .insert("y".into(), primitive(PrimitiveKind::Float64, json!(0.0)));

        let err = registry.fold(&other).unwrap_err();
        let Error::InconsistentSchema { type_name, detail } = err else {
            panic!("expected an inconsistent schema error");
        };
        assert_eq!(type_name, "geometry_msgs/Point");
        assert!(detail.contains("'y'"));
    }

    #[test]
    fn inconsistency_in_a_nested_type_is_detected() {
        let mut registry = Registry::default();
        registry
            .fold(&holder("test_msgs/A", ListShape::Scalar))
            .unwrap();

        let mut changed = point();
        changed
            .fields
            .insert("x".into(), primitive(PrimitiveKind::Float32, json!(0.0)));
        let mut b = ClassNode::new("test_msgs/B");
        b.fields.insert(
            "point".into(),
            FieldEntry::Composite {
                node: changed,
                shape: ListShape::Scalar,
            },
        );

        let err = registry.fold(&b).unwrap_err();
        assert!(err.to_string().contains("geometry_msgs/Point"));
    }

    #[test]
    fn failed_fold_registers_nothing() {
        let mut registry = Registry::default();
        registry.fold(&point()).unwrap();

        let mut changed = point();
        changed
            .fields
            .insert("x".into(), primitive(PrimitiveKind::Float32, json!(0.0)));
        let mut b = ClassNode::new("test_msgs/B");
        b.fields.insert(
            "point".into(),
            FieldEntry::Composite {
                node: changed,
                shape: ListShape::Scalar,
            },
        );

        registry.fold(&b).unwrap_err();

        let names: Vec<&str> = registry.nodes().map(|n| n.type_name.as_str()).collect();
        assert_eq!(names, ["geometry_msgs/Point"]);
    }

    #[test]
    fn conflicting_occurrences_within_one_tree_are_detected() {
        let mut other = point();
        other
            .fields
            .insert("y".into(), primitive(PrimitiveKind::Float64, json!(0.0)));
        let mut pair = ClassNode::new("test_msgs/Pair");
        for (name, node) in [("first", point()), ("second", other)] {
            pair.fields.insert(
                name.into(),
                FieldEntry::Composite {
                    node,
                    shape: ListShape::Scalar,
                },
            );
        }

        let mut registry = Registry::default();
        let err = registry.fold(&pair).unwrap_err();
        assert!(matches!(err, Error::InconsistentSchema { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn excluded_root_is_skipped_with_its_children() {
        let mut registry = Registry::new(BTreeSet::from(["test_msgs/A".to_string()]));
        registry
            .fold(&holder("test_msgs/A", ListShape::Scalar))
            .unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.excluded_hits(), 1);
    }

    #[test]
    fn excluded_nested_type_is_not_registered() {
        let mut registry = Registry::new(BTreeSet::from(["geometry_msgs/Point".to_string()]));
        registry
            .fold(&holder("test_msgs/A", ListShape::Scalar))
            .unwrap();

        assert!(registry.get("test_msgs/A").is_some());
        assert!(registry.get("geometry_msgs/Point").is_none());
        assert!(registry.is_excluded("geometry_msgs/Point"));
    }
}

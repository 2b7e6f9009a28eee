//! Normalized class trees built from message descriptors.
//!
//! A [`ClassNode`] is one message type ready for emission: its fields in
//! declaration order, each either a primitive with a default value or a
//! nested [`ClassNode`], plus its constants. Nested message types are
//! resolved through a [`ResolverCache`], so each type name is looked up at
//! most once per run.
//!
//! `time` and `duration` never reach the resolver. They are synthesized as
//! two-field composites (`secs`, `nsecs`) named [`TIME_TYPE_NAME`] and
//! [`DURATION_TYPE_NAME`].

use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::error::{Error, Result};
use crate::resolver::ResolverCache;
use crate::schema::{Literal, MessageDescriptor};
use crate::type_map::{PrimitiveKind, split_type_name};

/// Type name of the synthesized `time` composite.
pub const TIME_TYPE_NAME: &str = "rostime/Time";

/// Type name of the synthesized `duration` composite.
pub const DURATION_TYPE_NAME: &str = "rostime/Duration";

/// How a field holds its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListShape {
    /// A single value.
    Scalar,
    /// Exactly `N` values, `N > 0`.
    FixedList(usize),
    /// Any number of values.
    VariableList,
}

impl fmt::Display for ListShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            Self::FixedList(n) => write!(f, "[{n}]"),
            Self::VariableList => f.write_str("[]"),
        }
    }
}

/// Split a type tag into its base type name and list shape.
///
/// - `"int32"` → `("int32", Scalar)`
/// - `"string[]"` → `("string", VariableList)`
/// - `"geometry_msgs/Point[3]"` → `("geometry_msgs/Point", FixedList(3))`
pub fn parse_type_tag(tag: &str) -> Result<(&str, ListShape)> {
    let invalid = |reason: &str| Error::InvalidTypeTag {
        tag: tag.to_string(),
        reason: reason.to_string(),
    };

    let Some(without_close) = tag.strip_suffix(']') else {
        if tag.is_empty() {
            return Err(invalid("empty type"));
        }
        return Ok((tag, ListShape::Scalar));
    };
    let Some(open) = without_close.rfind('[') else {
        return Err(invalid("unbalanced ']'"));
    };

    let base = &without_close[..open];
    let size = &without_close[open + 1..];
    if base.is_empty() {
        return Err(invalid("missing base type"));
    }
    if size.is_empty() {
        return Ok((base, ListShape::VariableList));
    }
    match size.parse::<usize>() {
        Ok(0) => Err(invalid("fixed array size must be positive")),
        Ok(n) => Ok((base, ListShape::FixedList(n))),
        Err(_) => Err(invalid("array size is not a number")),
    }
}

/// One field of a [`ClassNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEntry {
    /// A primitive value (or list of them) with its current value as default.
    Primitive {
        kind: PrimitiveKind,
        default: serde_json::Value,
        shape: ListShape,
    },
    /// A nested message type used at this field with the given shape.
    Composite { node: ClassNode, shape: ListShape },
}

impl FieldEntry {
    pub fn shape(&self) -> ListShape {
        match self {
            Self::Primitive { shape, .. } | Self::Composite { shape, .. } => *shape,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Primitive { kind, shape, .. } => format!("{} {shape}", kind.name()),
            Self::Composite { node, shape } => format!("{} {shape}", node.type_name),
        }
    }
}

/// A message type as a generation unit.
///
/// The shape a type is used with lives on the referencing
/// [`FieldEntry::Composite`], so one node serves every use site.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    /// `<namespace>/<name>`.
    pub type_name: String,
    /// Fields in declaration order.
    pub fields: IndexMap<String, FieldEntry>,
    /// Constants in declaration order.
    pub constants: IndexMap<String, Literal>,
}

impl ClassNode {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            constants: IndexMap::new(),
        }
    }

    /// The fixed `secs`/`nsecs` composite standing in for a temporal kind.
    pub fn temporal(kind: PrimitiveKind) -> Self {
        let type_name = match kind {
            PrimitiveKind::Duration => DURATION_TYPE_NAME,
            _ => TIME_TYPE_NAME,
        };
        let mut node = Self::new(type_name);
        for name in ["secs", "nsecs"] {
            node.fields.insert(
                name.to_string(),
                FieldEntry::Primitive {
                    kind: PrimitiveKind::Int32,
                    default: serde_json::json!(0),
                    shape: ListShape::Scalar,
                },
            );
        }
        node
    }

    /// Nested nodes referenced directly by this node's fields.
    pub fn children(&self) -> impl Iterator<Item = &ClassNode> {
        self.fields.values().filter_map(|entry| match entry {
            FieldEntry::Composite { node, .. } => Some(node),
            FieldEntry::Primitive { .. } => None,
        })
    }

    /// Describe the first structural difference from `other`, if any.
    ///
    /// Field order and constants are ignored. Fields must agree on name,
    /// entry kind, shape, primitive kind and default, and nested type name
    /// and structure.
    pub fn structural_mismatch(&self, other: &ClassNode) -> Option<String> {
        if let Some(name) = self.fields.keys().find(|n| !other.fields.contains_key(*n)) {
            return Some(format!("field '{name}' is missing from one occurrence"));
        }
        if let Some(name) = other.fields.keys().find(|n| !self.fields.contains_key(*n)) {
            return Some(format!("field '{name}' is missing from one occurrence"));
        }

        for (name, ours) in &self.fields {
            let Some(theirs) = other.fields.get(name) else {
                continue;
            };
            if let Some(detail) = entry_mismatch(ours, theirs) {
                return Some(format!("field '{name}': {detail}"));
            }
        }
        None
    }
}

fn entry_mismatch(a: &FieldEntry, b: &FieldEntry) -> Option<String> {
    if a.shape() != b.shape() {
        return Some(format!("{} vs {}", a.describe(), b.describe()));
    }
    match (a, b) {
        (
            FieldEntry::Primitive {
                kind: ka,
                default: da,
                ..
            },
            FieldEntry::Primitive {
                kind: kb,
                default: db,
                ..
            },
        ) => {
            if ka != kb {
                Some(format!("{} vs {}", a.describe(), b.describe()))
            } else if da != db {
                Some(format!("default {da} vs {db}"))
            } else {
                None
            }
        }
        (FieldEntry::Composite { node: na, .. }, FieldEntry::Composite { node: nb, .. }) => {
            if na.type_name != nb.type_name {
                return Some(format!("{} vs {}", a.describe(), b.describe()));
            }
            na.structural_mismatch(nb)
                .map(|detail| format!("in '{}': {detail}", na.type_name))
        }
        _ => Some(format!("{} vs {}", a.describe(), b.describe())),
    }
}

/// Builds [`ClassNode`] trees, resolving nested types through a cache.
pub struct ClassTreeBuilder<'c, 'r> {
    cache: &'c mut ResolverCache<'r>,
    /// Types currently being built, outermost first.
    chain: Vec<String>,
}

impl<'c, 'r> ClassTreeBuilder<'c, 'r> {
    pub fn new(cache: &'c mut ResolverCache<'r>) -> Self {
        Self {
            cache,
            chain: Vec::new(),
        }
    }

    /// Resolve `type_name` and build its full class tree.
    pub fn build_type(&mut self, type_name: &str) -> Result<ClassNode> {
        if split_type_name(type_name).is_none() {
            return Err(Error::UnresolvableType {
                type_name: type_name.to_string(),
                reason: "expected <namespace>/<name>".to_string(),
            });
        }
        if self.chain.iter().any(|t| t == type_name) {
            let mut chain = self.chain.clone();
            chain.push(type_name.to_string());
            return Err(Error::SchemaCycle {
                type_name: type_name.to_string(),
                chain: chain.join(" -> "),
            });
        }

        let descriptor = self.cache.resolve(type_name)?;
        self.chain.push(type_name.to_string());
        let node = self.build(&descriptor);
        self.chain.pop();
        node
    }

    /// Build a class tree from an already-resolved descriptor.
    pub fn build(&mut self, descriptor: &MessageDescriptor) -> Result<ClassNode> {
        let mut node = ClassNode::new(descriptor.type_name.clone());

        for field in &descriptor.fields {
            let (base, shape) = parse_type_tag(&field.type_tag)?;

            let entry = match PrimitiveKind::from_name(base) {
                Some(kind) if kind.is_temporal() => FieldEntry::Composite {
                    node: ClassNode::temporal(kind),
                    shape,
                },
                Some(kind) => FieldEntry::Primitive {
                    kind,
                    default: field.value.clone(),
                    shape,
                },
                None => FieldEntry::Composite {
                    node: self.build_type(base)?,
                    shape,
                },
            };

            match node.fields.entry(field.name.clone()) {
                Entry::Occupied(_) => {
                    return Err(Error::Schema(format!(
                        "'{}' declares field '{}' twice",
                        descriptor.type_name, field.name
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }

        for constant in &descriptor.constants {
            if node
                .constants
                .insert(constant.name.clone(), constant.value.clone())
                .is_some()
            {
                return Err(Error::Schema(format!(
                    "'{}' declares constant '{}' twice",
                    descriptor.type_name, constant.name
                )));
            }
        }

        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::resolver::DescriptorResolver;
    use crate::schema::DescriptorBundle;

    fn bundle(descriptors: Vec<MessageDescriptor>) -> DescriptorBundle {
        let mut bundle = DescriptorBundle::default();
        for descriptor in descriptors {
            bundle.insert(descriptor);
        }
        bundle
    }

    fn build(resolver: &dyn DescriptorResolver, type_name: &str) -> Result<ClassNode> {
        let mut cache = ResolverCache::new(resolver);
        ClassTreeBuilder::new(&mut cache).build_type(type_name)
    }

    #[test_case("int32", "int32", ListShape::Scalar)]
    #[test_case("string[]", "string", ListShape::VariableList)]
    #[test_case("int32[3]", "int32", ListShape::FixedList(3))]
    #[test_case("geometry_msgs/Point[12]", "geometry_msgs/Point", ListShape::FixedList(12))]
    #[test_case("geometry_msgs/Point[]", "geometry_msgs/Point", ListShape::VariableList)]
    fn type_tag_shapes(tag: &str, base: &str, shape: ListShape) {
        assert_eq!(parse_type_tag(tag).unwrap(), (base, shape));
    }

    #[test_case("int32[0]")]
    #[test_case("int32[x]")]
    #[test_case("int32]")]
    #[test_case("[3]")]
    #[test_case("")]
    fn invalid_type_tags(tag: &str) {
        assert!(matches!(
            parse_type_tag(tag),
            Err(Error::InvalidTypeTag { .. })
        ));
    }

    #[test]
    fn builds_primitives_lists_and_nested_types() {
        let resolver = bundle(vec![
            MessageDescriptor::new("test_msgs/A")
                .field("x", "int32", json!(0))
                .field("ys", "string[]", json!([]))
                .field("b", "test_msgs/B", json!(null))
                .constant("LIMIT", Literal::Int(5)),
            MessageDescriptor::new("test_msgs/B").field("v", "float64", json!(0.0)),
        ]);

        let node = build(&resolver, "test_msgs/A").unwrap();

        assert_eq!(node.type_name, "test_msgs/A");
        let names: Vec<&str> = node.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["x", "ys", "b"]);
        assert_eq!(
            node.fields["x"],
            FieldEntry::Primitive {
                kind: PrimitiveKind::Int32,
                default: json!(0),
                shape: ListShape::Scalar,
            }
        );
        assert_eq!(node.fields["ys"].shape(), ListShape::VariableList);

        let FieldEntry::Composite { node: b, shape } = &node.fields["b"] else {
            panic!("b should be a composite");
        };
        assert_eq!(*shape, ListShape::Scalar);
        assert_eq!(b.type_name, "test_msgs/B");
        assert!(b.fields.contains_key("v"));

        assert_eq!(node.constants["LIMIT"], Literal::Int(5));
    }

    #[test]
    fn fixed_list_of_composites_keeps_its_size() {
        let resolver = bundle(vec![
            MessageDescriptor::new("test_msgs/C").field("items", "test_msgs/D[2]", json!(null)),
            MessageDescriptor::new("test_msgs/D").field("n", "int32", json!(0)),
        ]);

        let node = build(&resolver, "test_msgs/C").unwrap();

        let FieldEntry::Composite { node: d, shape } = &node.fields["items"] else {
            panic!("items should be a composite");
        };
        assert_eq!(*shape, ListShape::FixedList(2));
        assert_eq!(d.type_name, "test_msgs/D");
    }

    #[test]
    fn temporal_kinds_are_synthesized_without_resolver() {
        // The bundle claims a very different "time"; it must never be consulted.
        let resolver = bundle(vec![
            MessageDescriptor::new("test_msgs/Stamped")
                .field("stamp", "time", json!(null))
                .field("timeouts", "duration[]", json!([])),
            MessageDescriptor::new(TIME_TYPE_NAME).field("bogus", "string", json!("")),
        ]);

        let node = build(&resolver, "test_msgs/Stamped").unwrap();

        let FieldEntry::Composite { node: stamp, shape } = &node.fields["stamp"] else {
            panic!("stamp should be a composite");
        };
        assert_eq!(*shape, ListShape::Scalar);
        assert_eq!(*stamp, ClassNode::temporal(PrimitiveKind::Time));
        let names: Vec<&str> = stamp.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["secs", "nsecs"]);

        let FieldEntry::Composite { node: timeout, shape } = &node.fields["timeouts"] else {
            panic!("timeouts should be a composite");
        };
        assert_eq!(*shape, ListShape::VariableList);
        assert_eq!(timeout.type_name, DURATION_TYPE_NAME);
        assert!(timeout.fields.values().all(|f| f.shape() == ListShape::Scalar));
    }

    #[test]
    fn unknown_nested_type_is_unresolvable() {
        let resolver = bundle(vec![
            MessageDescriptor::new("test_msgs/A").field("m", "test_msgs/Missing", json!(null)),
        ]);

        let err = build(&resolver, "test_msgs/A").unwrap_err();
        assert!(matches!(err, Error::UnresolvableType { ref type_name, .. } if type_name == "test_msgs/Missing"));
    }

    #[test]
    fn unqualified_type_is_unresolvable() {
        let resolver = bundle(vec![
            MessageDescriptor::new("test_msgs/A").field("h", "Header", json!(null)),
        ]);

        let err = build(&resolver, "test_msgs/A").unwrap_err();
        assert!(err.to_string().contains("<namespace>/<name>"));
    }

    #[test]
    fn cycles_are_reported_with_their_chain() {
        let resolver = bundle(vec![
            MessageDescriptor::new("test_msgs/A").field("b", "test_msgs/B[]", json!([])),
            MessageDescriptor::new("test_msgs/B").field("a", "test_msgs/A", json!(null)),
        ]);

        let err = build(&resolver, "test_msgs/A").unwrap_err();
        let Error::SchemaCycle { type_name, chain } = err else {
            panic!("expected a schema cycle, got {err}");
        };
        assert_eq!(type_name, "test_msgs/A");
        assert_eq!(chain, "test_msgs/A -> test_msgs/B -> test_msgs/A");
    }

    #[test]
    fn repeated_sibling_types_are_not_cycles() {
        let resolver = bundle(vec![
            MessageDescriptor::new("geometry_msgs/Pose")
                .field("position", "geometry_msgs/Point", json!(null))
                .field("target", "geometry_msgs/Point", json!(null)),
            MessageDescriptor::new("geometry_msgs/Point").field("x", "float64", json!(0.0)),
        ]);

        let node = build(&resolver, "geometry_msgs/Pose").unwrap();
        assert_eq!(node.children().count(), 2);
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let resolver = bundle(vec![
            MessageDescriptor::new("test_msgs/A")
                .field("x", "int32", json!(0))
                .field("x", "int64", json!(0)),
        ]);

        let err = build(&resolver, "test_msgs/A").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn structural_mismatch_ignores_field_order() {
        let mut a = ClassNode::new("test_msgs/A");
        let mut b = ClassNode::new("test_msgs/A");
        let int = |v: i64| FieldEntry::Primitive {
            kind: PrimitiveKind::Int32,
            default: json!(v),
            shape: ListShape::Scalar,
        };
        a.fields.insert("x".into(), int(0));
        a.fields.insert("y".into(), int(0));
        b.fields.insert("y".into(), int(0));
        b.fields.insert("x".into(), int(0));

        assert_eq!(a.structural_mismatch(&b), None);

        b.fields.insert("x".into(), int(1));
        let detail = a.structural_mismatch(&b).unwrap();
        assert!(detail.contains("field 'x'"));
        assert!(detail.contains("default"));
    }

    #[test]
    fn structural_mismatch_detects_nested_differences() {
        let mut inner_a = ClassNode::new("test_msgs/Inner");
        inner_a.fields.insert(
            "v".into(),
            FieldEntry::Primitive {
                kind: PrimitiveKind::Float64,
                default: json!(0.0),
                shape: ListShape::Scalar,
            },
        );
        let mut inner_b = inner_a.clone();
        inner_b.fields.insert(
            "v".into(),
            FieldEntry::Primitive {
                kind: PrimitiveKind::Float32,
                default: json!(0.0),
                shape: ListShape::Scalar,
            },
        );

        let mut a = ClassNode::new("test_msgs/Outer");
        a.fields.insert(
            "inner".into(),
            FieldEntry::Composite {
                node: inner_a,
                shape: ListShape::Scalar,
            },
        );
        let mut b = ClassNode::new("test_msgs/Outer");
        b.fields.insert(
            "inner".into(),
            FieldEntry::Composite {
                node: inner_b,
                shape: ListShape::Scalar,
            },
        );

        let detail = a.structural_mismatch(&b).unwrap();
        assert!(detail.contains("in 'test_msgs/Inner'"));
        assert!(detail.contains("float64"));
    }
}

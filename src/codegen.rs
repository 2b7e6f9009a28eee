//! Java class generation from class trees.
//!
//! Each unique, non-excluded message type becomes one `.java` file holding:
//! - a `_type` literal identifying the ROS type at runtime
//! - no-argument, full-argument and `JsonObject` constructors
//! - a getter/setter pair per field
//! - `toJSON()` and `toString()` backed by the base class's Gson instance
//!
//! Generation is deterministic: identical class trees and naming context
//! always produce byte-identical files, and files come out sorted by type
//! name.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::class_tree::{ClassNode, ClassTreeBuilder, FieldEntry, ListShape};
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::resolver::{DescriptorResolver, ResolverCache};
use crate::schema::Literal;
use crate::type_map::{
    JavaPrimitive, PrimitiveKind, accessor_name, class_name, java_string_literal,
    package_from_path, qualify, split_type_name,
};

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// Auto generated!! Do not modify.";

const INDENT: &str = "    ";

/// Where generated classes live and how they refer to each other.
#[derive(Debug, Clone, Default)]
pub struct NamingContext {
    /// Java package holding generated namespaces, e.g. `frc.team88.ros.messages`.
    pub package_root: String,
    /// Package holding classes for excluded types, e.g. `frc.team88.ros.messages`.
    pub external_package: String,
    /// Fully qualified base class providing the static Gson instance `ginst`.
    pub base_class: String,
    /// Type names already available in the target project. Never emitted.
    pub excluded: BTreeSet<String>,
}

impl NamingContext {
    /// Derive a context from the output package path and the project's
    /// external package.
    ///
    /// `("frc/team88/ros/messages", "frc.team88.ros", ..)` places classes
    /// under `frc.team88.ros.messages`, resolves excluded types under
    /// `frc.team88.ros.messages` and extends `frc.team88.ros.RosMessage`.
    pub fn new(package_path: &str, external_package: &str, excluded: BTreeSet<String>) -> Self {
        Self {
            package_root: package_from_path(package_path),
            external_package: qualify(external_package, "messages"),
            base_class: qualify(external_package, "RosMessage"),
            excluded,
        }
    }

    /// Fully qualified Java type of a message type, honoring exclusions.
    fn message_type(&self, namespace: &str, name: &str, type_name: &str) -> String {
        let relative = format!("{namespace}.{}", class_name(namespace, name));
        if self.excluded.contains(type_name) {
            qualify(&self.external_package, &relative)
        } else {
            qualify(&self.package_root, &relative)
        }
    }
}

/// One rendered Java source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the package root: `<namespace>/<ClassName>.java`.
    pub path: PathBuf,
    /// Type name the file was generated from.
    pub type_name: String,
    pub content: String,
}

/// Statistics collected during generation for reporting.
#[derive(Debug, Default)]
pub struct GenerationStats {
    pub roots_processed: usize,
    pub descriptors_resolved: usize,
    pub classes_emitted: usize,
    pub excluded_references: usize,
    pub constants_emitted: usize,
}

/// Result of a complete generation run. Nothing has been written yet.
#[derive(Debug)]
pub struct Generation {
    pub files: Vec<GeneratedFile>,
    pub stats: GenerationStats,
}

/// Generate Java classes for the requested root messages.
///
/// Builds every root's class tree, deduplicates all reachable types and
/// renders one file per unique type. Any fatal error aborts the whole run
/// before a single file exists, so callers never see partial output.
pub fn generate(
    resolver: &dyn DescriptorResolver,
    roots: &[String],
    ctx: &NamingContext,
) -> Result<Generation> {
    let mut run = GenerationRun::new(resolver, ctx.excluded.clone());
    for root in roots {
        run.add_root(root)?;
    }
    run.finish(ctx)
}

/// Per-run state: the resolver cache and the dedup registry.
///
/// Both are scoped to the run so concurrent runs stay isolated.
pub struct GenerationRun<'r> {
    cache: ResolverCache<'r>,
    registry: Registry,
    roots_processed: usize,
}

impl<'r> GenerationRun<'r> {
    pub fn new(resolver: &'r dyn DescriptorResolver, excluded: BTreeSet<String>) -> Self {
        Self {
            cache: ResolverCache::new(resolver),
            registry: Registry::new(excluded),
            roots_processed: 0,
        }
    }

    /// Build one root message and fold it into the registry.
    pub fn add_root(&mut self, type_name: &str) -> Result<()> {
        if self.registry.is_excluded(type_name) {
            tracing::warn!(type_name, "root message is excluded and will not be generated");
        }
        tracing::info!(type_name, "building class tree");

        let node = ClassTreeBuilder::new(&mut self.cache).build_type(type_name)?;
        self.registry.fold(&node)?;
        self.roots_processed += 1;
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every registered type.
    pub fn finish(self, ctx: &NamingContext) -> Result<Generation> {
        let files = self
            .registry
            .nodes()
            .map(|node| emit(node, ctx))
            .collect::<Result<Vec<_>>>()?;

        let stats = GenerationStats {
            roots_processed: self.roots_processed,
            descriptors_resolved: self.cache.len(),
            classes_emitted: files.len(),
            excluded_references: self.registry.excluded_hits(),
            constants_emitted: self.registry.nodes().map(|n| n.constants.len()).sum(),
        };
        Ok(Generation { files, stats })
    }
}

/// Write generated files under `output_dir`, creating directories as needed.
pub fn write_files(output_dir: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = output_dir.join(&file.path);
        tracing::info!(path = %path.display(), "writing");
        write_file(&path, &file.content)?;
    }
    Ok(())
}

// ── Class emission ─────────────────────────────────────────────────────

/// Render one class node as a Java source file.
pub fn emit(node: &ClassNode, ctx: &NamingContext) -> Result<GeneratedFile> {
    let Some((namespace, name)) = split_type_name(&node.type_name) else {
        return Err(Error::MalformedFieldEntry {
            type_name: node.type_name.clone(),
            field: "_type".to_string(),
            detail: "type name is not <namespace>/<name>".to_string(),
        });
    };
    let class = class_name(namespace, name);
    let package = qualify(&ctx.package_root, namespace);

    let mut imports = BTreeSet::from([
        "com.google.gson.JsonObject",
        "com.google.gson.annotations.Expose",
    ]);

    let mut fields = Vec::with_capacity(node.fields.len());
    for (field_name, entry) in &node.fields {
        fields.push(field_code(node, field_name, entry, ctx, &mut imports)?);
    }

    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');
    out.push_str(&format!("package {package};\n\n"));
    for import in &imports {
        out.push_str(&format!("import {import};\n"));
    }
    out.push('\n');
    out.push_str(&format!(
        "public class {class} extends {} {{\n",
        ctx.base_class
    ));

    if !node.constants.is_empty() {
        for (constant, value) in &node.constants {
            out.push_str(&constant_declaration(constant, value));
        }
        out.push('\n');
    }

    for field in &fields {
        out.push_str(&field.declaration);
    }
    if !fields.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!(
        "{INDENT}@Expose(serialize = false, deserialize = false)\n\
         {INDENT}public final java.lang.String _type = {};\n",
        java_string_literal(&node.type_name)
    ));

    out.push_str(&format!("\n{INDENT}public {class}() {{\n{INDENT}}}\n"));

    if !fields.is_empty() {
        let params: Vec<&str> = fields.iter().map(|f| f.param.as_str()).collect();
        out.push_str(&format!(
            "\n{INDENT}public {class}({}) {{\n",
            params.join(", ")
        ));
        for field in &fields {
            out.push_str(&field.assignment);
        }
        out.push_str(&format!("{INDENT}}}\n"));
    }

    out.push_str(&format!(
        "\n{INDENT}public {class}(JsonObject jsonObj) {{\n"
    ));
    for field in &fields {
        out.push_str(&field.json_read);
    }
    out.push_str(&format!("{INDENT}}}\n"));

    for field in &fields {
        out.push('\n');
        out.push_str(&field.getter);
        out.push('\n');
        out.push_str(&field.setter);
    }

    out.push_str(&format!(
        "\n{INDENT}public JsonObject toJSON() {{\n\
         {INDENT}{INDENT}return ginst.toJsonTree(this).getAsJsonObject();\n\
         {INDENT}}}\n\
         \n\
         {INDENT}@Override\n\
         {INDENT}public java.lang.String toString() {{\n\
         {INDENT}{INDENT}return ginst.toJson(this);\n\
         {INDENT}}}\n"
    ));
    out.push_str("}\n");

    Ok(GeneratedFile {
        path: PathBuf::from(namespace).join(format!("{class}.java")),
        type_name: node.type_name.clone(),
        content: out,
    })
}

// ── Field emission ─────────────────────────────────────────────────────

/// Code fragments contributed by one field.
struct FieldCode {
    declaration: String,
    param: String,
    assignment: String,
    json_read: String,
    getter: String,
    setter: String,
}

/// Element type of a field: a Java primitive or a generated message class.
enum Element {
    Primitive(JavaPrimitive),
    Message(String),
}

impl Element {
    fn boxed(&self) -> &str {
        match self {
            Self::Primitive(java) => java.boxed(),
            Self::Message(java_type) => java_type,
        }
    }

    fn default_value(&self) -> String {
        match self {
            Self::Primitive(java) => java.default_literal().to_string(),
            Self::Message(java_type) => format!("new {java_type}()"),
        }
    }

    /// Expression converting the `JsonElement` expression `value`.
    fn from_json(&self, value: &str) -> String {
        match self {
            Self::Primitive(java) => java.json_accessor(value),
            Self::Message(java_type) => format!("new {java_type}({value}.getAsJsonObject())"),
        }
    }
}

fn field_code(
    node: &ClassNode,
    name: &str,
    entry: &FieldEntry,
    ctx: &NamingContext,
    imports: &mut BTreeSet<&'static str>,
) -> Result<FieldCode> {
    let malformed = |detail: String| Error::MalformedFieldEntry {
        type_name: node.type_name.clone(),
        field: name.to_string(),
        detail,
    };

    if entry.shape() == ListShape::FixedList(0) {
        return Err(malformed("fixed list of size 0".to_string()));
    }

    let element = match entry {
        FieldEntry::Primitive { kind, .. } if kind.is_temporal() => {
            return Err(malformed(format!(
                "temporal kind '{}' was not normalized",
                kind.name()
            )));
        }
        FieldEntry::Primitive { kind, .. } => Element::Primitive(kind.java()),
        FieldEntry::Composite { node: nested, .. } => {
            let Some((namespace, nested_name)) = split_type_name(&nested.type_name) else {
                return Err(malformed(format!(
                    "nested type '{}' is not <namespace>/<name>",
                    nested.type_name
                )));
            };
            Element::Message(ctx.message_type(namespace, nested_name, &nested.type_name))
        }
    };

    Ok(match (entry, entry.shape()) {
        (FieldEntry::Primitive { kind, default, .. }, ListShape::Scalar) => {
            scalar_primitive(name, *kind, default)
        }
        (FieldEntry::Composite { .. }, ListShape::Scalar) => scalar_message(name, element.boxed()),
        (_, ListShape::FixedList(size)) => fixed_array(name, &element, size, imports),
        (_, ListShape::VariableList) => array_list(name, &element, imports),
    })
}

fn accessors(java_type: &str, name: &str) -> (String, String) {
    let getter = format!(
        "{INDENT}public {java_type} {}() {{\n\
         {INDENT}{INDENT}return this.{name};\n\
         {INDENT}}}\n",
        accessor_name("get", name)
    );
    let setter = format!(
        "{INDENT}public void {}({java_type} {name}) {{\n\
         {INDENT}{INDENT}this.{name} = {name};\n\
         {INDENT}}}\n",
        accessor_name("set", name)
    );
    (getter, setter)
}

fn scalar_primitive(name: &str, kind: PrimitiveKind, default: &serde_json::Value) -> FieldCode {
    let java = kind.java();
    let java_type = java.type_name();
    let initial = primitive_literal(java, default)
        .unwrap_or_else(|| java.default_literal().to_string());
    let (getter, setter) = accessors(java_type, name);

    FieldCode {
        declaration: format!("{INDENT}private {java_type} {name} = {initial};\n"),
        param: format!("{java_type} {name}"),
        assignment: format!("{INDENT}{INDENT}this.{name} = {name};\n"),
        json_read: format!(
            "{INDENT}{INDENT}this.{name} = {};\n",
            java.json_accessor(&format!("jsonObj.get({})", java_string_literal(name)))
        ),
        getter,
        setter,
    }
}

fn scalar_message(name: &str, java_type: &str) -> FieldCode {
    let (getter, setter) = accessors(java_type, name);

    FieldCode {
        declaration: format!("{INDENT}private {java_type} {name} = new {java_type}();\n"),
        param: format!("{java_type} {name}"),
        assignment: format!("{INDENT}{INDENT}this.{name} = {name};\n"),
        json_read: format!(
            "{INDENT}{INDENT}this.{name} = new {java_type}(jsonObj.getAsJsonObject({}));\n",
            java_string_literal(name)
        ),
        getter,
        setter,
    }
}

/// `T[]` holding exactly `size` elements. The JSON constructor rejects
/// arrays of any other length.
fn fixed_array(
    name: &str,
    element: &Element,
    size: usize,
    imports: &mut BTreeSet<&'static str>,
) -> FieldCode {
    imports.insert("com.google.gson.JsonArray");

    let boxed = element.boxed();
    let array_type = format!("{boxed}[]");
    let initial = vec![element.default_value(); size].join(", ");
    let json_array = format!("{name}_array");
    let (getter, setter) = accessors(&array_type, name);

    FieldCode {
        declaration: format!(
            "{INDENT}private {array_type} {name} = new {array_type} {{{initial}}};\n"
        ),
        param: format!("{array_type} {name}"),
        assignment: format!(
            "{INDENT}{INDENT}for (int _i = 0; _i < {size}; _i++) {{\n\
             {INDENT}{INDENT}{INDENT}this.{name}[_i] = {name}[_i];\n\
             {INDENT}{INDENT}}}\n"
        ),
        json_read: format!(
            "{INDENT}{INDENT}JsonArray {json_array} = jsonObj.getAsJsonArray({key});\n\
             {INDENT}{INDENT}if ({json_array}.size() != {size}) {{\n\
             {INDENT}{INDENT}{INDENT}throw new IllegalArgumentException({message} + {json_array}.size());\n\
             {INDENT}{INDENT}}}\n\
             {INDENT}{INDENT}for (int _i = 0; _i < {size}; _i++) {{\n\
             {INDENT}{INDENT}{INDENT}this.{name}[_i] = {read};\n\
             {INDENT}{INDENT}}}\n",
            key = java_string_literal(name),
            message = java_string_literal(&format!("{name}: expected {size} elements, got ")),
            read = element.from_json(&format!("{json_array}.get(_i)")),
        ),
        getter,
        setter,
    }
}

/// `ArrayList<T>` of any length, built from a `T[]` or a JSON array.
fn array_list(name: &str, element: &Element, imports: &mut BTreeSet<&'static str>) -> FieldCode {
    imports.insert("java.util.ArrayList");
    imports.insert("java.util.Arrays");
    imports.insert("com.google.gson.JsonElement");

    let boxed = element.boxed();
    let list_type = format!("ArrayList<{boxed}>");
    let json_element = format!("{name}_element");
    let (getter, setter) = accessors(&list_type, name);

    FieldCode {
        declaration: format!("{INDENT}private {list_type} {name} = new ArrayList<>();\n"),
        param: format!("{boxed}[] {name}"),
        assignment: format!("{INDENT}{INDENT}this.{name} = new ArrayList<>(Arrays.asList({name}));\n"),
        json_read: format!(
            "{INDENT}{INDENT}for (JsonElement {json_element} : jsonObj.getAsJsonArray({key})) {{\n\
             {INDENT}{INDENT}{INDENT}this.{name}.add({read});\n\
             {INDENT}{INDENT}}}\n",
            key = java_string_literal(name),
            read = element.from_json(&json_element),
        ),
        getter,
        setter,
    }
}

// ── Literals ───────────────────────────────────────────────────────────

fn constant_declaration(name: &str, value: &Literal) -> String {
    let (java_type, literal) = match value {
        Literal::Bool(b) => ("boolean", b.to_string()),
        Literal::Int(i) => match i32::try_from(*i) {
            Ok(small) => ("int", small.to_string()),
            Err(_) => ("long", format!("{i}L")),
        },
        // Wraps like an unsigned `long` field default.
        Literal::UInt(u) => ("long", format!("{}L", *u as i64)),
        Literal::Float(f) => ("double", double_literal(*f)),
        Literal::Text(s) => ("java.lang.String", java_string_literal(s)),
    };
    format!("{INDENT}public static final {java_type} {name} = {literal};\n")
}

/// Render a descriptor value as a literal of `java`, or `None` when the
/// value is absent, zero-valued or of another type.
fn primitive_literal(java: JavaPrimitive, value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match (java, value) {
        (JavaPrimitive::Boolean, Value::Bool(b)) => Some(b.to_string()),
        (JavaPrimitive::String, Value::String(s)) => Some(java_string_literal(s)),
        (JavaPrimitive::Float, Value::Number(n)) => {
            // Values that overflow or underflow `float` are not valid literals.
            let f = n.as_f64()?;
            let narrowed = f as f32;
            if !narrowed.is_finite() || (narrowed == 0.0 && f != 0.0) {
                return None;
            }
            Some(format!("{narrowed:?}f"))
        }
        (JavaPrimitive::Double, Value::Number(n)) => n.as_f64().map(double_literal),
        (JavaPrimitive::Long, Value::Number(n)) => integer(n).map(|i| format!("{i}L")),
        (JavaPrimitive::Int, Value::Number(n)) => integer(n).map(|i| match i32::try_from(i) {
            Ok(small) => small.to_string(),
            Err(_) => format!("(int) {i}L"),
        }),
        (JavaPrimitive::Byte | JavaPrimitive::Short | JavaPrimitive::Char, Value::Number(n)) => {
            let i = integer(n)?;
            if i == 0 {
                return None;
            }
            Some(format!("({}) {i}", java.type_name()))
        }
        _ => None,
    }
}

/// Integer value of a JSON number. `uint64` values above `i64::MAX` wrap,
/// matching Java's signed `long`.
fn integer(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_u64().map(|u| u as i64))
}

fn double_literal(f: f64) -> String {
    if f.is_nan() {
        "Double.NaN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "POSITIVE" } else { "NEGATIVE" };
        format!("Double.{sign}_INFINITY")
    } else {
        format!("{f:?}")
    }
}

// ── Shared helpers ─────────────────────────────────────────────────────

/// Write content to a file, creating parent directories as needed.
fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

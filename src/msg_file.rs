//! Descriptor resolution from ROS `.msg` files on disk.
//!
//! `pkg/Name` resolves to the first `<root>/pkg/msg/Name.msg` found across
//! the configured search roots. Field values are synthesized as a
//! default-constructed message would hold them.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::class_tree::{ListShape, parse_type_tag};
use crate::error::{Error, Result};
use crate::resolver::DescriptorResolver;
use crate::schema::{Literal, MessageDescriptor};
use crate::type_map::{PrimitiveKind, split_type_name};

/// Resolves message types from `.msg` files under one or more search roots.
#[derive(Debug, Clone, Default)]
pub struct MsgFileResolver {
    roots: Vec<PathBuf>,
}

impl MsgFileResolver {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Path of the `.msg` file defining `package/name`, if any root has one.
    pub fn locate(&self, package: &str, name: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(package).join("msg").join(format!("{name}.msg")))
            .find(|path| path.is_file())
    }
}

impl DescriptorResolver for MsgFileResolver {
    fn resolve(&self, type_name: &str) -> Result<MessageDescriptor> {
        let Some((package, name)) = split_type_name(type_name) else {
            return Err(Error::UnresolvableType {
                type_name: type_name.to_string(),
                reason: "expected <namespace>/<name>".to_string(),
            });
        };
        let path = self
            .locate(package, name)
            .ok_or_else(|| Error::UnresolvableType {
                type_name: type_name.to_string(),
                reason: format!(
                    "no {package}/msg/{name}.msg under {} search root(s)",
                    self.roots.len()
                ),
            })?;

        tracing::debug!(type_name, path = %path.display(), "parsing message file");
        let content = std::fs::read_to_string(&path).map_err(|e| Error::Read {
            path: path.clone(),
            source: e,
        })?;
        parse_msg(type_name, &content, &path)
    }
}

/// Parse the text of a `.msg` file defining `type_name`.
///
/// `origin` only appears in error messages.
pub fn parse_msg(type_name: &str, content: &str, origin: &Path) -> Result<MessageDescriptor> {
    let package = split_type_name(type_name).map_or("", |(package, _)| package);
    let mut descriptor = MessageDescriptor::new(type_name);

    for (index, raw) in content.lines().enumerate() {
        let at = |detail: String| {
            Error::Schema(format!("{}:{}: {detail}", origin.display(), index + 1))
        };

        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((type_tag, rest)) = line.split_once(char::is_whitespace) else {
            return Err(at(format!("expected 'TYPE NAME', found '{line}'")));
        };
        let rest = rest.trim_start();

        // String constants keep '#' in their value.
        let is_string_constant = type_tag == "string"
            && rest.find('=').is_some_and(|eq| !rest[..eq].contains('#'));
        let declaration = if is_string_constant {
            rest
        } else {
            rest.split('#').next().unwrap_or_default().trim()
        };

        let (base, shape) = parse_type_tag(type_tag).map_err(|e| at(e.to_string()))?;
        let kind = PrimitiveKind::from_name(base);

        match declaration.split_once('=') {
            Some((name, value)) => {
                let name = valid_name(name.trim()).map_err(&at)?;
                let kind = match kind {
                    Some(kind) if !kind.is_temporal() && shape == ListShape::Scalar => kind,
                    _ => {
                        return Err(at(format!(
                            "constant '{name}' must have a scalar primitive type, not '{type_tag}'"
                        )));
                    }
                };
                let literal = constant_literal(kind, value.trim()).map_err(&at)?;
                descriptor = descriptor.constant(name, literal);
            }
            None => {
                let name = valid_name(declaration).map_err(&at)?;
                let base = match kind {
                    Some(_) => base.to_string(),
                    None if base == "Header" => "std_msgs/Header".to_string(),
                    None if !base.contains('/') => format!("{package}/{base}"),
                    None => base.to_string(),
                };
                let qualified = format!("{base}{}", tag_suffix(shape));
                descriptor = descriptor.field(name, qualified, default_value(kind, shape));
            }
        }
    }

    Ok(descriptor)
}

fn valid_name(name: &str) -> std::result::Result<&str, String> {
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(format!("invalid name '{name}'"))
    }
}

fn tag_suffix(shape: ListShape) -> String {
    match shape {
        ListShape::Scalar => String::new(),
        ListShape::VariableList => "[]".to_string(),
        ListShape::FixedList(n) => format!("[{n}]"),
    }
}

/// Value a default-constructed message holds for a field.
fn default_value(kind: Option<PrimitiveKind>, shape: ListShape) -> Value {
    let element = match kind {
        Some(PrimitiveKind::Bool) => Value::Bool(false),
        Some(PrimitiveKind::Float32 | PrimitiveKind::Float64) => serde_json::json!(0.0),
        Some(PrimitiveKind::String) => Value::String(String::new()),
        Some(kind) if kind.is_temporal() => Value::Null,
        Some(_) => serde_json::json!(0),
        None => Value::Null,
    };
    match shape {
        ListShape::Scalar => element,
        ListShape::VariableList => Value::Array(Vec::new()),
        ListShape::FixedList(n) => Value::Array(vec![element; n]),
    }
}

fn constant_literal(kind: PrimitiveKind, value: &str) -> std::result::Result<Literal, String> {
    let invalid = || format!("invalid {} constant '{value}'", kind.name());
    match kind {
        PrimitiveKind::Bool => match value {
            "True" | "true" | "1" => Ok(Literal::Bool(true)),
            "False" | "false" | "0" => Ok(Literal::Bool(false)),
            _ => Err(invalid()),
        },
        PrimitiveKind::Float32 | PrimitiveKind::Float64 => {
            value.parse().map(Literal::Float).map_err(|_| invalid())
        }
        PrimitiveKind::String => Ok(Literal::Text(value.to_string())),
        PrimitiveKind::Uint64 => match value.parse::<i64>() {
            Ok(i) => Ok(Literal::Int(i)),
            Err(_) => value.parse().map(Literal::UInt).map_err(|_| invalid()),
        },
        _ => value.parse().map(Literal::Int).map_err(|_| invalid()),
    }
}

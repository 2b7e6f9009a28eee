//! Message descriptors, the descriptor bundle format, and bundle loading.
//!
//! A descriptor is the already-resolved view of one ROS message type: its
//! ordered fields (name, type tag, current value) and its ordered constants.
//! Descriptors are produced outside this crate, typically by dumping
//! default-constructed messages from a ROS installation into a bundle:
//!
//! ```json
//! { "messages": { "geometry_msgs/Point": {
//!     "fields": [ {"name": "x", "type": "float64", "value": 0.0} ],
//!     "constants": [] } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// A constant literal attached to a message type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    /// An unsigned value above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Text(String),
}

/// One resolved message type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDescriptor {
    /// `<namespace>/<name>` type name. Filled from the bundle key when omitted.
    #[serde(rename = "type", default)]
    pub type_name: String,

    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    /// Message-level constants in declaration order.
    #[serde(default)]
    pub constants: Vec<ConstantDescriptor>,
}

/// A single field of a message descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    /// Field name as it appears on the wire and in JSON.
    pub name: String,

    /// Type tag: `<base>`, `<base>[]` or `<base>[N]`.
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Current value of the field on a default-constructed message.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// A message-level constant.
#[derive(Debug, Clone, Deserialize)]
pub struct ConstantDescriptor {
    pub name: String,
    pub value: Literal,
}

impl MessageDescriptor {
    /// Create an empty descriptor for `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Append a field.
    pub fn field(
        mut self,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            type_tag: type_tag.into(),
            value,
        });
        self
    }

    /// Append a constant.
    pub fn constant(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.constants.push(ConstantDescriptor {
            name: name.into(),
            value,
        });
        self
    }
}

/// A set of message descriptors keyed by type name.
#[derive(Debug, Default, Deserialize)]
pub struct DescriptorBundle {
    #[serde(default)]
    pub messages: BTreeMap<String, MessageDescriptor>,
}

impl DescriptorBundle {
    /// Parse a bundle from JSON text.
    ///
    /// Descriptors without a `type` take their bundle key; a `type` that
    /// disagrees with its key is rejected.
    pub fn from_json(content: &str) -> Result<Self> {
        let mut bundle: DescriptorBundle = serde_json::from_str(content)?;
        for (key, descriptor) in &mut bundle.messages {
            if descriptor.type_name.is_empty() {
                descriptor.type_name = key.clone();
            } else if descriptor.type_name != *key {
                return Err(Error::Schema(format!(
                    "descriptor keyed '{key}' declares type '{}'",
                    descriptor.type_name
                )));
            }
        }
        Ok(bundle)
    }

    /// Add a descriptor, keyed by its type name.
    pub fn insert(&mut self, descriptor: MessageDescriptor) {
        self.messages
            .insert(descriptor.type_name.clone(), descriptor);
    }
}

/// Load a descriptor bundle from disk.
pub fn load_bundle(path: &Path) -> Result<DescriptorBundle> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    DescriptorBundle::from_json(&content)
}

/// Download a descriptor bundle and save it to disk.
///
/// The response is validated as a [`DescriptorBundle`] before writing.
#[cfg(feature = "download")]
pub async fn download_bundle(url: &str, output_path: &Path) -> Result<()> {
    tracing::info!(%url, "downloading descriptor bundle");

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::Download(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::Download(format!("reading response body: {e}")))?;

    // Validate before writing.
    let bundle = DescriptorBundle::from_json(&body)
        .map_err(|e| Error::Schema(format!("downloaded bundle is not valid: {e}")))?;

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(output_path, &body).map_err(|e| Error::Write {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(
        messages = bundle.messages.len(),
        path = %output_path.display(),
        "saved descriptor bundle"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_bundle_json() -> &'static str {
        r#"{
            "messages": {
                "geometry_msgs/Point": {
                    "fields": [
                        {"name": "x", "type": "float64", "value": 0.0},
                        {"name": "y", "type": "float64", "value": 0.0},
                        {"name": "z", "type": "float64", "value": 0.0}
                    ]
                },
                "test_msgs/Mode": {
                    "type": "test_msgs/Mode",
                    "fields": [
                        {"name": "mode", "type": "uint8"},
                        {"name": "labels", "type": "string[]", "value": []}
                    ],
                    "constants": [
                        {"name": "AUTO", "value": 1},
                        {"name": "GAIN", "value": 0.5},
                        {"name": "ENABLED", "value": true},
                        {"name": "NAME", "value": "auto"}
                    ]
                }
            }
        }"#
    }

    #[test]
    fn parse_minimal_bundle() {
        let bundle = DescriptorBundle::from_json(minimal_bundle_json()).unwrap();
        assert_eq!(bundle.messages.len(), 2);

        let point = &bundle.messages["geometry_msgs/Point"];
        assert_eq!(point.type_name, "geometry_msgs/Point");
        assert_eq!(point.fields.len(), 3);
        assert_eq!(point.fields[0].name, "x");
        assert_eq!(point.fields[0].type_tag, "float64");
        assert!(point.constants.is_empty());
    }

    #[test]
    fn missing_field_value_is_null() {
        let bundle = DescriptorBundle::from_json(minimal_bundle_json()).unwrap();
        let mode = &bundle.messages["test_msgs/Mode"];
        assert!(mode.fields[0].value.is_null());
        assert_eq!(mode.fields[1].value, serde_json::json!([]));
    }

    #[test]
    fn constant_literals_keep_their_value_type() {
        let bundle = DescriptorBundle::from_json(minimal_bundle_json()).unwrap();
        let constants: Vec<&Literal> = bundle.messages["test_msgs/Mode"]
            .constants
            .iter()
            .map(|c| &c.value)
            .collect();
        assert_eq!(
            constants,
            vec![
                &Literal::Int(1),
                &Literal::Float(0.5),
                &Literal::Bool(true),
                &Literal::Text("auto".to_string()),
            ]
        );
    }

    #[test]
    fn large_unsigned_constant_stays_integral() {
        let json = r#"{"messages": {"a/B": {"constants": [
            {"name": "MAX", "value": 18446744073709551615},
            {"name": "MIN", "value": -1}
        ]}}}"#;
        let bundle = DescriptorBundle::from_json(json).unwrap();
        let constants = &bundle.messages["a/B"].constants;
        assert_eq!(constants[0].value, Literal::UInt(u64::MAX));
        assert_eq!(constants[1].value, Literal::Int(-1));
    }

    #[test]
    fn mismatched_type_and_key_is_rejected() {
        let json = r#"{"messages": {"a/B": {"type": "a/C", "fields": []}}}"#;
        let err = DescriptorBundle::from_json(json).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(err.to_string().contains("a/C"));
    }

    #[test]
    fn builder_helpers_append_in_order() {
        let descriptor = MessageDescriptor::new("a/B")
            .field("x", "int32", serde_json::json!(0))
            .field("y", "int32", serde_json::json!(0))
            .constant("LIMIT", Literal::Int(5));
        assert_eq!(descriptor.fields[1].name, "y");
        assert_eq!(descriptor.constants[0].name, "LIMIT");
    }
}

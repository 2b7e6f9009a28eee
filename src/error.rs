//! Error types for the rosmsg-java-gen crate.

use std::path::PathBuf;

/// Errors that can occur while generating Java message classes.
///
/// Every variant is fatal for the run: generated classes reference each
/// other, so partial output is never written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A descriptor bundle or `.msg` file could not be understood.
    #[error("schema error: {0}")]
    Schema(String),

    /// A base type is neither a primitive nor known to the descriptor resolver.
    #[error("unresolvable type '{type_name}': {reason}")]
    UnresolvableType { type_name: String, reason: String },

    /// Two occurrences of the same type name produced different class trees.
    #[error("inconsistent schema for '{type_name}': {detail}")]
    InconsistentSchema { type_name: String, detail: String },

    /// A class tree reached the emitter in a shape the builder never produces.
    #[error("malformed field entry '{field}' in '{type_name}': {detail}")]
    MalformedFieldEntry {
        type_name: String,
        field: String,
        detail: String,
    },

    /// A message type contains itself, directly or through other messages.
    #[error("schema cycle detected at '{type_name}' (via {chain})")]
    SchemaCycle { type_name: String, chain: String },

    /// A field type tag carries an unusable array suffix.
    #[error("invalid type tag '{tag}': {reason}")]
    InvalidTypeTag { tag: String, reason: String },

    /// The run was configured without anything to generate, or inconsistently.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to write generated Java files.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parse error with context.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Network error during descriptor bundle download.
    #[cfg(feature = "download")]
    #[error("download failed: {0}")]
    Download(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! Run configuration: source lists and root selection.
//!
//! Source lists are JSON files naming message types:
//!
//! ```json
//! { "sources": ["nav_msgs/Odometry", "sensor_msgs/Imu"] }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::Deserialize;

use crate::codegen::NamingContext;
use crate::error::{Error, Result};

/// A list of message type names loaded from JSON.
#[derive(Debug, Default, Deserialize)]
pub struct SourceList {
    #[serde(default)]
    pub sources: Vec<String>,
}

impl SourceList {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a source list from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Everything a generation run needs besides the descriptor source.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory receiving `<namespace>/<ClassName>.java` files.
    pub output_dir: PathBuf,
    /// Root message types, deduplicated in request order.
    pub roots: Vec<String>,
    pub naming: NamingContext,
}

impl RunConfig {
    /// Assemble a run from CLI-level settings.
    ///
    /// `java_root` is the source root (e.g. `src/main/java`) and
    /// `messages_path` the package path below it. When no sources are
    /// requested but exclusions are, the excluded types themselves become
    /// the roots and nothing is excluded.
    pub fn new(
        java_root: &Path,
        messages_path: &str,
        external_package: &str,
        sources: Vec<String>,
        excluded: Vec<String>,
    ) -> Result<Self> {
        let (roots, excluded) = if sources.is_empty() {
            (excluded, Vec::new())
        } else {
            (sources, excluded)
        };

        let roots: IndexSet<String> = roots.into_iter().collect();
        if roots.is_empty() {
            return Err(Error::Config(
                "no root messages given; pass --sources, --types or --exclude-sources".to_string(),
            ));
        }
        let excluded: BTreeSet<String> = excluded.into_iter().collect();

        Ok(Self {
            output_dir: java_root.join(messages_path),
            roots: roots.into_iter().collect(),
            naming: NamingContext::new(messages_path, external_package, excluded),
        })
    }
}

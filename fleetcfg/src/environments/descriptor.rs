//! Environment descriptor files.
//!
//! A descriptor is a YAML or JSON document. `portOffset`, `ip` and
//! `include` are reserved keys; every other top-level key declares a
//! component group:
//!
//! ```yaml
//! portOffset: 100
//! ip: 10.0.0.1
//! include:
//!   env: base
//!   exclude: [legacy]
//! core:
//!   ip: 10.0.0.5
//!   components: [gateway, billing, "ledger:accounting"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Descriptor file extensions, in lookup order.
pub const DESCRIPTOR_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Raw contents of one descriptor file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDescriptor {
    /// Port offset applied to every component.
    pub port_offset: Option<i64>,

    /// Default ip for groups that declare none.
    pub ip: Option<String>,

    /// Base environment this one inherits from.
    pub include: Option<IncludeDescriptor>,

    /// Component groups keyed by group name.
    #[serde(flatten)]
    pub groups: BTreeMap<String, GroupDescriptor>,
}

/// Inheritance from another environment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IncludeDescriptor {
    /// Name of the base environment.
    pub env: String,

    /// Groups of the base environment to leave out.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// One component group.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupDescriptor {
    /// Group ip.
    pub ip: Option<String>,

    /// Full member list (`name` or `name:type`).
    pub components: Option<Vec<String>>,

    /// Members appended to the inherited list.
    #[serde(default)]
    pub append_components: Vec<String>,

    /// Members removed from the inherited list.
    #[serde(default)]
    pub exclude_components: Vec<String>,
}

impl EnvironmentDescriptor {
    /// Finds the descriptor file for `name` in `dir`.
    #[must_use]
    pub fn locate(dir: &Path, name: &str) -> Option<PathBuf> {
        DESCRIPTOR_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }

    /// Loads and parses a descriptor file, choosing JSON or YAML by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&contents).map_err(|e| e.to_string())
        } else if contents.trim().is_empty() {
            Ok(Self::default())
        } else {
            serde_yaml::from_str(&contents).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

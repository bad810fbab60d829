//! Configuration schema definitions.
//!
//! This module defines the tool configuration for fleetcfg: where sources
//! and artifacts live, which environments to build by default, operator
//! overrides and custom config types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::{standard_types, ConfigType};
use crate::output::OutputFormat;
use crate::session::SessionOptions;

/// Complete configuration structure.
///
/// Every field is optional so that layers can be merged; unset fields fall
/// back to built-in defaults when the configuration is applied.
///
/// # Examples
///
/// ```
/// use fleetcfg::config::Config;
///
/// let config: Config = serde_yaml::from_str("destination: build/configs\nthreads: 4\n").unwrap();
/// assert_eq!(config.threads, Some(4));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Destination root for generated artifacts.
    pub destination: Option<PathBuf>,

    /// Subdirectory of each service directory receiving the artifacts.
    pub service_inner_dir: Option<PathBuf>,

    /// Component sources directory, relative to the source root.
    pub components_dir: Option<PathBuf>,

    /// Environment descriptors directory, relative to the source root.
    pub environments_dir: Option<PathBuf>,

    /// Environments built when none are requested.
    pub environments: Option<Vec<String>>,

    /// Worker threads used by `build`.
    pub threads: Option<usize>,

    /// Stop scheduling targets after the first failure.
    pub fail_fast: Option<bool>,

    /// Display format for reports and property listings.
    pub output_format: Option<OutputFormat>,

    /// Placeholder overrides (`component@key` or `key`).
    pub overrides: Option<BTreeMap<String, String>>,

    /// Additional config types.
    pub config_types: Option<Vec<ConfigTypeDefinition>>,
}

/// A config type declared in a configuration file.
///
/// # Examples
///
/// ```
/// use fleetcfg::config::ConfigTypeDefinition;
///
/// let nginx = ConfigTypeDefinition {
///     name: "nginx".to_string(),
///     extensions: vec![".nginx".to_string()],
///     result_file: "nginx.properties".to_string(),
/// };
/// assert_eq!(nginx.to_config_type().result_file_name(), "nginx.properties");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigTypeDefinition {
    /// Type name.
    pub name: String,

    /// Source file extensions, each with a leading dot.
    pub extensions: Vec<String>,

    /// File name of the generated artifact.
    pub result_file: String,
}

impl ConfigTypeDefinition {
    /// The corresponding config type.
    #[must_use]
    pub fn to_config_type(&self) -> ConfigType {
        ConfigType::new(&self.name, &self.extensions, &self.result_file)
    }
}

impl Config {
    /// Registered config types: the built-in ones followed by custom
    /// definitions. A custom type named like a built-in one replaces it.
    #[must_use]
    pub fn resolved_config_types(&self) -> Vec<ConfigType> {
        let mut types = standard_types();
        for definition in self.config_types.iter().flatten() {
            let custom = definition.to_config_type();
            match types.iter_mut().find(|t| t.name() == custom.name()) {
                Some(existing) => *existing = custom,
                None => types.push(custom),
            }
        }
        types
    }

    /// Session options for a source root, with defaults for unset fields.
    #[must_use]
    pub fn session_options(&self, source_root: &Path) -> SessionOptions {
        let destination = self
            .destination
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION));
        let mut options = SessionOptions::new(source_root, destination)
            .with_config_types(self.resolved_config_types());
        if let Some(dir) = &self.components_dir {
            options.components_dir.clone_from(dir);
        }
        if let Some(dir) = &self.environments_dir {
            options.environments_dir.clone_from(dir);
        }
        if let Some(inner) = &self.service_inner_dir {
            options = options.with_service_inner_dir(inner);
        }
        for (key, value) in self.overrides.iter().flatten() {
            options = options.with_override(key, value);
        }
        options
    }
}

/// Destination used when none is configured, relative to the current
/// directory.
pub const DEFAULT_DESTINATION: &str = "build/configs";

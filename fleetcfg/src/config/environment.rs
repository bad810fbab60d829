//! Environment variable handling for configuration overrides.
//!
//! This module provides support for `FLEETCFG_*` environment variables that
//! override configuration file values.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::env;

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use fleetcfg::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// Reads the `FLEETCFG_*` variables and applies them with higher
    /// precedence than file-based configs. `FLEETCFG_OVERRIDES` entries are
    /// added to the existing overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable value is invalid
    /// (e.g., non-numeric thread count, invalid boolean).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(destination) = env::var("FLEETCFG_DESTINATION") {
            config.destination = Some(destination.into());
        }

        if let Ok(inner) = env::var("FLEETCFG_SERVICE_INNER_DIR") {
            config.service_inner_dir = Some(inner.into());
        }

        if let Ok(threads) = env::var("FLEETCFG_THREADS") {
            config.threads = Some(threads.trim().parse().map_err(|_| Error::Validation {
                field: "FLEETCFG_THREADS".into(),
                message: "Must be a positive integer".into(),
            })?);
        }

        if let Ok(val) = env::var("FLEETCFG_FAIL_FAST") {
            config.fail_fast = Some(Self::parse_bool("FLEETCFG_FAIL_FAST", &val)?);
        }

        if let Ok(envs) = env::var("FLEETCFG_ENVIRONMENTS") {
            config.environments = Some(Self::parse_list(&envs));
        }

        if let Ok(format) = env::var("FLEETCFG_OUTPUT_FORMAT") {
            config.output_format = Some(format.parse().map_err(|_| Error::Validation {
                field: "FLEETCFG_OUTPUT_FORMAT".into(),
                message: format!("Unknown output format: '{format}'"),
            })?);
        }

        if let Ok(overrides) = env::var("FLEETCFG_OVERRIDES") {
            let parsed = Self::parse_overrides("FLEETCFG_OVERRIDES", &overrides)?;
            config
                .overrides
                .get_or_insert_with(Default::default)
                .extend(parsed);
        }

        Ok(())
    }

    /// Parse a boolean value from a string.
    ///
    /// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
    fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!(
                    "Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }

    fn parse_list(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    }

    /// Parse `key=value` pairs from a comma-separated string.
    ///
    /// # Errors
    ///
    /// Returns an error for entries without `=` or with an empty key.
    pub fn parse_overrides(field: &str, s: &str) -> Result<BTreeMap<String, String>> {
        let mut overrides = BTreeMap::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part.split_once('=').ok_or_else(|| Error::Validation {
                field: field.into(),
                message: format!("Expected KEY=VALUE, got '{part}'"),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Validation {
                    field: field.into(),
                    message: format!("Empty key in '{part}'"),
                });
            }
            overrides.insert(key.to_string(), value.trim().to_string());
        }

        Ok(overrides)
    }
}

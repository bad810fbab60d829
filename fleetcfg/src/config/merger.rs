//! Configuration merging and precedence handling.
//!
//! This module implements hierarchical merging of configuration sources,
//! with special handling for the accumulated `overrides` table.

use crate::config::loader::ConfigSource;
use crate::config::schema::Config;

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use fleetcfg::config::{Config, ConfigMerger};
///
/// let low = Config { threads: Some(2), ..Default::default() };
/// let high = Config { threads: Some(8), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.threads, Some(8));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge multiple configuration sources into final config.
    ///
    /// Sources should be provided in order from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();

        for source in sources {
            log::debug!("merging configuration from {}", source.path.display());
            Self::merge_into(&mut result, &source.config);
        }

        result
    }

    /// Merge source config into target (source overwrites target).
    ///
    /// # Merging Rules
    ///
    /// - Simple fields: source overwrites if Some
    /// - Overrides: accumulated, source wins per key
    /// - Environments and config types: complete replacement
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.destination.is_some() {
            target.destination.clone_from(&source.destination);
        }

        if source.service_inner_dir.is_some() {
            target.service_inner_dir.clone_from(&source.service_inner_dir);
        }

        if source.components_dir.is_some() {
            target.components_dir.clone_from(&source.components_dir);
        }

        if source.environments_dir.is_some() {
            target.environments_dir.clone_from(&source.environments_dir);
        }

        if source.environments.is_some() {
            target.environments.clone_from(&source.environments);
        }

        if source.threads.is_some() {
            target.threads = source.threads;
        }

        if source.fail_fast.is_some() {
            target.fail_fast = source.fail_fast;
        }

        if source.output_format.is_some() {
            target.output_format = source.output_format;
        }

        if let Some(ref source_overrides) = source.overrides {
            target
                .overrides
                .get_or_insert_with(Default::default)
                .extend(source_overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if source.config_types.is_some() {
            target.config_types.clone_from(&source.config_types);
        }
    }
}

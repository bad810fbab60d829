//! Layered configuration assembly.

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::ConfigLoader;
use crate::config::merger::ConfigMerger;
use crate::config::schema::Config;
use crate::config::validator::ConfigValidator;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Builds the effective configuration from every layer.
///
/// Layers, lowest to highest: built-in defaults, user config, project
/// configs discovered from the source root, `FLEETCFG_*` variables,
/// programmatic config.
///
/// # Examples
///
/// ```
/// use fleetcfg::config::{Config, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .skip_files()
///     .skip_env()
///     .with_config(Config { threads: Some(2), ..Default::default() })
///     .build()
///     .unwrap();
/// assert_eq!(config.threads, Some(2));
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    source_root: Option<PathBuf>,
    user_dir: Option<PathBuf>,
    skip_files: bool,
    skip_env: bool,
    programmatic: Option<Config>,
}

impl ConfigBuilder {
    /// Creates a builder discovering project configs from the current
    /// directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers project configs from this directory instead.
    #[must_use]
    pub fn with_source_root(mut self, root: &Path) -> Self {
        self.source_root = Some(root.to_path_buf());
        self
    }

    /// Reads the user config from this directory instead of `~/.fleetcfg`.
    #[must_use]
    pub fn with_user_dir(mut self, dir: &Path) -> Self {
        self.user_dir = Some(dir.to_path_buf());
        self
    }

    /// Ignores every configuration file.
    #[must_use]
    pub fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Ignores `FLEETCFG_*` variables.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Adds a highest-precedence layer, merged after every other one.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        match &mut self.programmatic {
            Some(existing) => ConfigMerger::merge_into(existing, &config),
            None => self.programmatic = Some(config),
        }
        self
    }

    /// Merges and validates every layer.
    ///
    /// # Errors
    ///
    /// Returns loading, environment parsing and validation errors.
    pub fn build(self) -> Result<Config> {
        let mut config = if self.skip_files {
            Config::default()
        } else {
            let root = match self.source_root {
                Some(root) => root,
                None => std::env::current_dir().map_err(|e| crate::Error::io(".", e))?,
            };
            ConfigMerger::merge(ConfigLoader::load_all(&root, self.user_dir.as_deref())?)
        };

        if !self.skip_env {
            EnvironmentConfig::apply_overrides(&mut config)?;
        }

        if let Some(programmatic) = &self.programmatic {
            ConfigMerger::merge_into(&mut config, programmatic);
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::PROJECT_CONFIG_FILE;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_programmatic_layers_merge() {
        let config = ConfigBuilder::new()
            .skip_files()
            .skip_env()
            .with_config(Config {
                threads: Some(2),
                fail_fast: Some(true),
                ..Default::default()
            })
            .with_config(Config {
                threads: Some(6),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.threads, Some(6));
        assert_eq!(config.fail_fast, Some(true));
    }

    #[test]
    fn test_files_then_programmatic() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(
            project.path().join(PROJECT_CONFIG_FILE),
            "destination: out\nthreads: 2\n",
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .with_source_root(project.path())
            .with_user_dir(user.path())
            .skip_env()
            .with_config(Config {
                threads: Some(5),
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(config.destination, Some(PathBuf::from("out")));
        assert_eq!(config.threads, Some(5));
    }

    #[test]
    fn test_invalid_result_rejected() {
        let result = ConfigBuilder::new()
            .skip_files()
            .skip_env()
            .with_config(Config {
                threads: Some(0),
                ..Default::default()
            })
            .build();
        assert!(result.is_err());
    }
}

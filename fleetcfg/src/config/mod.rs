//! Configuration system for fleetcfg.
//!
//! This module provides hierarchical tool configuration with support for:
//! - YAML configuration files (user config and project `fleetcfg.yaml`)
//! - Environment variable overrides
//! - Programmatic configuration via builder pattern
//! - Validation
//!
//! Tool configuration says where sources and artifacts live; it is unrelated
//! to the environment descriptors and component sources being built.
//!
//! # Configuration Precedence
//!
//! Configuration is merged from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Programmatic overrides (via `ConfigBuilder::with_config`)
//! 2. Environment variables (`FLEETCFG_*`)
//! 3. Private project config (`fleetcfg.local.yaml`)
//! 4. Project config (`fleetcfg.yaml`)
//! 5. User config (`~/.fleetcfg/config.yaml`)
//! 6. Built-in defaults
//!
//! # Examples
//!
//! Loading from a source tree:
//!
//! ```no_run
//! use fleetcfg::config::ConfigBuilder;
//! use std::path::Path;
//!
//! let root = Path::new("/path/to/configs");
//! let config = ConfigBuilder::new()
//!     .with_source_root(root)
//!     .build()
//!     .unwrap();
//! let options = config.session_options(root);
//! ```
//!
//! Programmatic configuration:
//!
//! ```
//! use fleetcfg::config::{Config, ConfigBuilder};
//!
//! let custom = Config {
//!     destination: Some("out".into()),
//!     environments: Some(vec!["prod".to_string()]),
//!     ..Default::default()
//! };
//!
//! let config = ConfigBuilder::new()
//!     .skip_files()
//!     .skip_env()
//!     .with_config(custom)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.environments, Some(vec!["prod".to_string()]));
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

// Re-export key types at module root
pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::{ConfigLoader, ConfigSource, LOCAL_CONFIG_FILE, PROJECT_CONFIG_FILE};
pub use merger::ConfigMerger;
pub use schema::{Config, ConfigTypeDefinition, DEFAULT_DESTINATION};
pub use validator::ConfigValidator;

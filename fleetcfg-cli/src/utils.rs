//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including source root resolution, configuration loading and session
//! setup.

use crate::error::CliError;
use fleetcfg::config::{Config, ConfigBuilder};
use fleetcfg::{Session, SessionOptions};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)] // `verbose` is consumed by the logger in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Source root; the current directory when unset.
    pub root: Option<PathBuf>,

    /// Destination root override.
    pub dest: Option<PathBuf>,

    /// Raw `KEY=VALUE` placeholder overrides.
    pub set: Vec<String>,
}

/// Resolve the source root, using CWD if not specified.
pub fn resolve_root(global: &GlobalOptions) -> Result<PathBuf, CliError> {
    let root = match &global.root {
        Some(root) => root.clone(),
        None => env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(CliError::InvalidArguments(format!(
            "source root is not a directory: {}",
            root.display()
        )));
    }
    Ok(root)
}

/// Split a `KEY=VALUE` assignment.
pub fn parse_assignment(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidArguments(format!(
            "expected KEY=VALUE, got '{raw}'"
        ))),
    }
}

/// Load hierarchical configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Global options (highest priority)
/// 2. Environment variables
/// 3. Configuration files discovered from the source root
/// 4. Built-in defaults (lowest priority)
pub fn load_configuration(global: &GlobalOptions) -> Result<Config, CliError> {
    let root = resolve_root(global)?;

    let overrides = global
        .set
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let cli_config = Config {
        destination: global.dest.clone(),
        overrides: (!overrides.is_empty()).then_some(overrides),
        ..Config::default()
    };

    ConfigBuilder::new()
        .with_source_root(&root)
        .with_config(cli_config)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Session options for the configured source tree.
pub fn session_options(global: &GlobalOptions, config: &Config) -> Result<SessionOptions, CliError> {
    let root = resolve_root(global)?;
    Ok(config.session_options(&root))
}

/// Open a session over the configured source tree.
pub fn open_session(global: &GlobalOptions, config: &Config) -> Result<Session, CliError> {
    Session::new(session_options(global, config)?).map_err(CliError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("billing@port=9000").unwrap(),
            ("billing@port".to_string(), "9000".to_string())
        );
        assert_eq!(
            parse_assignment("url=a=b").unwrap(),
            ("url".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=9000").is_err());
    }

    #[test]
    fn test_resolve_root_rejects_missing_directory() {
        let global = GlobalOptions {
            root: Some(PathBuf::from("/definitely/not/a/fleetcfg/root")),
            ..GlobalOptions::default()
        };
        let err = resolve_root(&global).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}

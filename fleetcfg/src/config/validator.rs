//! Configuration validation.
//!
//! This module checks merged configurations before they are turned into
//! session options.

use crate::config::schema::{Config, ConfigTypeDefinition};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::{Component, Path};

/// Validates configuration.
///
/// # Examples
///
/// ```
/// use fleetcfg::config::{Config, ConfigValidator};
///
/// let config = Config::default();
/// ConfigValidator::validate(&config).unwrap();
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(config: &Config) -> Result<()> {
        if let Some(threads) = config.threads {
            if threads == 0 {
                return Err(Error::Validation {
                    field: "threads".into(),
                    message: "must be at least 1".into(),
                });
            }
        }

        if let Some(ref inner) = config.service_inner_dir {
            Self::validate_relative_dir("service_inner_dir", inner)?;
        }

        if let Some(ref dir) = config.components_dir {
            Self::validate_non_empty_path("components_dir", dir)?;
        }

        if let Some(ref dir) = config.environments_dir {
            Self::validate_non_empty_path("environments_dir", dir)?;
        }

        if let Some(ref environments) = config.environments {
            for (i, name) in environments.iter().enumerate() {
                Self::validate_identifier(&format!("environments[{i}]"), name)?;
            }
        }

        if let Some(ref overrides) = config.overrides {
            for key in overrides.keys() {
                Self::validate_override_key(key)?;
            }
        }

        if let Some(ref types) = config.config_types {
            Self::validate_config_types(types)?;
        }

        Ok(())
    }

    fn validate_identifier(field: &str, value: &str) -> Result<()> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot be empty or only whitespace".into(),
            });
        }

        if trimmed.contains(|c: char| matches!(c, '\0' | '/' | '\\')) {
            return Err(Error::Validation {
                field: field.into(),
                message: format!("Invalid character in '{trimmed}'"),
            });
        }

        Ok(())
    }

    fn validate_non_empty_path(field: &str, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "Cannot be empty".into(),
            });
        }
        Ok(())
    }

    /// The service inner directory must stay inside the service directory.
    fn validate_relative_dir(field: &str, path: &Path) -> Result<()> {
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::RootDir | Component::Prefix(_) | Component::ParentDir
            )
        });
        if escapes {
            return Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: format!("{field} must be a relative path inside the service directory"),
            });
        }
        Ok(())
    }

    fn validate_override_key(key: &str) -> Result<()> {
        let field = format!("overrides.{key}");
        if key.trim().is_empty() {
            return Err(Error::Validation {
                field,
                message: "Override keys cannot be empty".into(),
            });
        }
        if let Some((component, name)) = key.split_once('@') {
            if component.is_empty() || name.is_empty() {
                return Err(Error::Validation {
                    field,
                    message: "Expected 'component@key' or 'key'".into(),
                });
            }
        }
        Ok(())
    }

    fn validate_config_types(types: &[ConfigTypeDefinition]) -> Result<()> {
        let mut seen = HashSet::new();

        for (i, definition) in types.iter().enumerate() {
            let field = format!("config_types[{i}]");
            Self::validate_identifier(&format!("{field}.name"), &definition.name)?;

            if !seen.insert(definition.name.as_str()) {
                return Err(Error::Validation {
                    field,
                    message: format!("Duplicate config type '{}'", definition.name),
                });
            }

            if definition.extensions.is_empty() {
                return Err(Error::Validation {
                    field: format!("{field}.extensions"),
                    message: "At least one extension is required".into(),
                });
            }
            for ext in &definition.extensions {
                if !ext.starts_with('.') || ext.len() < 2 {
                    return Err(Error::Validation {
                        field: format!("{field}.extensions"),
                        message: format!("Extension '{ext}' must start with '.'"),
                    });
                }
            }

            Self::validate_identifier(&format!("{field}.result_file"), &definition.result_file)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn definition(name: &str, ext: &str, result: &str) -> ConfigTypeDefinition {
        ConfigTypeDefinition {
            name: name.into(),
            extensions: vec![ext.into()],
            result_file: result.into(),
        }
    }

    #[test]
    fn test_default_config_valid() {
        assert!(ConfigValidator::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = Config {
            threads: Some(0),
            ..Default::default()
        };
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("threads"));
    }

    #[test]
    fn test_service_inner_dir_must_be_relative() {
        for bad in ["/etc", "../outside", "conf/../../x"] {
            let config = Config {
                service_inner_dir: Some(bad.into()),
                ..Default::default()
            };
            assert!(
                matches!(ConfigValidator::validate(&config), Err(Error::InvalidPath { .. })),
                "{bad} should be rejected"
            );
        }

        let config = Config {
            service_inner_dir: Some("conf/app".into()),
            ..Default::default()
        };
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_extension_needs_dot() {
        let config = Config {
            config_types: Some(vec![definition("nginx", "nginx", "nginx.properties")]),
            ..Default::default()
        };
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("must start with '.'"));
    }

    #[test]
    fn test_duplicate_type_names_rejected() {
        let config = Config {
            config_types: Some(vec![
                definition("nginx", ".nginx", "a.properties"),
                definition("nginx", ".ngx", "b.properties"),
            ]),
            ..Default::default()
        };
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate config type"));
    }

    #[test]
    fn test_empty_result_file_rejected() {
        let config = Config {
            config_types: Some(vec![definition("nginx", ".nginx", " ")]),
            ..Default::default()
        };
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_override_keys() {
        let valid = Config {
            overrides: Some(BTreeMap::from([
                ("billing@port".to_string(), "1".to_string()),
                ("ip".to_string(), "2".to_string()),
            ])),
            ..Default::default()
        };
        assert!(ConfigValidator::validate(&valid).is_ok());

        let invalid = Config {
            overrides: Some(BTreeMap::from([("@port".to_string(), "1".to_string())])),
            ..Default::default()
        };
        assert!(ConfigValidator::validate(&invalid).is_err());
    }

    #[test]
    fn test_empty_environment_name_rejected() {
        let config = Config {
            environments: Some(vec!["dev".into(), String::new()]),
            ..Default::default()
        };
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("environments[1]"));
    }
}

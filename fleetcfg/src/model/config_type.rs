//! Config types: categories of generated artifacts.

use std::path::Path;

use serde::Serialize;

/// A category of generated artifact, with its own source suffixes and
/// output filename.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::ConfigType;
/// use std::path::Path;
///
/// let process = ConfigType::new("process", [".proc", ".process"], "process.properties");
/// assert!(process.matches(Path::new("components/billing/service.proc")));
/// assert!(!process.matches(Path::new("components/billing/application.yaml")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigType {
    name: String,
    source_extensions: Vec<String>,
    result_file_name: String,
}

impl ConfigType {
    /// Creates a config type. Extensions are stored lowercase without
    /// duplicates, keeping their first-seen order.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, extensions: I, result_file_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source_extensions: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().to_lowercase();
            if !source_extensions.contains(&ext) {
                source_extensions.push(ext);
            }
        }
        Self {
            name: name.into(),
            source_extensions,
            result_file_name: result_file_name.into(),
        }
    }

    /// The type name used on the command line and in placeholders.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file extensions, each including the leading dot.
    #[must_use]
    pub fn source_extensions(&self) -> &[String] {
        &self.source_extensions
    }

    /// File name of the generated artifact.
    #[must_use]
    pub fn result_file_name(&self) -> &str {
        &self.result_file_name
    }

    /// Whether a source file belongs to this type.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .is_some_and(|ext| self.source_extensions.contains(&ext))
    }
}

/// The built-in config types.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::standard_types;
///
/// let names: Vec<_> = standard_types().iter().map(|t| t.name().to_string()).collect();
/// assert_eq!(names, ["app", "process", "deploy", "secret", "log4j2"]);
/// ```
#[must_use]
pub fn standard_types() -> Vec<ConfigType> {
    vec![
        ConfigType::new("app", [".yaml", ".yml", ".properties"], "application.yaml"),
        ConfigType::new("process", [".proc", ".process"], "process.properties"),
        ConfigType::new("deploy", [".deploy"], "deploy.properties"),
        ConfigType::new("secret", [".secret"], "secret.properties"),
        ConfigType::new("log4j2", [".log4j2"], "log4j2.properties"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions_normalized() {
        let t = ConfigType::new("x", [".YAML", ".yaml", ".yml"], "x.yaml");
        assert_eq!(t.source_extensions(), [".yaml", ".yml"]);
    }

    #[test]
    fn test_matches_case_insensitive() {
        let app = &standard_types()[0];
        assert!(app.matches(Path::new("application.YAML")));
        assert!(app.matches(Path::new("application.prod.properties")));
        assert!(!app.matches(Path::new("Makefile")));
    }

    #[test]
    fn test_standard_result_files() {
        let types = standard_types();
        assert_eq!(types[0].result_file_name(), "application.yaml");
        assert_eq!(types[1].result_file_name(), "process.properties");
    }
}

//! Generated artifacts: where they go, how they are rendered, and how
//! resolved sets are displayed.

mod formatters;
pub mod diff;
pub mod layout;
pub mod writer;

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::PropertyMap;

pub use diff::{ChangeReport, DiffSerializer};
pub use formatters::{ArtifactFormatter, HumanFormatter, JsonFormatter};
pub use layout::OutputLayout;
pub use writer::{write_atomic, ArtifactFormat};

/// Trait for formatting resolved property sets for display.
pub trait PropertyFormatter {
    /// Format the given properties into a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn format(&self, properties: &PropertyMap) -> Result<String>;
}

/// Available display formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Human,
    /// JSON.
    Json,
    /// `key=value` lines.
    Properties,
    /// Nested YAML.
    Yaml,
}

impl OutputFormat {
    /// Create a formatter for this output format.
    #[must_use]
    pub fn create_formatter(self) -> Box<dyn PropertyFormatter> {
        match self {
            Self::Human => Box::new(HumanFormatter),
            Self::Json => Box::new(JsonFormatter),
            Self::Properties => Box::new(ArtifactFormatter(ArtifactFormat::Properties)),
            Self::Yaml => Box::new(ArtifactFormatter(ArtifactFormat::Yaml)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "properties" => Ok(Self::Properties),
            "yaml" => Ok(Self::Yaml),
            other => Err(Error::Validation {
                field: "output_format".into(),
                message: format!("unknown format '{other}' (expected human, json, properties or yaml)"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}

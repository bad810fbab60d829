//! Formatters for displaying resolved property sets.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{PropertyMap, Source};

use super::writer::ArtifactFormat;
use super::PropertyFormatter;

/// Aligned `key = value` lines, flagging computed and temporary entries.
pub struct HumanFormatter;

impl PropertyFormatter for HumanFormatter {
    fn format(&self, properties: &PropertyMap) -> Result<String> {
        let width = properties.keys().map(str::len).max().unwrap_or(0);
        let lines: Vec<String> = properties
            .iter()
            .map(|p| {
                let mut tags = Vec::new();
                if p.source() != Source::File {
                    tags.push(p.source().to_string());
                }
                if p.is_temporary() {
                    tags.push("temporary".to_string());
                }
                let suffix = if tags.is_empty() {
                    String::new()
                } else {
                    format!("  ({})", tags.join(", "))
                };
                format!("{:width$} = {}{suffix}", p.key(), p.value())
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

#[derive(Serialize)]
struct JsonProperty<'a> {
    key: &'a str,
    value: &'a str,
    environment: &'a str,
    source: Source,
    temporary: bool,
}

/// A JSON array of property records.
pub struct JsonFormatter;

impl PropertyFormatter for JsonFormatter {
    fn format(&self, properties: &PropertyMap) -> Result<String> {
        let records: Vec<JsonProperty<'_>> = properties
            .iter()
            .map(|p| JsonProperty {
                key: p.key(),
                value: p.value(),
                environment: p.environment(),
                source: p.source(),
                temporary: p.is_temporary(),
            })
            .collect();

        serde_json::to_string_pretty(&records).map_err(|e| Error::Validation {
            field: "json_output".to_string(),
            message: format!("failed to serialize to JSON: {e}"),
        })
    }
}

/// The same text an artifact would contain.
pub struct ArtifactFormatter(pub ArtifactFormat);

impl PropertyFormatter for ArtifactFormatter {
    fn format(&self, properties: &PropertyMap) -> Result<String> {
        self.0
            .render(properties.iter().map(|p| (p.key(), p.value())))
    }
}

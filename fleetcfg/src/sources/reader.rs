//! Readers for configuration source files.
//!
//! A reader parses one file into properties stamped with the environment the
//! file belongs to. Two syntaxes are supported, picked by
//! [`SourceFormat::detect`]:
//!
//! - properties files: `key=value` or `key: value` lines, `#`/`!` comments,
//!   a trailing `\` continues the line;
//! - YAML: nested mappings flattened to dotted keys, lists of scalars joined
//!   with `,`, other lists indexed as `key[i]`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::model::Property;
use crate::sources::format::SourceFormat;

/// Read access to one parsed source file.
pub trait ConfigReader: Send + Sync {
    /// Properties in declaration order.
    fn properties(&self) -> Vec<Property>;

    /// Key/value pairs sorted by key.
    fn properties_as_map(&self) -> BTreeMap<String, String> {
        self.properties()
            .into_iter()
            .map(|p| (p.key().to_string(), p.value().to_string()))
            .collect()
    }

    /// Comment lines, without their markers.
    fn comments(&self) -> Vec<String>;
}

/// Opens and parses a source file.
///
/// Every property is stamped with `environment`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed YAML.
pub fn open_reader(path: &Path, environment: &str) -> Result<Box<dyn ConfigReader>> {
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    match SourceFormat::detect(path, &contents) {
        SourceFormat::Properties => Ok(Box::new(PropertiesReader::parse(&contents, environment))),
        SourceFormat::Yaml => {
            let reader =
                YamlReader::parse(&contents, environment).map_err(|message| Error::Parse {
                    path: path.to_path_buf(),
                    message,
                })?;
            Ok(Box::new(reader))
        }
    }
}

/// Parsed `.properties`-style source.
///
/// # Examples
///
/// ```
/// use fleetcfg::sources::{ConfigReader, PropertiesReader};
///
/// let reader = PropertiesReader::parse("# ports\nport=${portOffset}01\nhost: localhost\n", "base");
/// let props = reader.properties();
/// assert_eq!(props[0].key(), "port");
/// assert_eq!(props[1].value(), "localhost");
/// assert_eq!(reader.comments(), ["ports"]);
/// ```
#[derive(Debug, Clone)]
pub struct PropertiesReader {
    environment: String,
    entries: Vec<(String, String)>,
    comments: Vec<String>,
}

impl PropertiesReader {
    /// Parses properties text. Parsing never fails: a line without a
    /// separator is a key with an empty value. Leading whitespace of values
    /// is dropped, trailing whitespace is kept.
    #[must_use]
    pub fn parse(contents: &str, environment: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut comments = Vec::new();

        for line in logical_lines(contents) {
            let line = line.trim_start();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#').or_else(|| line.strip_prefix('!')) {
                comments.push(comment.trim().to_string());
                continue;
            }

            let (key, value) = match find_separator(line) {
                Some(i) => (&line[..i], &line[i + 1..]),
                None => (line, ""),
            };
            let key = unescape(key.trim());
            let value = unescape(value.trim_start());

            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }

        Self {
            environment: environment.to_string(),
            entries,
            comments,
        }
    }
}

impl ConfigReader for PropertiesReader {
    fn properties(&self) -> Vec<Property> {
        self.entries
            .iter()
            .map(|(k, v)| Property::file(k.as_str(), v.as_str(), self.environment.as_str()))
            .collect()
    }

    fn comments(&self) -> Vec<String> {
        self.comments.clone()
    }
}

/// Joins physical lines ending in an unescaped backslash.
fn logical_lines(contents: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for raw in contents.lines() {
        let piece = match pending {
            Some(_) => raw.trim_start(),
            None => raw,
        };
        let trailing = piece.chars().rev().take_while(|&c| c == '\\').count();
        let continues = trailing % 2 == 1;
        let piece = if continues {
            &piece[..piece.len() - 1]
        } else {
            piece
        };

        let mut current = pending.take().unwrap_or_default();
        current.push_str(piece);
        if continues {
            pending = Some(current);
        } else {
            lines.push(current);
        }
    }
    if let Some(rest) = pending {
        lines.push(rest);
    }
    lines
}

/// Byte index of the first unescaped `=` or `:`.
fn find_separator(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return Some(i),
            _ => {}
        }
    }
    None
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Parsed YAML source.
///
/// # Examples
///
/// ```
/// use fleetcfg::sources::{ConfigReader, YamlReader};
///
/// let reader = YamlReader::parse("server:\n  port: 8080\nhosts: [a, b]\n", "prod").unwrap();
/// let map = reader.properties_as_map();
/// assert_eq!(map["server.port"], "8080");
/// assert_eq!(map["hosts"], "a,b");
/// ```
#[derive(Debug, Clone)]
pub struct YamlReader {
    environment: String,
    entries: Vec<(String, String)>,
    comments: Vec<String>,
}

impl YamlReader {
    /// Parses YAML text.
    ///
    /// # Errors
    ///
    /// Returns a message if the text is not YAML or its root is not a
    /// mapping.
    pub fn parse(contents: &str, environment: &str) -> std::result::Result<Self, String> {
        let comments = contents
            .lines()
            .filter_map(|line| line.trim_start().strip_prefix('#'))
            .map(|c| c.trim().to_string())
            .collect();

        let mut entries = Vec::new();
        if !contents.trim().is_empty() {
            let root: Value = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
            match root {
                Value::Null => {}
                Value::Mapping(_) => flatten("", &root, &mut entries)?,
                _ => return Err("expected a mapping at the document root".to_string()),
            }
        }

        Ok(Self {
            environment: environment.to_string(),
            entries,
            comments,
        })
    }
}

impl ConfigReader for YamlReader {
    fn properties(&self) -> Vec<Property> {
        self.entries
            .iter()
            .map(|(k, v)| Property::file(k.as_str(), v.as_str(), self.environment.as_str()))
            .collect()
    }

    fn comments(&self) -> Vec<String> {
        self.comments.clone()
    }
}

fn flatten(
    prefix: &str,
    value: &Value,
    out: &mut Vec<(String, String)>,
) -> std::result::Result<(), String> {
    match value {
        Value::Mapping(mapping) => {
            for (k, v) in mapping {
                let segment = scalar_text(k)
                    .ok_or_else(|| format!("non-scalar mapping key under '{prefix}'"))?;
                let key = if prefix.is_empty() {
                    segment
                } else {
                    format!("{prefix}.{segment}")
                };
                flatten(&key, v, out)?;
            }
        }
        Value::Sequence(items) => {
            let scalars: Option<Vec<String>> = items.iter().map(scalar_text).collect();
            match scalars {
                Some(values) => out.push((prefix.to_string(), values.join(","))),
                None => {
                    for (i, item) in items.iter().enumerate() {
                        flatten(&format!("{prefix}[{i}]"), item, out)?;
                    }
                }
            }
        }
        Value::Tagged(tagged) => flatten(prefix, &tagged.value, out)?,
        scalar => {
            let text = scalar_text(scalar).unwrap_or_default();
            match out.iter_mut().find(|(k, _)| *k == prefix) {
                Some(entry) => entry.1 = text,
                None => out.push((prefix.to_string(), text)),
            }
        }
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

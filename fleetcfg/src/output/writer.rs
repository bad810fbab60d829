//! Artifact rendering and writing.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// On-disk syntax of a generated artifact, chosen by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// `key=value` lines.
    Properties,
    /// Nested YAML, with dotted keys expanded into mappings.
    Yaml,
}

impl ArtifactFormat {
    /// `.yaml` and `.yml` artifacts are YAML, everything else is properties.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::Yaml
        } else {
            Self::Properties
        }
    }

    /// Renders key/value pairs, keeping their order.
    ///
    /// # Examples
    ///
    /// ```
    /// use fleetcfg::output::ArtifactFormat;
    ///
    /// let pairs = [("server.port", "10002"), ("server.host", "10.0.0.5")];
    /// let yaml = ArtifactFormat::Yaml.render(pairs).unwrap();
    /// assert!(yaml.starts_with("server:\n  port: '10002'\n"));
    ///
    /// let props = ArtifactFormat::Properties.render(pairs).unwrap();
    /// assert_eq!(props, "server.port=10002\nserver.host=10.0.0.5\n");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if YAML serialization fails.
    pub fn render<'a, I>(self, pairs: I) -> Result<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        match self {
            Self::Properties => Ok(pairs
                .into_iter()
                .map(|(k, v)| format!("{}={}\n", escape_key(k), escape_value(v)))
                .collect()),
            Self::Yaml => {
                let pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
                if pairs.is_empty() {
                    return Ok(String::new());
                }
                serde_yaml::to_string(&Value::Mapping(nest(&pairs))).map_err(|e| Error::Validation {
                    field: "artifact".into(),
                    message: format!("failed to render YAML: {e}"),
                })
            }
        }
    }
}

/// Builds a nested mapping from dotted keys.
///
/// A key that is both a value and a parent (`a` and `a.b`) cannot nest; its
/// entries are kept as flat dotted keys at that level, which read back to the
/// same flattened keys.
fn nest(pairs: &[(&str, &str)]) -> Mapping {
    let mut groups: Vec<(&str, Vec<(Option<&str>, &str)>)> = Vec::new();
    for &(key, value) in pairs {
        let (head, rest) = match key.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (key, None),
        };
        match groups.iter_mut().find(|(h, _)| *h == head) {
            Some((_, items)) => items.push((rest, value)),
            None => groups.push((head, vec![(rest, value)])),
        }
    }

    let mut mapping = Mapping::new();
    for (head, items) in groups {
        let has_leaf = items.iter().any(|(rest, _)| rest.is_none());
        if has_leaf && items.len() == 1 {
            mapping.insert(Value::from(head), Value::from(items[0].1));
        } else if has_leaf {
            for (rest, value) in items {
                let key = rest.map_or_else(|| head.to_string(), |r| format!("{head}.{r}"));
                mapping.insert(Value::from(key), Value::from(value));
            }
        } else {
            let children: Vec<(&str, &str)> = items
                .into_iter()
                .filter_map(|(rest, value)| rest.map(|r| (r, value)))
                .collect();
            mapping.insert(Value::from(head), Value::Mapping(nest(&children)));
        }
    }
    mapping
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        match c {
            '\\' | '=' | ':' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            '#' | '!' if i == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => push_escaped_control(&mut out, c),
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' if i == 0 => out.push_str("\\ "),
            _ => push_escaped_control(&mut out, c),
        }
    }
    out
}

fn push_escaped_control(out: &mut String, c: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        _ => out.push(c),
    }
}

/// Writes `contents` to `path` through a sibling temporary file, so readers
/// never observe a half-written artifact.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created or the file
/// cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "artifact path has no parent directory".into(),
    })?;
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    // Each writer stages in its own file, so concurrent writers never
    // rename each other's staging file away.
    let mut staging = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    staging
        .write_all(contents.as_bytes())
        .map_err(|e| Error::io(staging.path(), e))?;
    staging.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

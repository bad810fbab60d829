//! Source file format detection.

use std::path::Path;

/// Syntax of a configuration source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `key=value` / `key: value` lines.
    Properties,
    /// A YAML mapping, flattened to dotted keys.
    Yaml,
}

impl SourceFormat {
    /// Detects the format of a file from its extension, falling back to the
    /// shape of its contents.
    ///
    /// `.yaml` and `.yml` are always YAML and `.properties` is always
    /// properties. Anything else is YAML only when its first significant line
    /// reads `key:` (no `=` before the colon) and some later line is indented
    /// or a list item.
    ///
    /// # Examples
    ///
    /// ```
    /// use fleetcfg::sources::SourceFormat;
    /// use std::path::Path;
    ///
    /// let nested = "server:\n  port: 80\n";
    /// assert_eq!(SourceFormat::detect(Path::new("svc.proc"), nested), SourceFormat::Yaml);
    /// assert_eq!(SourceFormat::detect(Path::new("svc.proc"), "port=80\n"), SourceFormat::Properties);
    /// ```
    #[must_use]
    pub fn detect(path: &Path, contents: &str) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Self::Yaml,
            Some("properties") => Self::Properties,
            _ => Self::sniff(contents),
        }
    }

    fn sniff(contents: &str) -> Self {
        let mut significant = contents.lines().filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#') && !trimmed.starts_with('!')
        });

        let Some(first) = significant.next() else {
            return Self::Properties;
        };
        let colon = first.find(':');
        let equals = first.find('=');
        let first_is_mapping = match (colon, equals) {
            (Some(c), Some(e)) => c < e,
            (Some(_), None) => true,
            _ => false,
        };
        if !first_is_mapping {
            return Self::Properties;
        }

        let nested = significant.any(|line| {
            line.starts_with(' ') || line.starts_with('\t') || line.trim_start().starts_with("- ")
        });
        if nested {
            Self::Yaml
        } else {
            Self::Properties
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_wins() {
        assert_eq!(
            SourceFormat::detect(Path::new("application.yml"), "a=1"),
            SourceFormat::Yaml
        );
        assert_eq!(
            SourceFormat::detect(Path::new("application.properties"), "a:\n  b: 1"),
            SourceFormat::Properties
        );
    }

    #[test]
    fn test_flat_colon_file_is_properties() {
        let contents = "# header\nport: 80\nhost: localhost\n";
        assert_eq!(
            SourceFormat::detect(Path::new("service.deploy"), contents),
            SourceFormat::Properties
        );
    }

    #[test]
    fn test_list_marks_yaml() {
        let contents = "hosts:\n- a\n- b\n";
        assert_eq!(
            SourceFormat::detect(Path::new("service.deploy"), contents),
            SourceFormat::Yaml
        );
    }

    #[test]
    fn test_equals_before_colon_is_properties() {
        let contents = "url=http://localhost:80\n  indented=x\n";
        assert_eq!(
            SourceFormat::detect(Path::new("service.proc"), contents),
            SourceFormat::Properties
        );
    }

    #[test]
    fn test_empty_is_properties() {
        assert_eq!(
            SourceFormat::detect(Path::new("service.proc"), "\n# nothing\n"),
            SourceFormat::Properties
        );
    }
}

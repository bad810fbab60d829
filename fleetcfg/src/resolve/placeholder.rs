//! Placeholder scanning and parsing.
//!
//! Reference grammar, between `${` and `}`:
//!
//! ```text
//! key                      key of the current component
//! component@key            key of another component (`this` is the current one)
//! component[env]@key       key of a component in another environment
//! <reference>:default      fallback when nothing resolves the reference
//! ```
//!
//! Defaults may contain placeholders themselves. A `${` without a matching
//! `}` is literal text.

use std::fmt;

use crate::error::{Error, Result};

/// Qualifier naming the current component.
pub const THIS_COMPONENT: &str = "this";

/// A piece of a scanned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text.
    Literal(&'a str),
    /// The text between `${` and its matching `}`.
    Placeholder(&'a str),
}

/// Splits a value into literal text and placeholder tokens.
///
/// Braces nest, so `${a:${b}}` is one token.
///
/// # Examples
///
/// ```
/// use fleetcfg::resolve::placeholder::{scan, Segment};
///
/// let segments = scan("${portOffset}0${order}");
/// assert_eq!(
///     segments,
///     [
///         Segment::Placeholder("portOffset"),
///         Segment::Literal("0"),
///         Segment::Placeholder("order"),
///     ]
/// );
/// ```
#[must_use]
pub fn scan(value: &str) -> Vec<Segment<'_>> {
    let bytes = value.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'$' || bytes[i + 1] != b'{' {
            i += 1;
            continue;
        }
        match matching_brace(bytes, i + 2) {
            Some(close) => {
                if literal_start < i {
                    segments.push(Segment::Literal(&value[literal_start..i]));
                }
                segments.push(Segment::Placeholder(&value[i + 2..close]));
                i = close + 1;
                literal_start = i;
            }
            None => i += 2,
        }
    }
    if literal_start < value.len() {
        segments.push(Segment::Literal(&value[literal_start..]));
    }
    segments
}

/// Whether a value contains at least one complete placeholder.
#[must_use]
pub fn contains_placeholder(value: &str) -> bool {
    scan(value)
        .iter()
        .any(|s| matches!(s, Segment::Placeholder(_)))
}

fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// A parsed placeholder reference.
///
/// # Examples
///
/// ```
/// use fleetcfg::resolve::Placeholder;
///
/// let p = Placeholder::parse("billing[dev]@port:8080").unwrap();
/// assert_eq!(p.component(), Some("billing"));
/// assert_eq!(p.environment(), Some("dev"));
/// assert_eq!(p.key(), "port");
/// assert_eq!(p.default_value(), Some("8080"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    text: String,
    component: Option<String>,
    environment: Option<String>,
    key: String,
    default: Option<String>,
}

impl Placeholder {
    /// Parses the text between `${` and `}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPlaceholder`] for an empty key, an empty
    /// component qualifier or an unclosed environment qualifier.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidPlaceholder {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let (reference, default) = match top_level_colon(text) {
            Some(i) => (&text[..i], Some(text[i + 1..].to_string())),
            None => (text, None),
        };

        let (qualifier, key) = match reference.split_once('@') {
            Some((qualifier, key)) => (Some(qualifier.trim()), key.trim()),
            None => (None, reference.trim()),
        };
        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        if key.contains("${") {
            return Err(invalid("nested placeholders are only allowed in defaults"));
        }

        let (component, environment) = match qualifier {
            None => (None, None),
            Some(q) => {
                let (name, env) = match q.split_once('[') {
                    Some((name, rest)) => {
                        let env = rest
                            .strip_suffix(']')
                            .ok_or_else(|| invalid("unclosed environment qualifier"))?
                            .trim();
                        if env.is_empty() {
                            return Err(invalid("empty environment qualifier"));
                        }
                        (name.trim(), Some(env.to_string()))
                    }
                    None => (q, None),
                };
                if name.is_empty() {
                    return Err(invalid("empty component qualifier"));
                }
                let component = (name != THIS_COMPONENT).then(|| name.to_string());
                (component, env)
            }
        };

        Ok(Self {
            text: text.to_string(),
            component,
            environment,
            key: key.to_string(),
            default,
        })
    }

    /// The original text between `${` and `}`.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The referenced component, `None` for the current one.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// The referenced environment, `None` for the current one.
    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    /// The referenced key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The fallback value, unresolved.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Whether the reference names a component or environment explicitly.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.component.is_some() || self.environment.is_some()
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.text)
    }
}

/// Index of the first `:` outside nested braces.
fn top_level_colon(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

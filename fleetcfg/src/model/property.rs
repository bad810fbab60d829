//! Property values and ordered property sets.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

/// Environment recorded on properties read from environment-agnostic files.
pub const BASE_ENVIRONMENT: &str = "base";

/// Where a property value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Authored in a source file.
    File,
    /// Computed from the environment graph or the process environment.
    System,
    /// Supplied by the operator on the command line or in tool configuration.
    Override,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::System => write!(f, "system"),
            Self::Override => write!(f, "override"),
        }
    }
}

/// A single configuration property.
///
/// Properties are immutable; resolution produces a new property through
/// [`Property::with_value`] rather than editing one in place.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::{Property, Source};
///
/// let raw = Property::file("port", "${portOffset}01", "base");
/// let resolved = raw.with_value("10001");
/// assert_eq!(raw.value(), "${portOffset}01");
/// assert_eq!(resolved.value(), "10001");
/// assert_eq!(resolved.source(), Source::File);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    key: String,
    value: String,
    environment: String,
    source: Source,
    temporary: bool,
}

impl Property {
    /// Creates a property with every field given explicitly.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        environment: impl Into<String>,
        source: Source,
        temporary: bool,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            environment: environment.into(),
            source,
            temporary,
        }
    }

    /// Creates a persistent property authored in a source file.
    #[must_use]
    pub fn file(key: impl Into<String>, value: impl Into<String>, environment: impl Into<String>) -> Self {
        Self::new(key, value, environment, Source::File, false)
    }

    /// Creates a computed property.
    #[must_use]
    pub fn system(
        key: impl Into<String>,
        value: impl Into<String>,
        environment: impl Into<String>,
        temporary: bool,
    ) -> Self {
        Self::new(key, value, environment, Source::System, temporary)
    }

    /// Returns a copy of this property carrying a new value.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }

    /// The property key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The property value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The environment this property belongs to.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Where the property came from.
    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    /// Whether the property is excluded from persisted artifacts.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.temporary
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// An insertion-ordered set of properties with unique keys.
///
/// Replacing an existing key keeps its original position, so generated
/// artifacts follow the order properties were declared in.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::{Property, PropertyMap};
///
/// let mut map = PropertyMap::new();
/// map.insert(Property::file("b", "1", "base"));
/// map.insert(Property::file("a", "2", "base"));
/// map.insert(Property::file("b", "3", "base"));
///
/// let keys: Vec<_> = map.keys().collect();
/// assert_eq!(keys, ["b", "a"]);
/// assert_eq!(map.get("b").unwrap().value(), "3");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: Vec<Property>,
    index: HashMap<String, usize>,
}

impl PropertyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a property by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Whether a property with this key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts a property, replacing (in place) any property with the same key.
    ///
    /// Returns the replaced property, if any.
    pub fn insert(&mut self, property: Property) -> Option<Property> {
        if let Some(&i) = self.index.get(property.key()) {
            return Some(std::mem::replace(&mut self.entries[i], property));
        }
        self.index.insert(property.key().to_string(), self.entries.len());
        self.entries.push(property);
        None
    }

    /// Inserts a property only if its key is absent.
    ///
    /// Returns `true` if the property was inserted.
    pub fn insert_if_absent(&mut self, property: Property) -> bool {
        if self.contains_key(property.key()) {
            return false;
        }
        self.insert(property);
        true
    }

    /// Iterates properties in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.entries.iter()
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Property::key)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates properties that end up in persisted artifacts.
    pub fn persistent(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter().filter(|p| !p.is_temporary())
    }

    /// Key/value pairs of every non-temporary property, sorted by key.
    #[must_use]
    pub fn persistent_values(&self) -> BTreeMap<String, String> {
        self.persistent()
            .map(|p| (p.key().to_string(), p.value().to_string()))
            .collect()
    }
}

impl FromIterator<Property> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut map = Self::new();
        for property in iter {
            map.insert(property);
        }
        map
    }
}

impl Extend<Property> for PropertyMap {
    fn extend<I: IntoIterator<Item = Property>>(&mut self, iter: I) {
        for property in iter {
            self.insert(property);
        }
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Environments: named deployment contexts with grouped components.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Component, ComponentGroup};

/// A named deployment context.
///
/// An environment declares which components run in it, how they are grouped
/// and environment-wide values such as the port offset. A component belongs
/// to at most one group.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::{Component, ComponentGroup, Environment};
///
/// let core = ComponentGroup::new("core")
///     .with_ip("10.0.0.5")
///     .with_members(vec![Component::new("a"), Component::new("billing")]);
/// let env = Environment::new("prod", Some(100), vec![core]).unwrap();
///
/// assert_eq!(env.port_offset(), Some(100));
/// assert_eq!(env.group_of("billing").unwrap().name(), "core");
/// assert!(env.component("missing").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    name: String,
    port_offset: Option<i64>,
    groups: Vec<ComponentGroup>,
    #[serde(skip)]
    by_component: HashMap<String, usize>,
}

impl Environment {
    /// Creates an environment, indexing components by name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a component is declared in more than
    /// one group, or twice in the same group.
    pub fn new(
        name: impl Into<String>,
        port_offset: Option<i64>,
        groups: Vec<ComponentGroup>,
    ) -> Result<Self> {
        let name = name.into();
        let mut by_component = HashMap::new();
        for (i, group) in groups.iter().enumerate() {
            for member in group.member_names() {
                if by_component.insert(member.to_string(), i).is_some() {
                    return Err(Error::Validation {
                        field: format!("{name}.{}", group.name()),
                        message: format!("component '{member}' is declared more than once"),
                    });
                }
            }
        }
        Ok(Self {
            name,
            port_offset,
            groups,
            by_component,
        })
    }

    /// The environment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared port offset, if any.
    #[must_use]
    pub const fn port_offset(&self) -> Option<i64> {
        self.port_offset
    }

    /// All groups.
    #[must_use]
    pub fn groups(&self) -> &[ComponentGroup] {
        &self.groups
    }

    /// The group a component belongs to.
    #[must_use]
    pub fn group_of(&self, component_name: &str) -> Option<&ComponentGroup> {
        self.by_component
            .get(component_name)
            .map(|&i| &self.groups[i])
    }

    /// Looks up a declared component by name.
    #[must_use]
    pub fn component(&self, component_name: &str) -> Option<&Component> {
        self.group_of(component_name)?
            .members()
            .iter()
            .find(|c| c.name() == component_name)
    }

    /// Whether the component runs in this environment.
    #[must_use]
    pub fn contains(&self, component_name: &str) -> bool {
        self.by_component.contains_key(component_name)
    }

    /// Every component in group order, then member order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.groups.iter().flat_map(ComponentGroup::members)
    }
}

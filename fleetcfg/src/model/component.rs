//! Components and component groups.

use std::fmt;

use serde::Serialize;

/// A named deployable unit whose configuration is generated.
///
/// The component type names the source folder the component's templates are
/// read from. It defaults to the component name; environment descriptors can
/// alias a folder with the `name:type` form.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::Component;
///
/// let plain = Component::new("billing");
/// assert_eq!(plain.component_type(), "billing");
///
/// let aliased = Component::parse("ledger:accounting");
/// assert_eq!(aliased.name(), "ledger");
/// assert_eq!(aliased.component_type(), "accounting");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Component {
    name: String,
    #[serde(rename = "type")]
    component_type: String,
}

impl Component {
    /// Creates a component whose type equals its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            component_type: name.clone(),
            name,
        }
    }

    /// Creates a component reading its sources from another folder.
    #[must_use]
    pub fn with_type(name: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_type: component_type.into(),
        }
    }

    /// Parses a `name` or `name:type` declaration.
    #[must_use]
    pub fn parse(declaration: &str) -> Self {
        match declaration.split_once(':') {
            Some((name, component_type)) if !component_type.trim().is_empty() => {
                Self::with_type(name.trim(), component_type.trim())
            }
            Some((name, _)) => Self::new(name.trim()),
            None => Self::new(declaration.trim()),
        }
    }

    /// The component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source folder name.
    #[must_use]
    pub fn component_type(&self) -> &str {
        &self.component_type
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.component_type {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.component_type)
        }
    }
}

/// An ordered set of components sharing a role.
///
/// Member position is exposed as a 1-based ordinal.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::{Component, ComponentGroup};
///
/// let group = ComponentGroup::new("core")
///     .with_ip("10.0.0.5")
///     .with_member(Component::new("gateway"))
///     .with_member(Component::new("billing"));
///
/// assert_eq!(group.order_of("billing"), Some(2));
/// assert_eq!(group.order_of("ledger"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentGroup {
    name: String,
    members: Vec<Component>,
    ip: Option<String>,
}

impl ComponentGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            ip: None,
        }
    }

    /// Sets the group ip.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Sets or clears the group ip.
    #[must_use]
    pub fn with_optional_ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }

    /// Appends a member.
    #[must_use]
    pub fn with_member(mut self, component: Component) -> Self {
        self.members.push(component);
        self
    }

    /// Replaces the member list.
    #[must_use]
    pub fn with_members(mut self, members: Vec<Component>) -> Self {
        self.members = members;
        self
    }

    /// The group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared ip, if any.
    #[must_use]
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// Members in declaration order.
    #[must_use]
    pub fn members(&self) -> &[Component] {
        &self.members
    }

    /// Names of the members in declaration order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(Component::name)
    }

    /// 1-based position of the named member.
    #[must_use]
    pub fn order_of(&self, component_name: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|c| c.name() == component_name)
            .map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        assert_eq!(Component::parse("billing"), Component::new("billing"));
        assert_eq!(
            Component::parse(" ledger : accounting "),
            Component::with_type("ledger", "accounting")
        );
        assert_eq!(Component::parse("billing:"), Component::new("billing"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Component::new("billing").to_string(), "billing");
        assert_eq!(
            Component::with_type("ledger", "accounting").to_string(),
            "ledger:accounting"
        );
    }

    #[test]
    fn test_order_is_one_based_and_stable() {
        let group = ComponentGroup::new("core").with_members(vec![
            Component::new("a"),
            Component::new("billing"),
            Component::new("c"),
        ]);
        assert_eq!(group.order_of("a"), Some(1));
        assert_eq!(group.order_of("billing"), Some(2));
        assert_eq!(group.order_of("c"), Some(3));
        assert_eq!(group.member_names().collect::<Vec<_>>(), ["a", "billing", "c"]);
    }

    #[test]
    fn test_optional_ip() {
        let group = ComponentGroup::new("edge").with_optional_ip(None);
        assert_eq!(group.ip(), None);
        let group = group.with_ip("10.1.1.1");
        assert_eq!(group.ip(), Some("10.1.1.1"));
    }
}

//! Computed ("special") properties derived from the environment graph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::model::{Component, Environment, Property};
use crate::output::OutputLayout;
use crate::sources::LazyComponentTree;

/// Port offset of the environment.
pub const PORT_OFFSET: &str = "portOffset";
/// Environment name.
pub const ENV: &str = "env";
/// Component name.
pub const NAME: &str = "name";
/// 1-based position of the component in its group.
pub const ORDER: &str = "order";
/// Group name.
pub const GROUP: &str = "group";
/// Absolute output directory of the component.
pub const SERVICE_DIR: &str = "serviceDir";
/// Group ip.
pub const IP: &str = "ip";
/// Absolute parent of the components directory.
pub const CONFIG_DIR: &str = "configDir";
/// Absolute source folder of the component.
pub const FOLDER: &str = "folder";
/// User home directory.
pub const USER_HOME: &str = "userHome";

/// Specials that depend only on the component and the run.
pub const COMPONENT_SCOPED: [&str; 5] = [NAME, SERVICE_DIR, CONFIG_DIR, FOLDER, USER_HOME];

/// Specials that depend on the environment descriptor.
pub const ENVIRONMENT_SCOPED: [&str; 5] = [ENV, PORT_OFFSET, ORDER, GROUP, IP];

/// Everything needed to compute specials besides the component and its
/// environment.
#[derive(Debug)]
pub struct SpecialContext {
    layout: OutputLayout,
    config_dir: PathBuf,
    tree: Arc<LazyComponentTree>,
    user_home: Option<PathBuf>,
}

impl SpecialContext {
    /// Creates a context; `userHome` comes from the current user.
    #[must_use]
    pub fn new(layout: OutputLayout, config_dir: impl Into<PathBuf>, tree: Arc<LazyComponentTree>) -> Self {
        Self {
            layout,
            config_dir: config_dir.into(),
            tree,
            user_home: home::home_dir(),
        }
    }

    /// Overrides the home directory.
    #[must_use]
    pub fn with_user_home(mut self, home: Option<PathBuf>) -> Self {
        self.user_home = home;
        self
    }

    /// Every special property of a component in an environment, in table
    /// order. Keys whose value is unknown (no port offset, no group, no ip,
    /// no source folder) are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the component tree cannot be scanned.
    pub fn properties(&self, component: &Component, environment: &Environment) -> Result<Vec<Property>> {
        let env = environment.name();
        let group = environment.group_of(component.name());
        let mut out = Vec::with_capacity(10);

        if let Some(offset) = environment.port_offset() {
            out.push(Property::system(PORT_OFFSET, offset.to_string(), env, false));
        }
        out.push(Property::system(ENV, env, env, false));
        out.push(Property::system(NAME, component.name(), env, false));
        if let Some(group) = group {
            if let Some(order) = group.order_of(component.name()) {
                out.push(Property::system(ORDER, order.to_string(), env, true));
            }
            out.push(Property::system(GROUP, group.name(), env, true));
        }
        out.push(Property::system(
            SERVICE_DIR,
            slash(&self.layout.service_dir(component)),
            env,
            true,
        ));
        if let Some(ip) = group.and_then(|g| g.ip()) {
            out.push(Property::system(IP, ip, env, true));
        }
        out.push(Property::system(CONFIG_DIR, slash(&self.config_dir), env, true));
        let tree = self.tree.get()?;
        if let Some(folder) = tree.folder(component.component_type()) {
            out.push(Property::system(FOLDER, slash(folder), env, true));
        }
        if let Some(home) = &self.user_home {
            out.push(Property::system(USER_HOME, slash(home), env, true));
        }
        Ok(out)
    }

    /// One special property, if `key` names one with a known value.
    ///
    /// # Errors
    ///
    /// Same as [`properties`](Self::properties).
    pub fn property(
        &self,
        key: &str,
        component: &Component,
        environment: &Environment,
    ) -> Result<Option<Property>> {
        if !is_special(key) {
            return Ok(None);
        }
        Ok(self
            .properties(component, environment)?
            .into_iter()
            .find(|p| p.key() == key))
    }
}

/// Whether `key` names a special property.
#[must_use]
pub fn is_special(key: &str) -> bool {
    COMPONENT_SCOPED.contains(&key) || ENVIRONMENT_SCOPED.contains(&key)
}

/// Renders a path with forward slashes.
#[must_use]
pub fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

//! Build planning.
//!
//! A plan lists every (component, config type, environment) triple a build
//! will generate, without resolving anything. Plans can be inspected, printed
//! for a dry run, or handed to a [`BuildExecutor`](super::BuildExecutor).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::model::{Component, ConfigType};
use crate::session::Session;

/// One artifact to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
    /// The component.
    pub component: Component,
    /// Config type name.
    pub config_type: String,
    /// Environment name.
    pub environment: String,
}

impl BuildTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(
        component: Component,
        config_type: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            component,
            config_type: config_type.into(),
            environment: environment.into(),
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}[{}]",
            self.component.name(),
            self.config_type,
            self.environment
        )
    }
}

/// What to build.
///
/// Empty lists mean "everything": all environments, every component declared
/// in each environment, every registered config type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequest {
    /// Environments to build.
    pub environments: Vec<String>,
    /// Component names to restrict the build to.
    pub components: Vec<String>,
    /// Config type names to restrict the build to.
    pub config_types: Vec<String>,
}

impl BuildRequest {
    /// A request for the given environments.
    #[must_use]
    pub fn new(environments: Vec<String>) -> Self {
        Self {
            environments,
            ..Self::default()
        }
    }

    /// Restricts the build to some components.
    #[must_use]
    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.components = components;
        self
    }

    /// Restricts the build to some config types.
    #[must_use]
    pub fn with_config_types(mut self, config_types: Vec<String>) -> Self {
        self.config_types = config_types;
        self
    }
}

/// A complete build plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildPlan {
    /// A human-readable description of the build.
    pub description: String,

    /// Triples to generate, in build order.
    pub targets: Vec<BuildTarget>,

    /// Warnings to communicate to the user.
    pub warnings: Vec<String>,
}

impl BuildPlan {
    /// Creates an empty plan.
    ///
    /// # Examples
    ///
    /// ```
    /// use fleetcfg::operations::BuildPlan;
    ///
    /// let plan = BuildPlan::new("Build prod");
    /// assert_eq!(plan.description, "Build prod");
    /// assert!(plan.is_empty());
    /// ```
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            targets: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds a target.
    #[must_use]
    pub fn add_target(mut self, target: BuildTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Adds a warning.
    #[must_use]
    pub fn add_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Checks if the plan has no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns the number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Builds the plan for a request.
    ///
    /// A triple is planned when the component's source folder has at least
    /// one file of the config type. Requested components missing from an
    /// environment, declared components without sources, and artifacts
    /// generated for more than one environment produce warnings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvironmentNotFound`](crate::Error::EnvironmentNotFound)
    /// for unknown requested environments, [`Error::NotFound`](crate::Error::NotFound)
    /// for unknown config types, and component tree scan errors.
    pub fn for_request(session: &Session, request: &BuildRequest) -> Result<Self> {
        let environments = if request.environments.is_empty() {
            session.environments().environment_names()?
        } else {
            request.environments.clone()
        };

        let config_types: Vec<&ConfigType> = if request.config_types.is_empty() {
            session.config_types().collect()
        } else {
            request
                .config_types
                .iter()
                .map(|name| session.config_type(name))
                .collect::<Result<_>>()?
        };

        let tree = session.component_tree()?;
        let mut plan = Self::new(format!("Generate configuration for {}", environments.join(", ")));
        let mut writers: BTreeMap<PathBuf, Vec<&str>> = BTreeMap::new();

        for env_name in &environments {
            let env = session.environments().get_by_name(env_name)?;

            for requested in &request.components {
                if !env.contains(requested) {
                    plan = plan.add_warning(format!(
                        "component '{requested}' is not declared in environment '{env_name}'"
                    ));
                }
            }

            let selected = env.components().filter(|c| {
                request.components.is_empty() || request.components.iter().any(|r| r == c.name())
            });
            for component in selected {
                if tree.folder(component.component_type()).is_none() {
                    plan = plan.add_warning(format!(
                        "no sources for component '{component}' in environment '{env_name}'"
                    ));
                    continue;
                }
                let files = tree.files(component.component_type());
                for config_type in &config_types {
                    if files.iter().any(|f| config_type.matches(f)) {
                        writers
                            .entry(session.layout().artifact_path(component, config_type))
                            .or_default()
                            .push(env_name.as_str());
                        plan = plan.add_target(BuildTarget::new(
                            component.clone(),
                            config_type.name(),
                            env_name.as_str(),
                        ));
                    }
                }
            }
        }

        for (path, envs) in writers.into_iter().filter(|(_, envs)| envs.len() > 1) {
            plan = plan.add_warning(format!(
                "{} is generated for environments {}; '{}' is written last",
                path.display(),
                envs.join(", "),
                envs[envs.len() - 1]
            ));
        }

        log::debug!("planned {} targets", plan.len());
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        let target = BuildTarget::new(Component::new("billing"), "app", "prod");
        assert_eq!(target.to_string(), "billing/app[prod]");
    }

    #[test]
    fn test_plan_builder() {
        let plan = BuildPlan::new("Test")
            .add_target(BuildTarget::new(Component::new("a"), "app", "dev"))
            .add_warning("careful");
        assert_eq!(plan.len(), 1);
        assert!(!plan.is_empty());
        assert_eq!(plan.warnings, ["careful"]);
    }

    #[test]
    fn test_request_builder() {
        let request = BuildRequest::new(vec!["prod".into()])
            .with_components(vec!["billing".into()])
            .with_config_types(vec!["app".into()]);
        assert_eq!(request.environments, ["prod"]);
        assert_eq!(request.components, ["billing"]);
        assert_eq!(request.config_types, ["app"]);
    }
}

//! Placeholder strategies.
//!
//! A [`CompositeStrategy`] asks its strategies in a fixed order and takes the
//! first answer:
//!
//! 1. operator overrides,
//! 2. component-scoped specials,
//! 3. environment-scoped specials,
//! 4. the target component's own properties,
//! 5. process environment variables.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::environments::{find_environment, EnvironmentProvider};
use crate::error::Result;
use crate::model::{Component, ConfigType, Source};
use crate::resolve::placeholder::Placeholder;
use crate::resolve::specials::{SpecialContext, COMPONENT_SCOPED, ENVIRONMENT_SCOPED};
use crate::sources::RawConfigProvider;

/// Where a placeholder is being resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Component whose value contains the placeholder.
    pub component: &'a Component,
    /// Environment being resolved.
    pub environment: &'a str,
    /// Config type being resolved.
    pub config_type: &'a ConfigType,
}

impl ResolutionContext<'_> {
    /// Name of the component a placeholder refers to.
    #[must_use]
    pub fn target_name<'p>(&'p self, placeholder: &'p Placeholder) -> &'p str {
        placeholder.component().unwrap_or(self.component.name())
    }

    /// Environment a placeholder refers to.
    #[must_use]
    pub fn target_environment<'p>(&'p self, placeholder: &'p Placeholder) -> &'p str {
        placeholder.environment().unwrap_or(self.environment)
    }
}

/// A value found for a placeholder, with the context its own placeholders
/// must be resolved in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The unresolved value.
    pub value: String,
    /// Component owning the value.
    pub component: Component,
    /// Environment owning the value.
    pub environment: String,
    /// Config type owning the value.
    pub config_type: String,
    /// Strategy family that produced the value.
    pub source: Source,
}

/// One way of resolving a placeholder.
pub trait PlaceholderStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns a value for the placeholder, or `None` to let the next
    /// strategy try.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that must stop resolution, such
    /// as unreadable sources.
    fn try_resolve(
        &self,
        placeholder: &Placeholder,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<Resolution>>;
}

/// Resolves the component a placeholder targets, keeping the source folder
/// alias declared in its environment.
fn target_component(
    environments: &dyn EnvironmentProvider,
    placeholder: &Placeholder,
    ctx: &ResolutionContext<'_>,
) -> Result<Component> {
    let Some(name) = placeholder.component() else {
        return Ok(ctx.component.clone());
    };
    let env = find_environment(environments, ctx.target_environment(placeholder))?;
    Ok(env
        .and_then(|e| e.component(name).cloned())
        .unwrap_or_else(|| Component::new(name)))
}

/// Operator-supplied values, keyed `component@key` or `key`.
///
/// Placeholders inside an override value aimed at another component are
/// resolved in that component's context. With an environment provider the
/// target keeps the source folder alias declared in its environment.
#[derive(Clone, Default)]
pub struct OverrideStrategy {
    overrides: BTreeMap<String, String>,
    environments: Option<Arc<dyn EnvironmentProvider>>,
}

impl OverrideStrategy {
    /// Creates the strategy.
    #[must_use]
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self {
            overrides,
            environments: None,
        }
    }

    /// Looks up qualified targets in `environments`.
    #[must_use]
    pub fn with_environments(mut self, environments: Arc<dyn EnvironmentProvider>) -> Self {
        self.environments = Some(environments);
        self
    }
}

impl PlaceholderStrategy for OverrideStrategy {
    fn name(&self) -> &'static str {
        "override"
    }

    fn try_resolve(
        &self,
        placeholder: &Placeholder,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<Resolution>> {
        let target = ctx.target_name(placeholder);
        let qualified_key = format!("{target}@{}", placeholder.key());

        let value = self.overrides.get(&qualified_key).or_else(|| {
            if placeholder.is_qualified() {
                None
            } else {
                self.overrides.get(placeholder.key())
            }
        });

        let Some(value) = value else {
            return Ok(None);
        };
        let component = match (&self.environments, placeholder.component()) {
            (Some(environments), Some(_)) => {
                target_component(environments.as_ref(), placeholder, ctx)?
            }
            (None, Some(_)) => Component::new(target),
            (_, None) => ctx.component.clone(),
        };
        Ok(Some(Resolution {
            value: value.clone(),
            component,
            environment: ctx.target_environment(placeholder).to_string(),
            config_type: ctx.config_type.name().to_string(),
            source: Source::Override,
        }))
    }
}

/// Which set of specials a [`SpecialStrategy`] answers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialScope {
    /// `name`, `serviceDir`, `configDir`, `folder`, `userHome`.
    Component,
    /// `env`, `portOffset`, `order`, `group`, `ip`.
    Environment,
}

impl SpecialScope {
    fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Component => &COMPONENT_SCOPED,
            Self::Environment => &ENVIRONMENT_SCOPED,
        }
    }
}

/// Computed properties of the target component.
///
/// Falls through when the target environment is unknown.
pub struct SpecialStrategy {
    scope: SpecialScope,
    environments: Arc<dyn EnvironmentProvider>,
    specials: Arc<SpecialContext>,
}

impl SpecialStrategy {
    /// Creates the strategy for one scope.
    #[must_use]
    pub fn new(
        scope: SpecialScope,
        environments: Arc<dyn EnvironmentProvider>,
        specials: Arc<SpecialContext>,
    ) -> Self {
        Self {
            scope,
            environments,
            specials,
        }
    }
}

impl PlaceholderStrategy for SpecialStrategy {
    fn name(&self) -> &'static str {
        match self.scope {
            SpecialScope::Component => "component-specials",
            SpecialScope::Environment => "environment-specials",
        }
    }

    fn try_resolve(
        &self,
        placeholder: &Placeholder,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<Resolution>> {
        if !self.scope.keys().contains(&placeholder.key()) {
            return Ok(None);
        }
        let env_name = ctx.target_environment(placeholder);
        let Some(env) = find_environment(self.environments.as_ref(), env_name)? else {
            return Ok(None);
        };
        let component = target_component(self.environments.as_ref(), placeholder, ctx)?;

        let property = self
            .specials
            .property(placeholder.key(), &component, env.as_ref())?;
        Ok(property.map(|p| Resolution {
            value: p.value().to_string(),
            component,
            environment: env_name.to_string(),
            config_type: ctx.config_type.name().to_string(),
            source: Source::System,
        }))
    }
}

/// The target component's authored properties: first in the current config
/// type, then in every other registered type.
pub struct StandardStrategy {
    environments: Arc<dyn EnvironmentProvider>,
    raw: Arc<RawConfigProvider>,
    config_types: Arc<[ConfigType]>,
}

impl StandardStrategy {
    /// Creates the strategy.
    #[must_use]
    pub fn new(
        environments: Arc<dyn EnvironmentProvider>,
        raw: Arc<RawConfigProvider>,
        config_types: Arc<[ConfigType]>,
    ) -> Self {
        Self {
            environments,
            raw,
            config_types,
        }
    }
}

impl PlaceholderStrategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn try_resolve(
        &self,
        placeholder: &Placeholder,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<Resolution>> {
        let component = target_component(self.environments.as_ref(), placeholder, ctx)?;
        let env_name = ctx.target_environment(placeholder);

        let current = std::iter::once(ctx.config_type);
        let others = self
            .config_types
            .iter()
            .filter(|t| t.name() != ctx.config_type.name());

        for config_type in current.chain(others) {
            let properties = match self.raw.properties_for_env(&component, config_type, env_name) {
                Ok(properties) => properties,
                Err(e) if e.is_not_found() => return Ok(None),
                Err(e) => return Err(e),
            };
            if let Some(property) = properties.get(placeholder.key()) {
                return Ok(Some(Resolution {
                    value: property.value().to_string(),
                    component,
                    environment: env_name.to_string(),
                    config_type: config_type.name().to_string(),
                    source: Source::File,
                }));
            }
        }
        Ok(None)
    }
}

/// Process environment variables, for unqualified placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvVarStrategy;

impl PlaceholderStrategy for EnvVarStrategy {
    fn name(&self) -> &'static str {
        "env-var"
    }

    fn try_resolve(
        &self,
        placeholder: &Placeholder,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<Resolution>> {
        if placeholder.is_qualified() {
            return Ok(None);
        }
        Ok(std::env::var(placeholder.key()).ok().map(|value| Resolution {
            value,
            component: ctx.component.clone(),
            environment: ctx.environment.to_string(),
            config_type: ctx.config_type.name().to_string(),
            source: Source::System,
        }))
    }
}

/// Strategies asked in order; the first answer wins.
pub struct CompositeStrategy {
    strategies: Vec<Box<dyn PlaceholderStrategy>>,
}

impl std::fmt::Debug for CompositeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("CompositeStrategy")
            .field("strategies", &names)
            .finish()
    }
}

impl CompositeStrategy {
    /// Wraps an explicit strategy list.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn PlaceholderStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: overrides, component specials, environment
    /// specials, authored properties, environment variables.
    #[must_use]
    pub fn standard(
        overrides: BTreeMap<String, String>,
        environments: Arc<dyn EnvironmentProvider>,
        specials: Arc<SpecialContext>,
        raw: Arc<RawConfigProvider>,
        config_types: Arc<[ConfigType]>,
    ) -> Self {
        Self::new(vec![
            Box::new(OverrideStrategy::new(overrides).with_environments(Arc::clone(&environments))),
            Box::new(SpecialStrategy::new(
                SpecialScope::Component,
                Arc::clone(&environments),
                Arc::clone(&specials),
            )),
            Box::new(SpecialStrategy::new(
                SpecialScope::Environment,
                Arc::clone(&environments),
                specials,
            )),
            Box::new(StandardStrategy::new(environments, raw, config_types)),
            Box::new(EnvVarStrategy),
        ])
    }

    /// Asks each strategy in turn.
    ///
    /// # Errors
    ///
    /// Returns the first strategy error.
    pub fn resolve(
        &self,
        placeholder: &Placeholder,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<Resolution>> {
        for strategy in &self.strategies {
            if let Some(resolution) = strategy.try_resolve(placeholder, ctx)? {
                log::debug!(
                    "{placeholder} in {}[{}] resolved by {}",
                    ctx.component,
                    ctx.environment,
                    strategy.name()
                );
                return Ok(Some(resolution));
            }
        }
        Ok(None)
    }
}

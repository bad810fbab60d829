//! Fully resolved property sets.

use std::sync::Arc;

use crate::cache::SingleFlight;
use crate::error::{Error, Result};
use crate::model::{Component, ConfigType, PropertyMap};
use crate::resolve::expression::{ResolutionChain, ResolverRegistry};
use crate::resolve::injector::SpecialPropertyInjector;
use crate::resolve::placeholder::contains_placeholder;
use crate::sources::RawConfigProvider;

type TripleKey = (String, String, String, String);

/// Produces the final property set of a (component, config type,
/// environment) triple.
///
/// Each triple is computed at most once; concurrent requests for the same
/// triple wait for the first and share its outcome, including failures.
#[derive(Debug)]
pub struct ResolvedConfigProvider {
    raw: Arc<RawConfigProvider>,
    injector: SpecialPropertyInjector,
    registry: Arc<ResolverRegistry>,
    cache: SingleFlight<TripleKey, Result<Arc<PropertyMap>>>,
}

impl ResolvedConfigProvider {
    /// Creates a provider.
    #[must_use]
    pub fn new(
        raw: Arc<RawConfigProvider>,
        injector: SpecialPropertyInjector,
        registry: Arc<ResolverRegistry>,
    ) -> Self {
        Self {
            raw,
            injector,
            registry,
            cache: SingleFlight::new(),
        }
    }

    /// Raw properties, overlaid for the environment, plus specials, with
    /// every placeholder expanded.
    ///
    /// # Errors
    ///
    /// Returns the first error hit while reading, injecting or resolving.
    pub fn resolved_properties(
        &self,
        component: &Component,
        config_type: &ConfigType,
        environment: &str,
    ) -> Result<Arc<PropertyMap>> {
        let key = (
            component.name().to_string(),
            component.component_type().to_string(),
            config_type.name().to_string(),
            environment.to_string(),
        );
        self.cache.get_or_compute(key, || {
            self.compute(component, config_type, environment).map(Arc::new)
        })
    }

    fn compute(
        &self,
        component: &Component,
        config_type: &ConfigType,
        environment: &str,
    ) -> Result<PropertyMap> {
        let resolver = self
            .registry
            .get(config_type.name())
            .ok_or_else(|| Error::NotFound {
                resource: format!("config type '{}'", config_type.name()),
            })?;

        let raw = self.raw.properties_for_env(component, config_type, environment)?;
        let injected = self.injector.inject(component, environment, &raw)?;

        let mut resolved = PropertyMap::new();
        for property in &injected {
            if !contains_placeholder(property.value()) {
                resolved.insert(property.clone());
                continue;
            }
            let mut chain = ResolutionChain::rooted(
                component,
                resolver.config_type(),
                environment,
                property.key(),
            );
            let value = resolver.resolve(
                &self.registry,
                property.value(),
                component,
                environment,
                &mut chain,
            )?;
            resolved.insert(property.with_value(value));
        }

        log::debug!(
            "resolved {} {} properties for {component}[{environment}]",
            resolved.len(),
            config_type.name()
        );
        Ok(resolved)
    }
}

//! Overlays special properties onto raw property sets.

use std::sync::Arc;

use crate::environments::{find_environment, EnvironmentProvider};
use crate::error::Result;
use crate::model::{Component, PropertyMap};
use crate::resolve::specials::SpecialContext;

/// Adds computed properties to a component's set without touching authored
/// keys.
pub struct SpecialPropertyInjector {
    environments: Arc<dyn EnvironmentProvider>,
    specials: Arc<SpecialContext>,
}

impl std::fmt::Debug for SpecialPropertyInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialPropertyInjector")
            .field("specials", &self.specials)
            .finish_non_exhaustive()
    }
}

impl SpecialPropertyInjector {
    /// Creates an injector.
    #[must_use]
    pub fn new(environments: Arc<dyn EnvironmentProvider>, specials: Arc<SpecialContext>) -> Self {
        Self {
            environments,
            specials,
        }
    }

    /// Returns `properties` plus every special property whose key is absent.
    ///
    /// An unknown environment adds nothing.
    ///
    /// # Errors
    ///
    /// Propagates environment lookup errors other than "not found", and
    /// component tree scan errors.
    pub fn inject(
        &self,
        component: &Component,
        environment: &str,
        properties: &PropertyMap,
    ) -> Result<PropertyMap> {
        let mut out = properties.clone();
        let Some(env) = find_environment(self.environments.as_ref(), environment)? else {
            log::debug!("skipping special properties for {component}: no environment '{environment}'");
            return Ok(out);
        };

        for special in self.specials.properties(component, &env)? {
            let key = special.key().to_string();
            if !out.insert_if_absent(special) {
                log::debug!("{component}[{environment}] keeps authored '{key}'");
            }
        }
        Ok(out)
    }
}

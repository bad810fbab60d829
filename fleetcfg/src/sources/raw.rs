//! Raw (unresolved) property sets per component and config type.

use std::path::Path;
use std::sync::Arc;

use crate::cache::SingleFlight;
use crate::error::{Error, Result};
use crate::model::{Component, ConfigType, PropertyMap, BASE_ENVIRONMENT};
use crate::sources::reader::open_reader;
use crate::sources::tree::LazyComponentTree;

type BaseKey = (String, String);
type OverlayKey = (String, String, String);

/// Reads the authored property templates of components.
///
/// Source files named `<base>.<env>.<ext>` are overlays that only apply to
/// environment `<env>`; every other file of the config type forms the base
/// set. Results are cached for the life of the provider.
#[derive(Debug)]
pub struct RawConfigProvider {
    tree: Arc<LazyComponentTree>,
    base: SingleFlight<BaseKey, Result<Arc<PropertyMap>>>,
    overlaid: SingleFlight<OverlayKey, Result<Arc<PropertyMap>>>,
}

impl RawConfigProvider {
    /// Creates a provider over a component tree.
    #[must_use]
    pub fn new(tree: Arc<LazyComponentTree>) -> Self {
        Self {
            tree,
            base: SingleFlight::new(),
            overlaid: SingleFlight::new(),
        }
    }

    /// The environment-agnostic properties of a component, as authored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the component type has no source
    /// folder, or any error raised while reading its files.
    pub fn properties(
        &self,
        component: &Component,
        config_type: &ConfigType,
    ) -> Result<Arc<PropertyMap>> {
        let key = (
            component.component_type().to_string(),
            config_type.name().to_string(),
        );
        self.base.get_or_compute(key, || {
            self.read(component, config_type, None).map(Arc::new)
        })
    }

    /// The base properties overlaid with the component's files for
    /// `environment`. Use [`properties`](Self::properties) for the set
    /// without any environment.
    ///
    /// # Errors
    ///
    /// Same as [`properties`](Self::properties).
    pub fn properties_for_env(
        &self,
        component: &Component,
        config_type: &ConfigType,
        environment: &str,
    ) -> Result<Arc<PropertyMap>> {
        let base = self.properties(component, config_type)?;
        let key = (
            component.component_type().to_string(),
            config_type.name().to_string(),
            environment.to_string(),
        );
        self.overlaid.get_or_compute(key, || {
            let overlay = self.read(component, config_type, Some(environment))?;
            if overlay.is_empty() {
                return Ok(Arc::clone(&base));
            }
            let mut merged = (*base).clone();
            merged.extend(overlay.iter().cloned());
            Ok(Arc::new(merged))
        })
    }

    fn read(
        &self,
        component: &Component,
        config_type: &ConfigType,
        environment: Option<&str>,
    ) -> Result<PropertyMap> {
        let tree = self.tree.get()?;
        let component_type = component.component_type();
        if tree.folder(component_type).is_none() {
            return Err(Error::NotFound {
                resource: format!("sources for component '{component}'"),
            });
        }

        let mut properties = PropertyMap::new();
        let files = tree
            .files(component_type)
            .iter()
            .filter(|f| config_type.matches(f))
            .filter(|f| overlay_environment(f) == environment);
        for file in files {
            let label = environment.unwrap_or(BASE_ENVIRONMENT);
            let reader = open_reader(file, label)?;
            properties.extend(reader.properties());
        }

        log::debug!(
            "read {} {} properties for {component} ({})",
            properties.len(),
            config_type.name(),
            environment.unwrap_or(BASE_ENVIRONMENT)
        );
        Ok(properties)
    }
}

/// The environment an overlay file applies to: the last dotted segment of
/// the file stem, if there is more than one.
fn overlay_environment(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit_once('.')
        .map(|(_, env)| env)
        .filter(|env| !env.is_empty())
}

//! Per-run state.
//!
//! A [`Session`] owns every cache used while generating artifacts: parsed
//! environments, the component tree, raw and resolved property sets and the
//! expression resolvers' memo tables. Create one per run and drop it when the
//! run ends; never share one between runs targeting different destinations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::environments::{find_environment, EnvironmentProvider, FileEnvironmentProvider};
use crate::error::{Error, Result};
use crate::model::{standard_types, Component, ConfigType, PropertyMap};
use crate::output::{ChangeReport, DiffSerializer, OutputLayout};
use crate::resolve::{
    CompositeStrategy, ResolvedConfigProvider, ResolverRegistry, SpecialContext,
    SpecialPropertyInjector,
};
use crate::sources::{ComponentTree, LazyComponentTree, RawConfigProvider};

/// Default components directory, relative to the source root.
pub const DEFAULT_COMPONENTS_DIR: &str = "components";

/// Default environments directory, relative to the source root.
pub const DEFAULT_ENVIRONMENTS_DIR: &str = "envs";

/// Inputs of a session.
///
/// Relative directories are resolved against the source root; a relative
/// destination is resolved against the current directory.
///
/// # Examples
///
/// ```
/// use fleetcfg::session::SessionOptions;
///
/// let options = SessionOptions::new("configs", "build")
///     .with_service_inner_dir("conf")
///     .with_override("billing@port", "9000");
/// assert_eq!(options.overrides.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Root of the source tree.
    pub source_root: PathBuf,
    /// Component sources directory.
    pub components_dir: PathBuf,
    /// Environment descriptors directory.
    pub environments_dir: PathBuf,
    /// Destination root.
    pub destination: PathBuf,
    /// Optional subdirectory of each service directory.
    pub service_inner_dir: Option<PathBuf>,
    /// Registered config types.
    pub config_types: Vec<ConfigType>,
    /// Operator overrides (`component@key` or `key`).
    pub overrides: BTreeMap<String, String>,
    /// Report changes without writing.
    pub dry_run: bool,
    /// Home directory used for `userHome`; `None` means the current user's.
    pub user_home: Option<PathBuf>,
}

impl SessionOptions {
    /// Options with standard directories and config types.
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            components_dir: PathBuf::from(DEFAULT_COMPONENTS_DIR),
            environments_dir: PathBuf::from(DEFAULT_ENVIRONMENTS_DIR),
            destination: destination.into(),
            service_inner_dir: None,
            config_types: standard_types(),
            overrides: BTreeMap::new(),
            dry_run: false,
            user_home: None,
        }
    }

    /// Sets the per-service subdirectory.
    #[must_use]
    pub fn with_service_inner_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.service_inner_dir = Some(dir.into());
        self
    }

    /// Adds an override.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Replaces the registered config types.
    #[must_use]
    pub fn with_config_types(mut self, config_types: Vec<ConfigType>) -> Self {
        self.config_types = config_types;
        self
    }

    /// Enables dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Pins the home directory used for `userHome`.
    #[must_use]
    pub fn with_user_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.user_home = Some(home.into());
        self
    }

    /// The components directory, resolved against the source root.
    #[must_use]
    pub fn components_path(&self) -> PathBuf {
        self.source_root.join(&self.components_dir)
    }

    /// The directory holding the components directory, exposed as
    /// `configDir`.
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        let components = self.components_path();
        components
            .parent()
            .map_or_else(|| self.source_root.clone(), Path::to_path_buf)
    }

    /// The environments directory, resolved against the source root.
    #[must_use]
    pub fn environments_path(&self) -> PathBuf {
        self.source_root.join(&self.environments_dir)
    }
}

/// State of one generation run.
pub struct Session {
    options: SessionOptions,
    environments: Arc<dyn EnvironmentProvider>,
    tree: Arc<LazyComponentTree>,
    raw: Arc<RawConfigProvider>,
    registry: Arc<ResolverRegistry>,
    resolved: ResolvedConfigProvider,
    serializer: DiffSerializer,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Opens a session reading environments from the environments directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory is needed and unavailable,
    /// or no config types are registered.
    pub fn new(options: SessionOptions) -> Result<Self> {
        let envs = absolute(&options.environments_path())?;
        Self::with_environment_provider(options, Arc::new(FileEnvironmentProvider::new(envs)))
    }

    /// Opens a session over an explicit environment provider.
    ///
    /// # Errors
    ///
    /// Same as [`Session::new`].
    pub fn with_environment_provider(
        mut options: SessionOptions,
        environments: Arc<dyn EnvironmentProvider>,
    ) -> Result<Self> {
        if options.config_types.is_empty() {
            return Err(Error::Validation {
                field: "config_types".into(),
                message: "at least one config type is required".into(),
            });
        }
        options.source_root = absolute(&options.source_root)?;
        options.destination = absolute(&options.destination)?;

        let mut layout = OutputLayout::new(&options.destination);
        if let Some(inner) = &options.service_inner_dir {
            layout = layout.with_service_inner_dir(inner);
        }

        let tree = Arc::new(LazyComponentTree::new(options.components_path()));
        let raw = Arc::new(RawConfigProvider::new(Arc::clone(&tree)));

        let mut specials =
            SpecialContext::new(layout.clone(), options.config_dir(), Arc::clone(&tree));
        if let Some(home) = &options.user_home {
            specials = specials.with_user_home(Some(home.clone()));
        }
        let specials = Arc::new(specials);

        let config_types: Arc<[ConfigType]> = options.config_types.clone().into();
        let strategy = CompositeStrategy::standard(
            options.overrides.clone(),
            Arc::clone(&environments),
            Arc::clone(&specials),
            Arc::clone(&raw),
            Arc::clone(&config_types),
        );
        let registry = Arc::new(ResolverRegistry::new(&config_types, strategy));
        let injector = SpecialPropertyInjector::new(Arc::clone(&environments), specials);
        let resolved =
            ResolvedConfigProvider::new(Arc::clone(&raw), injector, Arc::clone(&registry));
        let serializer = DiffSerializer::new(layout).with_dry_run(options.dry_run);

        log::debug!(
            "session: sources {}, destination {}",
            options.source_root.display(),
            options.destination.display()
        );

        Ok(Self {
            options,
            environments,
            tree,
            raw,
            registry,
            resolved,
            serializer,
        })
    }

    /// The options the session was opened with, with absolute paths.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The environment provider.
    #[must_use]
    pub fn environments(&self) -> &dyn EnvironmentProvider {
        self.environments.as_ref()
    }

    /// The component tree, scanned on first use.
    ///
    /// # Errors
    ///
    /// Returns the scan error.
    pub fn component_tree(&self) -> Result<Arc<ComponentTree>> {
        self.tree.get()
    }

    /// Registered config types, in registration order.
    pub fn config_types(&self) -> impl Iterator<Item = &ConfigType> {
        self.registry.config_types()
    }

    /// Looks up a registered config type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown names.
    pub fn config_type(&self, name: &str) -> Result<&ConfigType> {
        self.registry
            .get(name)
            .map(|r| r.config_type())
            .ok_or_else(|| Error::NotFound {
                resource: format!("config type '{name}'"),
            })
    }

    /// The destination layout.
    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        self.serializer.layout()
    }

    /// Resolves a component name to the component declared in an
    /// environment, keeping its source folder alias. Undeclared names, and
    /// unknown environments, give a component whose type equals its name.
    ///
    /// # Errors
    ///
    /// Propagates environment lookup errors other than "not found".
    pub fn component(&self, environment: &str, name: &str) -> Result<Component> {
        Ok(find_environment(self.environments(), environment)?
            .and_then(|env| env.component(name).cloned())
            .unwrap_or_else(|| Component::new(name)))
    }

    /// Raw properties of a component, overlaid for an environment.
    ///
    /// # Errors
    ///
    /// See [`RawConfigProvider::properties_for_env`].
    pub fn raw_properties(
        &self,
        component: &Component,
        config_type: &ConfigType,
        environment: &str,
    ) -> Result<Arc<PropertyMap>> {
        self.raw.properties_for_env(component, config_type, environment)
    }

    /// Fully resolved properties of a triple.
    ///
    /// # Errors
    ///
    /// See [`ResolvedConfigProvider::resolved_properties`].
    pub fn resolved_properties(
        &self,
        component: &Component,
        config_type: &ConfigType,
        environment: &str,
    ) -> Result<Arc<PropertyMap>> {
        self.resolved
            .resolved_properties(component, config_type, environment)
    }

    /// Resolves a triple and persists it if it changed.
    ///
    /// # Errors
    ///
    /// Returns resolution and write errors.
    pub fn generate(
        &self,
        component: &Component,
        config_type: &ConfigType,
        environment: &str,
    ) -> Result<ChangeReport> {
        let resolved = self.resolved_properties(component, config_type, environment)?;
        self.serializer.write(component, config_type, &resolved)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
    Ok(cwd.join(path))
}

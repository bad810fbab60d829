//! Environment lookup.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::SingleFlight;
use crate::environments::descriptor::{EnvironmentDescriptor, DESCRIPTOR_EXTENSIONS};
use crate::error::{Error, Result};
use crate::model::{Component, ComponentGroup, Environment};

/// Read access to the environment graph.
///
/// `get_by_name` fails with [`Error::EnvironmentNotFound`] for unknown names;
/// whether that is fatal is the caller's decision (see [`find_environment`]).
#[cfg_attr(test, mockall::automock)]
pub trait EnvironmentProvider: Send + Sync {
    /// Names of every known environment, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment list cannot be read.
    fn environment_names(&self) -> Result<Vec<String>>;

    /// Looks up an environment by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvironmentNotFound`] for unknown names, or any
    /// error raised while loading the descriptor.
    fn get_by_name(&self, name: &str) -> Result<Arc<Environment>>;
}

/// Looks up an environment, treating "not found" as absence.
///
/// # Errors
///
/// Propagates every error except [`Error::EnvironmentNotFound`].
pub fn find_environment(
    provider: &dyn EnvironmentProvider,
    name: &str,
) -> Result<Option<Arc<Environment>>> {
    match provider.get_by_name(name) {
        Ok(env) => Ok(Some(env)),
        Err(e) if e.is_environment_not_found() => {
            log::debug!("no descriptor for environment '{name}'");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Environments parsed from descriptor files in one directory.
///
/// Each environment is parsed at most once per provider; concurrent first
/// requests for the same name share the parse.
///
/// # Examples
///
/// ```no_run
/// use fleetcfg::environments::{EnvironmentProvider, FileEnvironmentProvider};
///
/// let provider = FileEnvironmentProvider::new("configs/envs");
/// let prod = provider.get_by_name("prod").unwrap();
/// println!("{} groups", prod.groups().len());
/// ```
#[derive(Debug)]
pub struct FileEnvironmentProvider {
    dir: PathBuf,
    cache: SingleFlight<String, Result<Arc<Environment>>>,
}

/// An environment descriptor with its include chain applied.
#[derive(Debug, Default)]
struct Flattened {
    port_offset: Option<i64>,
    ip: Option<String>,
    groups: Vec<FlatGroup>,
}

#[derive(Debug, Clone)]
struct FlatGroup {
    name: String,
    ip: Option<String>,
    members: Vec<String>,
}

impl FileEnvironmentProvider {
    /// Creates a provider reading descriptors from `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: SingleFlight::new(),
        }
    }

    /// The descriptor directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self, name: &str) -> Result<Environment> {
        let mut visiting = Vec::new();
        let flat = self.flatten(name, &mut visiting)?;

        let groups = flat
            .groups
            .into_iter()
            .map(|g| {
                ComponentGroup::new(g.name)
                    .with_optional_ip(g.ip.or_else(|| flat.ip.clone()))
                    .with_members(g.members.iter().map(|m| Component::parse(m)).collect())
            })
            .collect();

        log::debug!("loaded environment '{name}' from {}", self.dir.display());
        Environment::new(name, flat.port_offset, groups)
    }

    fn flatten(&self, name: &str, visiting: &mut Vec<String>) -> Result<Flattened> {
        if visiting.iter().any(|v| v == name) {
            visiting.push(name.to_string());
            return Err(Error::Validation {
                field: "include".into(),
                message: format!("environment include cycle: {}", visiting.join(" -> ")),
            });
        }

        let Some(path) = EnvironmentDescriptor::locate(&self.dir, name) else {
            return Err(match visiting.last() {
                None => Error::EnvironmentNotFound {
                    name: name.to_string(),
                },
                Some(child) => Error::Validation {
                    field: format!("{child}.include"),
                    message: format!("included environment '{name}' does not exist"),
                },
            });
        };
        let descriptor = EnvironmentDescriptor::load(&path)?;

        visiting.push(name.to_string());
        let mut flat = match &descriptor.include {
            Some(include) => {
                let mut base = self.flatten(&include.env, visiting)?;
                base.groups.retain(|g| !include.exclude.contains(&g.name));
                base
            }
            None => Flattened::default(),
        };
        visiting.pop();

        if descriptor.port_offset.is_some() {
            flat.port_offset = descriptor.port_offset;
        }
        if descriptor.ip.is_some() {
            flat.ip = descriptor.ip;
        }

        for (group_name, group) in descriptor.groups {
            let inherited = flat.groups.iter().position(|g| g.name == group_name);

            let mut members = match (group.components, inherited) {
                (Some(list), _) => list,
                (None, Some(i)) => flat.groups[i].members.clone(),
                (None, None) => Vec::new(),
            };
            for extra in group.append_components {
                if !members.contains(&extra) {
                    members.push(extra);
                }
            }
            members.retain(|m| {
                let member_name = Component::parse(m);
                !group
                    .exclude_components
                    .iter()
                    .any(|x| x == m || x == member_name.name())
            });

            let ip = group
                .ip
                .or_else(|| inherited.and_then(|i| flat.groups[i].ip.clone()));
            let merged = FlatGroup {
                name: group_name,
                ip,
                members,
            };
            match inherited {
                Some(i) => flat.groups[i] = merged,
                None => flat.groups.push(merged),
            }
        }

        Ok(flat)
    }
}

impl EnvironmentProvider for FileEnvironmentProvider {
    fn environment_names(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| Error::io(&self.dir, e))? {
            let path = entry.map_err(|e| Error::io(&self.dir, e))?.path();
            let is_descriptor = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| DESCRIPTOR_EXTENSIONS.contains(&e.to_lowercase().as_str()));
            if !path.is_file() || !is_descriptor {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn get_by_name(&self, name: &str) -> Result<Arc<Environment>> {
        self.cache
            .get_or_compute(name.to_string(), || self.load(name).map(Arc::new))
    }
}

/// Environments held in memory, for embedding and tests.
///
/// # Examples
///
/// ```
/// use fleetcfg::environments::{EnvironmentProvider, StaticEnvironmentProvider};
/// use fleetcfg::model::Environment;
///
/// let provider = StaticEnvironmentProvider::new(vec![
///     Environment::new("dev", None, vec![]).unwrap(),
/// ]);
/// assert!(provider.get_by_name("dev").is_ok());
/// assert!(provider.get_by_name("prod").unwrap_err().is_environment_not_found());
/// ```
#[derive(Debug, Default)]
pub struct StaticEnvironmentProvider {
    environments: HashMap<String, Arc<Environment>>,
}

impl StaticEnvironmentProvider {
    /// Creates a provider over a fixed set of environments.
    #[must_use]
    pub fn new(environments: Vec<Environment>) -> Self {
        Self {
            environments: environments
                .into_iter()
                .map(|e| (e.name().to_string(), Arc::new(e)))
                .collect(),
        }
    }
}

impl EnvironmentProvider for StaticEnvironmentProvider {
    fn environment_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.environments.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn get_by_name(&self, name: &str) -> Result<Arc<Environment>> {
        self.environments
            .get(name)
            .cloned()
            .ok_or_else(|| Error::EnvironmentNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, contents: &str) {
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_unknown_environment_is_not_found() {
        let dir = TempDir::new().unwrap();
        let provider = FileEnvironmentProvider::new(dir.path());
        let err = provider.get_by_name("staging2").unwrap_err();
        assert!(err.is_environment_not_found());
    }

    #[test]
    fn test_find_environment_absorbs_not_found_only() {
        let mut mock = MockEnvironmentProvider::new();
        mock.expect_get_by_name()
            .withf(|name| name == "staging2")
            .returning(|name| {
                Err(Error::EnvironmentNotFound {
                    name: name.to_string(),
                })
            });
        mock.expect_get_by_name()
            .withf(|name| name == "broken")
            .returning(|_| {
                Err(Error::Parse {
                    path: PathBuf::from("envs/broken.yaml"),
                    message: "bad".into(),
                })
            });

        assert!(find_environment(&mock, "staging2").unwrap().is_none());
        assert!(find_environment(&mock, "broken").is_err());
    }

    #[test]
    fn test_load_groups_and_defaults() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "prod.yaml",
            "portOffset: 100\nip: 10.9.9.9\ncore:\n  ip: 10.0.0.5\n  components: [a, billing, c]\nedge:\n  components: [proxy]\n",
        );

        let provider = FileEnvironmentProvider::new(dir.path());
        let prod = provider.get_by_name("prod").unwrap();
        assert_eq!(prod.port_offset(), Some(100));
        assert_eq!(prod.group_of("billing").unwrap().ip(), Some("10.0.0.5"));
        assert_eq!(prod.group_of("proxy").unwrap().ip(), Some("10.9.9.9"));
        assert_eq!(prod.group_of("billing").unwrap().order_of("billing"), Some(2));
    }

    #[test]
    fn test_include_merges_and_edits_groups() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.yaml",
            "portOffset: 0\ncore:\n  ip: 10.0.0.1\n  components: [a, b]\nlegacy:\n  components: [old]\n",
        );
        write(
            dir.path(),
            "dev.yaml",
            "portOffset: 200\ninclude:\n  env: base\n  exclude: [legacy]\ncore:\n  appendComponents: [c]\n  excludeComponents: [a]\n",
        );

        let provider = FileEnvironmentProvider::new(dir.path());
        let dev = provider.get_by_name("dev").unwrap();
        assert_eq!(dev.port_offset(), Some(200));
        assert!(!dev.contains("old"));
        assert!(!dev.contains("a"));
        let core = dev.group_of("c").unwrap();
        assert_eq!(core.member_names().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(core.ip(), Some("10.0.0.1"));
    }

    #[test]
    fn test_include_cycle_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", "include:\n  env: b\n");
        write(dir.path(), "b.yaml", "include:\n  env: a\n");

        let provider = FileEnvironmentProvider::new(dir.path());
        let err = provider.get_by_name("a").unwrap_err();
        assert!(format!("{err}").contains("a -> b -> a"));
    }

    #[test]
    fn test_missing_include_is_not_absorbed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dev.yaml", "include:\n  env: nowhere\n");

        let provider = FileEnvironmentProvider::new(dir.path());
        let err = provider.get_by_name("dev").unwrap_err();
        assert!(!err.is_environment_not_found());
    }

    #[test]
    fn test_environment_names() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "prod.yaml", "");
        write(dir.path(), "dev.json", "{}");
        write(dir.path(), "notes.txt", "ignored");

        let provider = FileEnvironmentProvider::new(dir.path());
        assert_eq!(provider.environment_names().unwrap(), ["dev", "prod"]);

        let missing = FileEnvironmentProvider::new(dir.path().join("nope"));
        assert!(missing.environment_names().unwrap().is_empty());
    }
}

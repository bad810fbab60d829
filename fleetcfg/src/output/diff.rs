//! Change-aware artifact persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Component, ConfigType, PropertyMap, BASE_ENVIRONMENT};
use crate::output::layout::OutputLayout;
use crate::output::writer::{write_atomic, ArtifactFormat};
use crate::sources::open_reader;

/// What changed in one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    /// The artifact path.
    pub path: PathBuf,
    /// Keys absent from the previous artifact.
    pub added: BTreeSet<String>,
    /// Keys no longer present.
    pub removed: BTreeSet<String>,
    /// Keys whose value differs.
    pub changed: BTreeSet<String>,
    /// Whether the artifact was written or deleted.
    pub written: bool,
}

impl ChangeReport {
    /// Every added, removed or changed key, sorted.
    #[must_use]
    pub fn changed_keys(&self) -> Vec<String> {
        self.added
            .iter()
            .chain(&self.removed)
            .chain(&self.changed)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether anything differs from the previous artifact.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty())
    }
}

/// Writes resolved property sets, touching artifacts only when their
/// persistent content changed.
///
/// # Examples
///
/// ```no_run
/// use fleetcfg::model::{standard_types, Component, Property, PropertyMap};
/// use fleetcfg::output::{DiffSerializer, OutputLayout};
///
/// let serializer = DiffSerializer::new(OutputLayout::new("build"));
/// let resolved: PropertyMap = [Property::file("port", "10002", "prod")].into_iter().collect();
/// let report = serializer
///     .write(&Component::new("billing"), &standard_types()[1], &resolved)
///     .unwrap();
/// println!("{} changed keys", report.changed_keys().len());
/// ```
#[derive(Debug, Clone)]
pub struct DiffSerializer {
    layout: OutputLayout,
    dry_run: bool,
}

impl DiffSerializer {
    /// Creates a serializer writing under `layout`.
    #[must_use]
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            dry_run: false,
        }
    }

    /// Computes reports without touching the filesystem.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The destination layout.
    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Compares `resolved` with the previous artifact and writes it if any
    /// persistent key/value differs.
    ///
    /// An empty persistent set deletes the previous artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the previous artifact cannot be read, or the new
    /// one cannot be written.
    pub fn write(
        &self,
        component: &Component,
        config_type: &ConfigType,
        resolved: &PropertyMap,
    ) -> Result<ChangeReport> {
        let path = self.layout.artifact_path(component, config_type);
        let previous = self.previous(&path)?;
        let current = resolved.persistent_values();

        let mut report = diff(previous.as_ref().unwrap_or(&BTreeMap::new()), &current);
        report.path.clone_from(&path);

        if !report.has_changes() {
            log::debug!("{} unchanged", path.display());
            return Ok(report);
        }
        if self.dry_run {
            log::info!("would update {} ({} keys)", path.display(), report.changed_keys().len());
            return Ok(report);
        }

        if current.is_empty() {
            if previous.is_some() {
                fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
                report.written = true;
                log::info!("removed {}", path.display());
            }
            return Ok(report);
        }

        let pairs = resolved.persistent().map(|p| (p.key(), p.value()));
        let contents = ArtifactFormat::for_path(&path).render(pairs)?;
        write_atomic(&path, &contents)?;
        report.written = true;
        log::info!("wrote {} ({} keys changed)", path.display(), report.changed_keys().len());
        Ok(report)
    }

    fn previous(&self, path: &std::path::Path) -> Result<Option<BTreeMap<String, String>>> {
        if !path.is_file() {
            return Ok(None);
        }
        match open_reader(path, BASE_ENVIRONMENT) {
            Ok(reader) => Ok(Some(reader.properties_as_map())),
            Err(Error::Parse { message, .. }) => {
                log::warn!("replacing unreadable artifact {}: {message}", path.display());
                Ok(Some(BTreeMap::new()))
            }
            Err(e) => Err(e),
        }
    }
}

/// Key-level difference between two property maps.
#[must_use]
pub fn diff(previous: &BTreeMap<String, String>, current: &BTreeMap<String, String>) -> ChangeReport {
    let mut report = ChangeReport::default();
    for (key, value) in current {
        match previous.get(key) {
            None => {
                report.added.insert(key.clone());
            }
            Some(old) if old != value => {
                report.changed.insert(key.clone());
            }
            Some(_) => {}
        }
    }
    for key in previous.keys() {
        if !current.contains_key(key) {
            report.removed.insert(key.clone());
        }
    }
    report
}

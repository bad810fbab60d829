//! Destination layout of generated artifacts.

use std::path::{Path, PathBuf};

use crate::model::{Component, ConfigType};

/// Where artifacts are written:
/// `root / component.name / [service_inner_dir] / result_file_name`.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::{standard_types, Component};
/// use fleetcfg::output::OutputLayout;
/// use std::path::Path;
///
/// let layout = OutputLayout::new("/srv/build").with_service_inner_dir("conf");
/// let billing = Component::new("billing");
/// assert_eq!(layout.service_dir(&billing), Path::new("/srv/build/billing"));
/// assert_eq!(
///     layout.artifact_path(&billing, &standard_types()[0]),
///     Path::new("/srv/build/billing/conf/application.yaml")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    service_inner_dir: Option<PathBuf>,
}

impl OutputLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            service_inner_dir: None,
        }
    }

    /// Places artifacts in a subdirectory of each service directory.
    #[must_use]
    pub fn with_service_inner_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.service_inner_dir = (!dir.as_os_str().is_empty()).then_some(dir);
        self
    }

    /// The destination root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by one component.
    #[must_use]
    pub fn service_dir(&self, component: &Component) -> PathBuf {
        self.root.join(component.name())
    }

    /// Full path of one artifact.
    #[must_use]
    pub fn artifact_path(&self, component: &Component, config_type: &ConfigType) -> PathBuf {
        let mut path = self.service_dir(component);
        if let Some(inner) = &self.service_inner_dir {
            path.push(inner);
        }
        path.push(config_type.result_file_name());
        path
    }
}

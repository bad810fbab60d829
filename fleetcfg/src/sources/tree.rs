//! The component source tree.
//!
//! Every directory under the components directory that directly contains
//! files is a component folder, named after the directory. Folders can be
//! nested at any depth for organisation; the names must still be unique.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Folder {
    path: PathBuf,
    files: Vec<PathBuf>,
}

/// Read-only index from component type to source folder.
///
/// # Examples
///
/// ```no_run
/// use fleetcfg::sources::ComponentTree;
/// use std::path::Path;
///
/// let tree = ComponentTree::build(Path::new("configs/components")).unwrap();
/// for component_type in tree.component_types() {
///     println!("{component_type}: {:?}", tree.folder(component_type));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentTree {
    root: PathBuf,
    folders: BTreeMap<String, Folder>,
}

impl ComponentTree {
    /// Scans `root` for component folders.
    ///
    /// A missing root yields an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory cannot be listed, or a validation
    /// error if two folders share a name.
    pub fn build(root: &Path) -> Result<Self> {
        let mut tree = Self {
            root: root.to_path_buf(),
            folders: BTreeMap::new(),
        };
        if !root.is_dir() {
            log::warn!("components directory {} does not exist", root.display());
            return Ok(tree);
        }
        tree.scan(root)?;
        log::debug!(
            "indexed {} component folders under {}",
            tree.folders.len(),
            root.display()
        );
        Ok(tree)
    }

    fn scan(&mut self, dir: &Path) -> Result<()> {
        let mut files = Vec::new();
        let mut subdirs = Vec::new();

        for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }
            if path.is_dir() {
                subdirs.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        subdirs.sort();

        if !files.is_empty() && dir != self.root {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::InvalidPath {
                    path: dir.to_path_buf(),
                    reason: "component folder has no name".into(),
                })?;
            if let Some(existing) = self.folders.get(&name) {
                return Err(Error::Validation {
                    field: "components".into(),
                    message: format!(
                        "component '{name}' is defined twice: {} and {}",
                        existing.path.display(),
                        dir.display()
                    ),
                });
            }
            self.folders.insert(
                name,
                Folder {
                    path: dir.to_path_buf(),
                    files,
                },
            );
        }

        for subdir in subdirs {
            self.scan(&subdir)?;
        }
        Ok(())
    }

    /// The scanned components directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The source folder of a component type.
    #[must_use]
    pub fn folder(&self, component_type: &str) -> Option<&Path> {
        self.folders.get(component_type).map(|f| f.path.as_path())
    }

    /// Files directly inside a component folder, sorted by name.
    ///
    /// Unknown types have no files.
    #[must_use]
    pub fn files(&self, component_type: &str) -> &[PathBuf] {
        self.folders
            .get(component_type)
            .map(|f| f.files.as_slice())
            .unwrap_or_default()
    }

    /// All component types, sorted.
    pub fn component_types(&self) -> impl Iterator<Item = &str> {
        self.folders.keys().map(String::as_str)
    }

    /// Number of component folders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Whether no component folders were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

/// A component tree scanned on first use.
///
/// Concurrent first callers wait for a single scan; the outcome, including a
/// failed scan, is kept for the lifetime of the cell.
#[derive(Debug)]
pub struct LazyComponentTree {
    root: PathBuf,
    cell: OnceLock<Result<Arc<ComponentTree>>>,
}

impl LazyComponentTree {
    /// Creates a cell that will scan `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cell: OnceLock::new(),
        }
    }

    /// The components directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the tree, scanning on first call.
    ///
    /// # Errors
    ///
    /// Returns the scan error, every time, if the scan failed.
    pub fn get(&self) -> Result<Arc<ComponentTree>> {
        self.cell
            .get_or_init(|| ComponentTree::build(&self.root).map(Arc::new))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_nested_folders_indexed_by_name() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("core/billing/application.yaml"));
        touch(&root.join("core/billing/service.proc"));
        touch(&root.join("edge/gateway/application.yaml"));

        let tree = ComponentTree::build(root).unwrap();
        assert_eq!(tree.component_types().collect::<Vec<_>>(), ["billing", "gateway"]);
        assert!(tree.folder("billing").unwrap().ends_with("core/billing"));
        assert_eq!(tree.files("billing").len(), 2);
        assert!(tree.files("unknown").is_empty());
        assert!(tree.folder("core").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a/billing/application.yaml"));
        touch(&dir.path().join("b/billing/application.yaml"));

        let err = ComponentTree::build(dir.path()).unwrap_err();
        assert!(format!("{err}").contains("defined twice"));
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("billing/.DS_Store"));
        touch(&dir.path().join(".git/config"));
        touch(&dir.path().join("billing/application.yaml"));

        let tree = ComponentTree::build(dir.path()).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.files("billing").len(), 1);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let tree = ComponentTree::build(&dir.path().join("components")).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_lazy_tree_scans_once() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("billing/application.yaml"));
        let lazy = LazyComponentTree::new(dir.path());

        let first = lazy.get().unwrap();
        touch(&dir.path().join("ledger/application.yaml"));
        let second = lazy.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }
}

//! Common test utilities for integration tests.
//!
//! This module provides a fixture builder for on-disk source trees
//! (component sources plus environment descriptors) and helpers to open
//! sessions over them.

use std::fs;
use std::path::{Path, PathBuf};

use fleetcfg::{Session, SessionOptions};
use tempfile::TempDir;

/// A temporary source tree laid out as `components/` and `envs/`, with
/// artifacts written to `out/`.
pub struct SourceTree {
    dir: TempDir,
}

#[allow(dead_code)]
impl SourceTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("components")).expect("create components dir");
        fs::create_dir_all(dir.path().join("envs")).expect("create envs dir");
        Self { dir }
    }

    /// The source root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Artifact destination root.
    pub fn destination(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Writes `components/<folder>/<file>`; `folder` may be nested.
    pub fn source(&self, folder: &str, file: &str, contents: &str) -> &Self {
        let dir = self.dir.path().join("components").join(folder);
        fs::create_dir_all(&dir).expect("create component folder");
        fs::write(dir.join(file), contents).expect("write source file");
        self
    }

    /// Writes `envs/<name>.yaml`.
    pub fn environment(&self, name: &str, yaml: &str) -> &Self {
        fs::write(self.dir.path().join("envs").join(format!("{name}.yaml")), yaml)
            .expect("write environment descriptor");
        self
    }

    /// Session options for this tree with a fixed home directory.
    pub fn options(&self) -> SessionOptions {
        SessionOptions::new(self.root(), self.destination()).with_user_home("/home/fleet")
    }

    /// Opens a session with default options.
    pub fn session(&self) -> Session {
        Session::new(self.options()).expect("open session")
    }

    /// Opens a session with adjusted options.
    pub fn session_with(&self, adjust: impl FnOnce(SessionOptions) -> SessionOptions) -> Session {
        Session::new(adjust(self.options())).expect("open session")
    }

    /// Path of a generated artifact.
    pub fn artifact(&self, component: &str, file: &str) -> PathBuf {
        self.destination().join(component).join(file)
    }

    /// Contents of a generated artifact.
    pub fn read_artifact(&self, component: &str, file: &str) -> String {
        fs::read_to_string(self.artifact(component, file)).expect("read artifact")
    }
}

/// The reference landscape.
///
/// `prod` has a `core` group (ip `10.0.0.5`) holding `gateway`, `billing`
/// and `ledger` (sources in `accounting`), and an `edge` group holding
/// `web`, which has no sources. `dev` only declares `billing`.
#[allow(dead_code)]
pub fn landscape() -> SourceTree {
    let tree = SourceTree::new();
    tree.environment(
        "prod",
        r#"
portOffset: 100
ip: 10.0.0.1
core:
  ip: 10.0.0.5
  components: [gateway, billing, "ledger:accounting"]
edge:
  components: [web]
"#,
    )
    .environment(
        "dev",
        r"
portOffset: 200
ip: 127.0.0.1
core:
  components: [billing]
",
    )
    .source(
        "services/billing",
        "application.yaml",
        "port: ${portOffset}0${order}\nhost: ${ip}\ntimeout: 30\n",
    )
    .source("services/billing", "application.prod.yaml", "timeout: 5\n")
    .source("services/billing", "service.proc", "java.opts=-Dport=${this@port}\n")
    .source(
        "services/gateway",
        "application.yaml",
        "upstream: http://${billing@host}:${billing@port}/\n",
    )
    .source("accounting", "application.yaml", "db: ${name}-db\n");
    tree
}

//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - An isolated source tree and home directory per test
//! - Command builder helpers with the tree pre-configured
//! - The reference landscape fixture

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables that would leak the developer's configuration into a test.
const AMBIENT_VARS: [&str; 9] = [
    "FLEETCFG_ROOT",
    "FLEETCFG_DESTINATION",
    "FLEETCFG_SERVICE_INNER_DIR",
    "FLEETCFG_THREADS",
    "FLEETCFG_FAIL_FAST",
    "FLEETCFG_ENVIRONMENTS",
    "FLEETCFG_OUTPUT_FORMAT",
    "FLEETCFG_OVERRIDES",
    "FLEETCFG_LOG_MODE",
];

/// Test environment with an isolated source tree and home directory.
///
/// Layout under the temporary directory:
/// - `src/components/`, `src/envs/`: the source tree
/// - `src/out/`: artifact destination (created by builds)
/// - `home/`: `HOME` for the child process
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Source root
    pub root: PathBuf,
    /// Home directory of the child process
    pub home: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create an empty source tree.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().join("src");
        let home = temp_dir.path().join("home");
        fs::create_dir_all(root.join("components")).expect("Failed to create components dir");
        fs::create_dir_all(root.join("envs")).expect("Failed to create envs dir");
        fs::create_dir_all(&home).expect("Failed to create home dir");

        Self {
            temp_dir,
            root,
            home,
        }
    }

    /// Get a bare command builder without the source tree flags.
    ///
    /// `HOME` points at the test home and `FLEETCFG_*` variables are
    /// cleared, so only the flags a test passes take effect.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("fleetcfg").expect("Failed to find fleetcfg binary");
        cmd.env("HOME", &self.home);
        for var in AMBIENT_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Get a command builder with `--root` and `--dest` pre-configured.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--root")
            .arg(&self.root)
            .arg("--dest")
            .arg(self.destination());
        cmd
    }

    /// Artifact destination root.
    pub fn destination(&self) -> PathBuf {
        self.root.join("out")
    }

    /// Write `components/<folder>/<file>`.
    pub fn source(&self, folder: &str, file: &str, contents: &str) -> &Self {
        let dir = self.root.join("components").join(folder);
        fs::create_dir_all(&dir).expect("Failed to create component folder");
        fs::write(dir.join(file), contents).expect("Failed to write source file");
        self
    }

    /// Write `envs/<name>.yaml`.
    pub fn environment(&self, name: &str, yaml: &str) -> &Self {
        fs::write(self.root.join("envs").join(format!("{name}.yaml")), yaml)
            .expect("Failed to write environment descriptor");
        self
    }

    /// Write a file relative to the source root.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Path of a generated artifact.
    pub fn artifact(&self, component: &str, file: &str) -> PathBuf {
        self.destination().join(component).join(file)
    }

    /// Contents of a generated artifact.
    pub fn read_artifact(&self, component: &str, file: &str) -> String {
        fs::read_to_string(self.artifact(component, file)).expect("Failed to read artifact")
    }

    /// Run a command and return stdout, asserting success.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to run fleetcfg");

        assert!(
            output.status.success(),
            "fleetcfg {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8(output.stdout).expect("Invalid UTF-8 in output")
    }

    /// The source root.
    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// The reference landscape.
///
/// `prod` declares a `core` group (ip `10.0.0.5`) holding `gateway`,
/// `billing` and `ledger` (sources in `accounting`), and an `edge` group
/// holding `web`, which has no sources. `dev` only declares `billing`.
#[allow(dead_code)]
pub fn landscape() -> TestEnv {
    let env = TestEnv::new();
    env.environment(
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
    env
}

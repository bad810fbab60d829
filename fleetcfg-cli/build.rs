//! Build script for fleetcfg-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    Command::new("fleetcfg")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate environment-specific service configuration")
        .long_about(
            "Resolve placeholder-laden component sources against environment descriptors \
             and write one configuration artifact per component, config type and environment",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .help("Source root holding the components and environment directories")
                .value_name("PATH")
                .global(true)
                .env("FLEETCFG_ROOT"),
        )
        .arg(
            Arg::new("dest")
                .long("dest")
                .help("Destination root for generated artifacts")
                .value_name("PATH")
                .global(true)
                .env("FLEETCFG_DESTINATION"),
        )
        .arg(
            Arg::new("set")
                .short('D')
                .long("set")
                .help("Override a placeholder (`key` or `component@key`); repeatable")
                .value_name("KEY=VALUE")
                .global(true)
                .action(clap::ArgAction::Append),
        )
        .subcommands(vec![
            Command::new("build")
                .about("Generate artifacts for one or more environments")
                .long_about(
                    "Resolve every component with sources in the selected environments and \
                     write the artifacts whose content changed",
                ),
            Command::new("show")
                .about("Print the resolved properties of a component")
                .long_about("Resolve one component, config type and environment without writing"),
            Command::new("list")
                .about("List environments, or the components of an environment")
                .long_about("Display environment names, or the groups and members of one environment"),
            Command::new("validate")
                .about("Validate a tool configuration file")
                .long_about("Check a fleetcfg configuration file for errors"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() -> std::io::Result<()> {
    let out_dir = PathBuf::from(
        std::env::var_os("OUT_DIR").ok_or_else(|| std::io::Error::other("OUT_DIR is not set"))?,
    );
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    // Generate main fleetcfg.1 man page
    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;

    fs::write(man_dir.join("fleetcfg.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}

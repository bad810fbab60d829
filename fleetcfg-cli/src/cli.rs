//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    BuildCommand, CompletionsCommand, ListCommand, ShowCommand, ValidateCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate environment-specific service configuration.
#[derive(Parser)]
#[command(name = "fleetcfg")]
#[command(
    version,
    about = "Generate environment-specific service configuration",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Source root holding the components and environment directories
    #[arg(long, value_name = "PATH", global = true, env = "FLEETCFG_ROOT")]
    pub root: Option<PathBuf>,

    /// Destination root for generated artifacts
    #[arg(long, value_name = "PATH", global = true, env = "FLEETCFG_DESTINATION")]
    pub dest: Option<PathBuf>,

    /// Override a placeholder (`key` or `component@key`); repeatable
    #[arg(
        short = 'D',
        long = "set",
        value_name = "KEY=VALUE",
        global = true,
        action = clap::ArgAction::Append
    )]
    pub set: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate artifacts for one or more environments
    Build(BuildCommand),

    /// Print the resolved properties of a component
    Show(ShowCommand),

    /// List environments, or the components of an environment
    List(ListCommand),

    /// Validate a tool configuration file
    Validate(ValidateCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repeated_set_flags() {
        let cli = Cli::try_parse_from([
            "fleetcfg",
            "-D",
            "portOffset=7",
            "--set",
            "billing@port=9000",
            "list",
        ])
        .unwrap();
        assert_eq!(cli.set, ["portOffset=7", "billing@port=9000"]);
        assert!(matches!(cli.command, Command::List(_)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["fleetcfg", "build", "prod", "--quiet", "--root", "/src"])
            .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.root, Some(PathBuf::from("/src")));
    }
}

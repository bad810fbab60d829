//! Main entry point for the fleetcfg CLI.
//!
//! Generates environment-specific service configuration from a source tree
//! of component folders and environment descriptors:
//! - `build`: Resolve and write artifacts
//! - `show`: Print one resolved property set
//! - `list`: List environments and their components
//! - `validate`: Check a tool configuration file
//! - `completions`: Generate shell completion scripts

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Route library logging through the stderr logger
    let logger = fleetcfg::init_logger(cli.verbose, cli.quiet);
    let _ = logger.install();

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        root: cli.root,
        dest: cli.dest,
        set: cli.set,
    };

    // Execute the command
    let result = match cli.command {
        cli::Command::Build(cmd) => cmd.execute(&global),
        cli::Command::Show(cmd) => cmd.execute(&global),
        cli::Command::List(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

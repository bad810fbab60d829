//! Build command implementation.
//!
//! This module implements the `build` command, which plans every
//! (component, config type, environment) target with sources, resolves them
//! in parallel and writes the artifacts whose content changed.

use crate::error::CliError;
use crate::utils::{load_configuration, session_options, GlobalOptions};
use clap::{Args, ValueEnum};
use fleetcfg::operations::{BuildExecutor, BuildPlan, BuildReport, BuildRequest};
use fleetcfg::{OutputFormat, Session};

/// Generate artifacts for one or more environments.
#[derive(Args)]
pub struct BuildCommand {
    /// Environments to build (default: configured environments, then all)
    #[arg(value_name = "ENV")]
    pub environments: Vec<String>,

    /// Restrict the build to a component (repeatable)
    #[arg(short = 'c', long = "component", value_name = "NAME")]
    pub components: Vec<String>,

    /// Restrict the build to a config type (repeatable)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub config_types: Vec<String>,

    /// Number of worker threads
    #[arg(long, value_name = "N", env = "FLEETCFG_THREADS")]
    pub threads: Option<usize>,

    /// Stop scheduling targets after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<ReportFormat>,

    /// Resolve and diff without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format for the build report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One line per changed artifact and failure, then a summary
    Human,
    /// The full report as JSON
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            _ => ReportFormat::Human,
        }
    }
}

impl BuildCommand {
    /// Execute the build command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if self.threads == Some(0) {
            return Err(CliError::InvalidArguments(
                "--threads must be at least 1".to_string(),
            ));
        }

        // 1. Load configuration and open the session
        let config = load_configuration(global)?;
        let options = session_options(global, &config)?.with_dry_run(self.dry_run);
        let session = Session::new(options)?;

        // 2. Plan
        let environments = if self.environments.is_empty() {
            config.environments.clone().unwrap_or_default()
        } else {
            self.environments
        };
        let request = BuildRequest::new(environments)
            .with_components(self.components)
            .with_config_types(self.config_types);
        let plan = BuildPlan::for_request(&session, &request)?;
        for warning in &plan.warnings {
            log::warn!("{warning}");
        }
        log::info!("{}: {} targets", plan.description, plan.len());

        // 3. Execute
        let mut executor = BuildExecutor::new(&session)
            .with_fail_fast(self.fail_fast || config.fail_fast.unwrap_or(false));
        if let Some(threads) = self.threads.or(config.threads) {
            executor = executor.with_threads(threads);
        }
        let report = executor.execute(&plan);

        // 4. Report
        let format = self
            .format
            .unwrap_or_else(|| config.output_format.unwrap_or_default().into());
        match format {
            ReportFormat::Json => {
                let json = serde_json::to_string_pretty(&report).map_err(|e| {
                    CliError::SemanticFailure(format!("failed to serialize report: {e}"))
                })?;
                println!("{json}");
            }
            ReportFormat::Human => print_human(&report, global.quiet),
        }

        if report.is_success() {
            Ok(())
        } else if report.failures.is_empty() {
            Err(CliError::SemanticFailure(format!(
                "build cancelled, {} targets skipped",
                report.skipped.len()
            )))
        } else {
            Err(CliError::SemanticFailure(format!(
                "{} of {} targets failed",
                report.failures.len(),
                plan.len()
            )))
        }
    }
}

fn print_human(report: &BuildReport, quiet: bool) {
    for failure in &report.failures {
        eprintln!("failed {}: {}", failure.target, failure.message);
    }
    if quiet {
        return;
    }

    let verb = if report.dry_run { "would write" } else { "wrote" };
    for outcome in report.artifacts.iter().filter(|a| a.changes.has_changes()) {
        println!(
            "{verb} {} ({} keys changed)",
            outcome.changes.path.display(),
            outcome.changes.changed_keys().len()
        );
    }
    for target in &report.skipped {
        println!("skipped {target}");
    }
    println!("{}", report.summary());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_follows_configured_output() {
        assert_eq!(ReportFormat::from(OutputFormat::Json), ReportFormat::Json);
        assert_eq!(ReportFormat::from(OutputFormat::Human), ReportFormat::Human);
        assert_eq!(ReportFormat::from(OutputFormat::Yaml), ReportFormat::Human);
    }
}

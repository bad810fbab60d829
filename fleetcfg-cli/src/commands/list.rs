//! List command implementation.
//!
//! This module implements the `list` command, which displays the known
//! environments, or the components declared by one environment, as a
//! table or JSON.

use crate::error::CliError;
use crate::utils::{load_configuration, open_session, GlobalOptions};
use clap::{Args, ValueEnum};
use fleetcfg::Environment;
use serde::Serialize;
use std::io::Write;

/// List environments, or the components of an environment.
#[derive(Args)]
pub struct ListCommand {
    /// List the components declared in this environment
    #[arg(short = 'e', long = "env", value_name = "ENV")]
    pub environment: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", ignore_case = true)]
    pub format: ListFormat,
}

/// Output format for list command.
#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ListFormat {
    /// Tab-separated table format (human-readable)
    Table,
    /// JSON format
    Json,
}

#[derive(Serialize)]
struct MemberRow<'a> {
    group: &'a str,
    order: usize,
    name: &'a str,
    #[serde(rename = "type")]
    component_type: &'a str,
    ip: Option<&'a str>,
}

fn member_rows(env: &Environment) -> Vec<MemberRow<'_>> {
    env.groups()
        .iter()
        .flat_map(|group| {
            group
                .members()
                .iter()
                .enumerate()
                .map(move |(index, member)| MemberRow {
                    group: group.name(),
                    order: index + 1,
                    name: member.name(),
                    component_type: member.component_type(),
                    ip: group.ip(),
                })
        })
        .collect()
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let session = open_session(global, &config)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        match &self.environment {
            None => {
                let names = session.environments().environment_names()?;
                match self.format {
                    ListFormat::Json => writeln!(out, "{}", to_json(&names)?)?,
                    ListFormat::Table => {
                        for name in &names {
                            writeln!(out, "{name}")?;
                        }
                    }
                }
            }
            Some(name) => {
                let env = session.environments().get_by_name(name)?;
                let rows = member_rows(&env);
                match self.format {
                    ListFormat::Json => writeln!(out, "{}", to_json(&rows)?)?,
                    ListFormat::Table => {
                        if !global.quiet {
                            writeln!(out, "GROUP\tORDER\tCOMPONENT\tTYPE\tIP")?;
                        }
                        for row in &rows {
                            writeln!(
                                out,
                                "{}\t{}\t{}\t{}\t{}",
                                row.group,
                                row.order,
                                row.name,
                                row.component_type,
                                row.ip.unwrap_or("-")
                            )?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::SemanticFailure(format!("failed to serialize to JSON: {e}")))
}

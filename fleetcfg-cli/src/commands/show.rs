//! Show command implementation.
//!
//! Resolves one (component, config type, environment) triple and prints the
//! result without writing anything.

use crate::error::CliError;
use crate::utils::{load_configuration, open_session, GlobalOptions};
use clap::Args;
use fleetcfg::{OutputFormat, PropertyMap};

/// Print the resolved properties of a component.
#[derive(Args)]
pub struct ShowCommand {
    /// Component name as declared in the environment
    #[arg(value_name = "COMPONENT")]
    pub component: String,

    /// Environment to resolve in
    #[arg(value_name = "ENV")]
    pub environment: String,

    /// Config type to resolve
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "app")]
    pub config_type: String,

    /// Include temporary properties (serviceDir, order, ip, ...)
    #[arg(long)]
    pub all: bool,

    /// Output format
    #[arg(
        long,
        value_enum,
        env = "FLEETCFG_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: Option<OutputFormat>,
}

impl ShowCommand {
    /// Execute the show command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = load_configuration(global)?;
        let session = open_session(global, &config)?;

        let component = session.component(&self.environment, &self.component)?;
        let config_type = session.config_type(&self.config_type)?;
        let resolved = session.resolved_properties(&component, config_type, &self.environment)?;

        let shown = if self.all {
            (*resolved).clone()
        } else {
            let mut persistent = PropertyMap::new();
            for property in resolved.persistent() {
                persistent.insert(property.clone());
            }
            persistent
        };

        let format = self
            .format
            .unwrap_or_else(|| config.output_format.unwrap_or_default());
        let output = format.create_formatter().format(&shown)?;
        if !output.is_empty() {
            println!("{}", output.trim_end());
        }
        Ok(())
    }
}

//! CLI command implementations.
//!
//! - `build`: Generate artifacts for one or more environments
//! - `show`: Print the resolved properties of one component
//! - `list`: List environments, or the components of an environment
//! - `validate`: Validate a tool configuration file
//! - `completions`: Generate shell completion scripts

pub mod build;
pub mod completions;
pub mod list;
pub mod show;
pub mod validate;

pub use build::BuildCommand;
pub use completions::CompletionsCommand;
pub use list::ListCommand;
pub use show::ShowCommand;
pub use validate::ValidateCommand;

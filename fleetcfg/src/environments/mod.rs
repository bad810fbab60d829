//! The component/environment graph.
//!
//! Environments are described by files in the environments directory
//! (`envs/` by default), one per environment. See [`descriptor`] for the
//! file format and [`provider`] for lookup and caching.

pub mod descriptor;
pub mod provider;

pub use descriptor::{EnvironmentDescriptor, GroupDescriptor, IncludeDescriptor};
pub use provider::{
    find_environment, EnvironmentProvider, FileEnvironmentProvider, StaticEnvironmentProvider,
};

#[cfg(test)]
pub use provider::MockEnvironmentProvider;

//! Core data model: properties, components, environments and config types.
//!
//! Everything here is an immutable value object; the environment graph is
//! built once by an [`EnvironmentProvider`](crate::environments::EnvironmentProvider)
//! and only queried afterwards.

pub mod component;
pub mod config_type;
pub mod environment;
pub mod property;

pub use component::{Component, ComponentGroup};
pub use config_type::{standard_types, ConfigType};
pub use environment::Environment;
pub use property::{Property, PropertyMap, Source, BASE_ENVIRONMENT};

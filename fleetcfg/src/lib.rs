#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # fleetcfg
//!
//! A library for generating environment-specific service configuration.
//!
//! Component sources (YAML or `.properties` files, with per-environment
//! overlays) are merged, enriched with environment-derived special
//! properties, resolved through `${...}` placeholders and written as one
//! artifact per component, config type and environment. Artifacts are only
//! rewritten when their content changes.
//!
//! ## Core Types
//!
//! - [`Session`] and [`SessionOptions`]: per-run state and caches
//! - [`Component`], [`Environment`], [`ConfigType`], [`Property`]: the data model
//! - [`BuildPlan`] and [`BuildExecutor`]: plan-then-execute builds
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```no_run
//! use fleetcfg::{BuildExecutor, BuildPlan, BuildRequest, Session, SessionOptions};
//!
//! let session = Session::new(SessionOptions::new("configs", "build/configs")).unwrap();
//!
//! // Resolve one triple
//! let billing = session.component("prod", "billing").unwrap();
//! let app = session.config_type("app").unwrap();
//! let properties = session.resolved_properties(&billing, app, "prod").unwrap();
//! println!("{} properties", properties.len());
//!
//! // Or build everything for prod
//! let plan = BuildPlan::for_request(&session, &BuildRequest::new(vec!["prod".into()])).unwrap();
//! let report = BuildExecutor::new(&session).execute(&plan);
//! println!("{}", report.summary());
//! ```

pub mod cache;
pub mod config;
pub mod environments;
pub mod error;
pub mod logging;
pub mod model;
pub mod operations;
pub mod output;
pub mod resolve;
pub mod session;
pub mod sources;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigBuilder};
pub use environments::{EnvironmentProvider, FileEnvironmentProvider, StaticEnvironmentProvider};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use model::{Component, ComponentGroup, ConfigType, Environment, Property, PropertyMap, Source};
pub use operations::{BuildExecutor, BuildPlan, BuildReport, BuildRequest, BuildTarget};
pub use output::{ChangeReport, OutputFormat};
pub use session::{Session, SessionOptions};

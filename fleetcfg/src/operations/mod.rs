//! Build operations using the plan-execute pattern.
//!
//! Operations are split into two phases:
//! 1. **Planning**: expands a [`BuildRequest`] into the list of
//!    (component, config type, environment) triples to generate
//! 2. **Execution**: resolves and persists every triple on a worker pool,
//!    collecting a [`BuildReport`]
//!
//! # Examples
//!
//! ```no_run
//! use fleetcfg::operations::{BuildExecutor, BuildPlan, BuildRequest};
//! use fleetcfg::session::{Session, SessionOptions};
//!
//! let session = Session::new(SessionOptions::new("configs", "build").with_dry_run(true)).unwrap();
//! let request = BuildRequest::new(vec!["prod".into()]).with_components(vec!["billing".into()]);
//!
//! // Generate plan
//! let plan = BuildPlan::for_request(&session, &request).unwrap();
//!
//! // Execute plan
//! let report = BuildExecutor::new(&session).execute(&plan);
//! assert!(report.dry_run);
//! ```

pub mod executor;
pub mod plan;
pub mod report;

pub use executor::{BuildExecutor, Cancellation};
pub use plan::{BuildPlan, BuildRequest, BuildTarget};
pub use report::{ArtifactOutcome, BuildFailure, BuildReport, FailureKind};

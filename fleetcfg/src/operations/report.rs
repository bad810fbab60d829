//! Build outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Error;
use crate::output::ChangeReport;

use super::plan::BuildTarget;

/// Category of a failed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A placeholder could not be resolved.
    UnresolvedPlaceholder,
    /// A placeholder chain referred back to itself.
    CyclicReference,
    /// A malformed placeholder.
    InvalidPlaceholder,
    /// A referenced environment does not exist.
    EnvironmentNotFound,
    /// A source file or descriptor could not be parsed.
    Parse,
    /// A filesystem operation failed.
    Io,
    /// Anything else.
    Other,
}

impl From<&Error> for FailureKind {
    fn from(error: &Error) -> Self {
        match error {
            Error::UnresolvedPlaceholder { .. } => Self::UnresolvedPlaceholder,
            Error::CyclicReference { .. } => Self::CyclicReference,
            Error::InvalidPlaceholder { .. } => Self::InvalidPlaceholder,
            Error::EnvironmentNotFound { .. } => Self::EnvironmentNotFound,
            Error::Parse { .. } => Self::Parse,
            Error::Io { .. } => Self::Io,
            Error::Validation { .. } | Error::NotFound { .. } | Error::InvalidPath { .. } => {
                Self::Other
            }
        }
    }
}

/// A generated (or unchanged) artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactOutcome {
    /// The triple.
    pub target: BuildTarget,
    /// What changed.
    pub changes: ChangeReport,
}

/// A target that failed.
#[derive(Debug, Clone, Serialize)]
pub struct BuildFailure {
    /// The triple.
    pub target: BuildTarget,
    /// Failure category.
    pub kind: FailureKind,
    /// The error message.
    pub message: String,
}

impl BuildFailure {
    /// Records a failure.
    #[must_use]
    pub fn new(target: BuildTarget, error: &Error) -> Self {
        Self {
            target,
            kind: FailureKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Outcome of executing a build plan.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
    /// Whether artifacts were left untouched.
    pub dry_run: bool,
    /// Whether execution stopped before every target ran.
    pub cancelled: bool,
    /// Targets that completed, in plan order.
    pub artifacts: Vec<ArtifactOutcome>,
    /// Targets that failed, in plan order.
    pub failures: Vec<BuildFailure>,
    /// Targets never started because of cancellation.
    pub skipped: Vec<BuildTarget>,
    /// Plan warnings.
    pub warnings: Vec<String>,
}

impl BuildReport {
    /// Whether every target completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// Number of artifacts written or deleted.
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.changes.written).count()
    }

    /// Number of artifacts whose content differs from the previous run.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.changes.has_changes()).count()
    }

    /// One-line summary.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use fleetcfg::operations::BuildReport;
    ///
    /// let now = Utc::now();
    /// let report = BuildReport {
    ///     started_at: now,
    ///     finished_at: now,
    ///     dry_run: false,
    ///     cancelled: false,
    ///     artifacts: vec![],
    ///     failures: vec![],
    ///     skipped: vec![],
    ///     warnings: vec![],
    /// };
    /// assert_eq!(report.summary(), "0 targets: 0 changed, 0 written, 0 failed");
    /// ```
    #[must_use]
    pub fn summary(&self) -> String {
        let total = self.artifacts.len() + self.failures.len() + self.skipped.len();
        let mut summary = format!(
            "{total} targets: {} changed, {} written, {} failed",
            self.changed_count(),
            self.written_count(),
            self.failures.len()
        );
        if !self.skipped.is_empty() {
            summary.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        if self.dry_run {
            summary.push_str(" (dry run)");
        }
        summary
    }
}

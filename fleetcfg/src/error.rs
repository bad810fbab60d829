//! Error types for the fleetcfg library.
//!
//! This module provides the error hierarchy for every stage of a build,
//! from reading sources through placeholder resolution to writing
//! artifacts, using `thiserror` for ergonomic error handling.
//!
//! Errors are `Clone` so that a failed resolution can be shared by every
//! caller waiting on the same single-flight computation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Result type alias for operations that may fail with a fleetcfg error.
///
/// # Examples
///
/// ```
/// use fleetcfg::{Error, Result};
///
/// fn example_operation() -> Result<String> {
///     Ok("10002".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the fleetcfg library.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The named environment has no descriptor.
    ///
    /// Callers decide whether this is fatal: the special property injector
    /// and the scoped placeholder strategies treat it as "no environment
    /// context" and carry on.
    #[error("environment not found: {name}")]
    EnvironmentNotFound {
        /// The environment name that was looked up.
        name: String,
    },

    /// No placeholder strategy produced a value and no default was given.
    #[error(
        "unresolved placeholder ${{{placeholder}}} in {component}[{environment}] while resolving '{property}'"
    )]
    UnresolvedPlaceholder {
        /// The placeholder text between `${` and `}`.
        placeholder: String,
        /// The component whose value contains the placeholder.
        component: String,
        /// The environment the placeholder was resolved in.
        environment: String,
        /// The property whose value contains the placeholder.
        property: String,
    },

    /// A placeholder chain revisited a key that is already being resolved.
    #[error("cyclic reference detected: {}", chain.join(" -> "))]
    CyclicReference {
        /// The chain of references, ending with the repeated entry.
        chain: Vec<String>,
    },

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A source file or descriptor could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// A description of the parse failure.
        message: String,
    },

    /// A placeholder reference is malformed.
    #[error("invalid placeholder '{text}': {reason}")]
    InvalidPlaceholder {
        /// The placeholder text between `${` and `}`.
        text: String,
        /// Why the reference was rejected.
        reason: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// The requested resource was not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },
}

impl Error {
    /// Wraps an I/O error together with the path it occurred on.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source: Arc::new(source),
        }
    }

    /// Check if error indicates an unknown environment.
    ///
    /// # Examples
    ///
    /// ```
    /// use fleetcfg::Error;
    ///
    /// let err = Error::EnvironmentNotFound { name: "staging2".into() };
    /// assert!(err.is_environment_not_found());
    /// ```
    #[must_use]
    pub fn is_environment_not_found(&self) -> bool {
        matches!(self, Self::EnvironmentNotFound { .. })
    }

    /// Check if error indicates a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if error is a cyclic placeholder reference.
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicReference { .. })
    }

    /// Check if error is an unresolved placeholder.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedPlaceholder { .. })
    }
}

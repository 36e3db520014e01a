//! Error types for modbuild operations.
//!
//! This module defines [`BuildError`], the primary error type used throughout
//! the engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `BuildError` for domain-specific errors that abort a dispatch
//! - Use `anyhow::Error` (via `BuildError::Other`) for unexpected errors
//! - Recommendation gaps and malformed version comparisons are not errors;
//!   they are logged and reported through status values instead

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for modbuild operations.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to parse a configuration file or checkpoint.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A property was declared twice in the same ancestor chain.
    #[error("Property '{name}' is already declared by build class '{class}'")]
    DuplicateProperty { name: String, class: String },

    /// A property was registered against a class that does not exist.
    #[error("Unknown build class: {name}")]
    UnknownClass { name: String },

    /// Dispatch was invoked without an action and no default is configured.
    #[error("No action specified")]
    NoAction,

    /// The requested action has no registered handler.
    #[error("No action '{action}' defined, try running the 'help' action.")]
    UnknownAction { action: String },

    /// An action was registered under a name that is not an identifier.
    #[error("Invalid action name '{name}': names may only contain letters, digits and '_'")]
    InvalidActionName { name: String },

    /// One or more prerequisites of an action are not satisfied.
    #[error("Prerequisites for action '{action}' are not satisfied:\n{report}")]
    PrerequisiteFailure { action: String, report: String },

    /// A command-line argument could not be interpreted.
    #[error("Invalid argument '{arg}': {message}")]
    InvalidArgument { arg: String, message: String },

    /// External command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// One or more test files failed.
    #[error("Tests failed: {failed} of {total} test files did not pass")]
    TestsFailed { failed: usize, total: usize },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for modbuild operations.
pub type Result<T> = std::result::Result<T, BuildError>;

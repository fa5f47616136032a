//! The error type shared by every public entry point of the engine.
//!
//! Each variant corresponds to one of the error kinds named by the resolver
//! specification: callers are expected to match on these kinds rather than
//! on message text. No operation in this crate returns a partial result —
//! an error always means nothing downstream was emitted.

use miette::Diagnostic;
use thiserror::Error;

/// The error type returned by every fallible operation in this crate.
#[derive(Debug, Error, Diagnostic)]
pub enum PackspecError {
    /// A malformed constraint, unknown action, empty required field, or
    /// unknown ecosystem.
    #[error("invalid argument: {0}")]
    #[diagnostic(code(packspec::invalid_argument))]
    InvalidArgument(String),

    /// No repository entry for a requested name, no packaging group
    /// matches, or no available versions exist.
    #[error("not found: {0}")]
    #[diagnostic(code(packspec::not_found))]
    NotFound(String),

    /// Constraints are unsatisfiable and no directive applies, the SAT
    /// solver found no model, or Debian SAT was invoked without an
    /// `apt_packages` index.
    #[error("failed precondition: {0}")]
    #[diagnostic(code(packspec::failed_precondition))]
    FailedPrecondition(String),

    /// A duplicate profile reference, packaging-group name, or compose
    /// entry.
    #[error("already exists: {0}")]
    #[diagnostic(code(packspec::already_exists))]
    AlreadyExists(String),

    /// A `block` directive matched a dependency.
    #[error("permission denied: {0}")]
    #[diagnostic(code(packspec::permission_denied))]
    PermissionDenied(String),

    /// A cancellation token fired before the operation completed.
    #[error("cancelled: {0}")]
    #[diagnostic(code(packspec::cancelled))]
    Cancelled(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PackspecError>;

impl PackspecError {
    /// Shorthand for [`PackspecError::InvalidArgument`].
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Shorthand for [`PackspecError::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Shorthand for [`PackspecError::FailedPrecondition`].
    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    /// Shorthand for [`PackspecError::AlreadyExists`].
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Shorthand for [`PackspecError::PermissionDenied`].
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Shorthand for [`PackspecError::Cancelled`].
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }
}

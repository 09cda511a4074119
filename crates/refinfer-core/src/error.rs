//! Error types and error code constants for refinfer.
//!
//! This module provides a unified error type (`RefinferError`) that bridges
//! domain-specific errors from different subsystems (document loading,
//! configuration) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, dangling id in a document)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! The mapping engine itself never fails: heuristics that do not apply
//! simply leave a mapping unexplained. Errors only arise at the edges,
//! while loading documents and configuration.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, unknown id).
    ResolutionError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum RefinferError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The diff document could not be decoded.
    #[error("malformed document {path}: {message}")]
    MalformedDocument { path: String, message: String },

    /// The diff document refers to an id it never defines.
    #[error("unresolved reference in {path}: {message}")]
    UnresolvedReference { path: String, message: String },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&RefinferError> for OutputErrorCode {
    fn from(err: &RefinferError) -> Self {
        match err {
            RefinferError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            RefinferError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            RefinferError::MalformedDocument { .. } => OutputErrorCode::InvalidArguments,
            RefinferError::UnresolvedReference { .. } => OutputErrorCode::ResolutionError,
            RefinferError::Config(_) => OutputErrorCode::InvalidArguments,
            RefinferError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<RefinferError> for OutputErrorCode {
    fn from(err: RefinferError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl RefinferError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        RefinferError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        RefinferError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        RefinferError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        RefinferError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Error bridge implementations for engine errors.
//!
//! This module provides `impl From<X> for RefinferError` conversions from
//! the mapping crate's error types to the unified `RefinferError` type.
//!
//! These bridges live in `refinfer-mapping` rather than `refinfer-core` because
//! they depend on mapping types that core does not know about, and the orphan
//! rule forbids them in the root crate where both types are foreign.

use std::io;

use refinfer_core::error::RefinferError;
use crate::document::DocumentError;

/// Path reported for documents decoded from memory.
const NO_PATH: &str = "<input>";

// ============================================================================
// Bridge: DocumentError -> RefinferError
// ============================================================================

impl From<DocumentError> for RefinferError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::InFile { path, source } => bridge(path, *source),
            other => bridge(NO_PATH.to_string(), other),
        }
    }
}

fn bridge(path: String, err: DocumentError) -> RefinferError {
    match err {
        DocumentError::Io { path, source } if source.kind() == io::ErrorKind::NotFound => {
            RefinferError::FileNotFound { path }
        }
        DocumentError::Io { path, source } => RefinferError::InternalError {
            message: format!("failed to read {path}: {source}"),
        },
        DocumentError::InFile { path, source } => bridge(path, *source),
        err if err.is_unresolved_reference() => RefinferError::UnresolvedReference {
            path,
            message: err.to_string(),
        },
        err => RefinferError::MalformedDocument {
            path,
            message: err.to_string(),
        },
    }
}

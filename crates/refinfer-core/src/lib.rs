//! Core infrastructure for refinfer.
//!
//! This crate provides the language-agnostic pieces shared by the mapping
//! engine and the CLI:
//! - Error types and exit codes
//! - Source spans and locations
//! - Text utilities (common prefix/suffix, token-bounded search, reserved tokens)
//! - Configuration file loading
//! - JSON output types for CLI responses
//! - Content digests for snapshot ids

pub mod config;
pub mod error;
pub mod output;
pub mod text;
pub mod types;
pub mod util;

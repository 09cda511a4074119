//! Common types shared between the engine, the error and the output modules.
//!
//! This module contains types that are used across crates, avoiding
//! circular dependencies.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Span Type
// ============================================================================

/// Character offsets into a source file.
///
/// Spans are half-open intervals: `[start, end)`. Offsets are the ones
/// reported by the external front end, which counts from the start of the
/// compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Create a span, returning `None` when `start > end`.
    pub fn try_new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Span { start, end })
    }

    /// Length of the span.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Renders as `[start,end]`, the form used by AST node dumps.
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

// ============================================================================
// Location Type
// ============================================================================

/// Location of a code element in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path (repository-relative).
    pub file: String,
    /// Offsets of the element.
    pub span: Span,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Location {
            file: file.into(),
            span,
        }
    }

    /// Whether `other` lies in the same file and inside this location.
    pub fn subsumes(&self, other: &Location) -> bool {
        self.file == other.file && self.span.contains(&other.span)
    }

    /// Comparison key for deterministic sorting: (file, start, end).
    fn sort_key(&self) -> (&str, u64, u64) {
        (&self.file, self.span.start, self.span.end)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file, self.span)
    }
}

// ============================================================================
// Tests
// ============================================================================

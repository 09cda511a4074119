//! JSON output types and serialization for CLI responses.
//!
//! These types form the report contract of the `refinfer` binary. They are
//! plain data (strings, counts, locations) so the engine crate converts its
//! own values into them without this crate knowing about fragments.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as first field
//! 2. **Deterministic:** Same input -> same output (field order, array ordering)
//! 3. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, RefinferError};

pub use crate::types::{Location, Span};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Inference Report Types
// ============================================================================

/// One replacement found between two mapped fragments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplacementReport {
    /// Text in the first version.
    pub before: String,
    /// Text in the second version.
    pub after: String,
    /// Replacement type (SCREAMING_SNAKE_CASE).
    #[serde(rename = "type")]
    pub replacement_type: String,
}

/// One fragment mapping and what the engine concluded about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingReport {
    /// Rendered first fragment.
    pub fragment1: String,
    /// Rendered second fragment.
    pub fragment2: String,
    /// Location of the first fragment.
    pub location1: Location,
    /// Location of the second fragment.
    pub location2: Location,
    /// Whether the fragments are judged equivalent.
    pub exact: bool,
    /// Replacements, in first-seen order.
    pub replacements: Vec<ReplacementReport>,
    /// The mapping is fully explained by an extracted variable.
    pub identical_with_extracted_variable: bool,
    /// The mapping is fully explained by an inlined variable.
    pub identical_with_inlined_variable: bool,
    /// Descriptions of the refactorings this mapping supports.
    pub refactorings: Vec<String>,
}

/// A pair of sub-expressions bound by an inferred refactoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubExpressionReport {
    /// Text in the first version.
    pub before: String,
    /// Text in the second version.
    pub after: String,
    /// Location in the first version.
    pub location1: Location,
    /// Location in the second version.
    pub location2: Location,
}

/// One inferred refactoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactoringReport {
    /// Refactoring type name ("Extract Variable", "Inline Variable").
    #[serde(rename = "type")]
    pub refactoring_type: String,
    /// Human-readable description.
    pub description: String,
    /// The introduced or removed variable, rendered `name : type`.
    pub variable: String,
    /// Enclosing operation in the first version.
    pub operation_before: String,
    /// Enclosing operation in the second version.
    pub operation_after: String,
    /// Found while matching an extracted or inlined method body.
    pub inside_extracted_or_inlined_method: bool,
    /// Sub-expression mappings, deduplicated by location pair.
    pub sub_expression_mappings: Vec<SubExpressionReport>,
    /// Number of fragment mappings that independently support it.
    pub references: usize,
}

/// Counts for an inference run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferSummary {
    /// Mappings in the document.
    pub mappings: usize,
    /// Mappings judged exact.
    pub exact_mappings: usize,
    /// Extract-variable refactorings inferred.
    pub extract_variable: usize,
    /// Inline-variable refactorings inferred.
    pub inline_variable: usize,
}

/// Response for `refinfer infer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Digest of the input document.
    pub snapshot_id: String,
    /// Path of the input document.
    pub document: String,
    /// Counts.
    pub summary: InferSummary,
    /// Per-mapping results, in input order.
    pub mappings: Vec<MappingReport>,
    /// Inferred refactorings, in discovery order.
    pub refactorings: Vec<RefactoringReport>,
}

impl InferResponse {
    /// Create a successful response.
    pub fn new(
        snapshot_id: impl Into<String>,
        document: impl Into<String>,
        mappings: Vec<MappingReport>,
        refactorings: Vec<RefactoringReport>,
    ) -> Self {
        let summary = InferSummary {
            mappings: mappings.len(),
            exact_mappings: mappings.iter().filter(|m| m.exact).count(),
            extract_variable: refactorings
                .iter()
                .filter(|r| r.refactoring_type == "Extract Variable")
                .count(),
            inline_variable: refactorings
                .iter()
                .filter(|r| r.refactoring_type == "Inline Variable")
                .count(),
        };
        InferResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            snapshot_id: snapshot_id.into(),
            document: document.into(),
            summary,
            mappings,
            refactorings,
        }
    }
}

/// Response for `refinfer mappings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingsResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Digest of the input document.
    pub snapshot_id: String,
    /// Rendered node mappings (`src -> dst`), in input order.
    pub mappings: Vec<String>,
}

impl MappingsResponse {
    /// Create a successful response.
    pub fn new(snapshot_id: impl Into<String>, mappings: Vec<String>) -> Self {
        MappingsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            snapshot_id: snapshot_id.into(),
            mappings,
        }
    }
}

// ============================================================================
// Error Response Types
// ============================================================================

/// Error information for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a RefinferError.
    pub fn from_error(err: &RefinferError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();
        let details = match err {
            RefinferError::InvalidArguments { details, .. } => details.clone(),
            RefinferError::FileNotFound { path }
            | RefinferError::MalformedDocument { path, .. }
            | RefinferError::UnresolvedReference { path, .. } => {
                Some(serde_json::json!({ "path": path }))
            }
            RefinferError::Config(_) | RefinferError::InternalError { .. } => None,
        };
        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Snapshot ID (absent when the input could not be read).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a RefinferError.
    pub fn from_error(err: &RefinferError, snapshot_id: Option<String>) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            snapshot_id,
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emitters
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Emit a response as compact JSON (single line) to a writer.
pub fn emit_response_compact<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn report(exact: bool) -> MappingReport {
        MappingReport {
            fragment1: "return a.b();\n".to_string(),
            fragment2: "return x;\n".to_string(),
            location1: Location::new("A.java", Span::new(0, 14)),
            location2: Location::new("A.java", Span::new(40, 50)),
            exact,
            replacements: vec![],
            identical_with_extracted_variable: false,
            identical_with_inlined_variable: false,
            refactorings: vec![],
        }
    }

    mod infer_response_tests {
        use super::*;

        #[test]
        fn status_is_first_field() {
            let response = InferResponse::new("snap_0", "d.json", vec![], vec![]);
            let json = serde_json::to_string(&response).unwrap();
            assert!(json.starts_with("{\"status\":\"ok\""));
        }

        #[test]
        fn summary_counts_exact_mappings() {
            let response =
                InferResponse::new("snap_0", "d.json", vec![report(true), report(false)], vec![]);
            assert_eq!(response.summary.mappings, 2);
            assert_eq!(response.summary.exact_mappings, 1);
        }

        #[test]
        fn summary_counts_refactorings_by_type() {
            let refactoring = |kind: &str| RefactoringReport {
                refactoring_type: kind.to_string(),
                description: String::new(),
                variable: "x : int".to_string(),
                operation_before: "m()".to_string(),
                operation_after: "m()".to_string(),
                inside_extracted_or_inlined_method: false,
                sub_expression_mappings: vec![],
                references: 1,
            };
            let response = InferResponse::new(
                "snap_0",
                "d.json",
                vec![],
                vec![
                    refactoring("Extract Variable"),
                    refactoring("Inline Variable"),
                    refactoring("Extract Variable"),
                ],
            );
            assert_eq!(response.summary.extract_variable, 2);
            assert_eq!(response.summary.inline_variable, 1);
        }

        #[test]
        fn replacement_type_serializes_as_type() {
            let r = ReplacementReport {
                before: "a".to_string(),
                after: "b".to_string(),
                replacement_type: "VARIABLE_NAME".to_string(),
            };
            let json = serde_json::to_string(&r).unwrap();
            assert!(json.contains("\"type\":\"VARIABLE_NAME\""));
        }
    }

    mod error_response_tests {
        use super::*;

        #[test]
        fn error_response_carries_code_and_path() {
            let err = RefinferError::file_not_found("missing.json");
            let response = ErrorResponse::from_error(&err, None);
            let json = serde_json::to_value(&response).unwrap();
            assert_eq!(json["status"], "error");
            assert_eq!(json["error"]["code"], 3);
            assert_eq!(json["error"]["details"]["path"], "missing.json");
            assert!(json.get("snapshot_id").is_none());
        }

        #[test]
        fn invalid_args_details_are_reported() {
            let err = RefinferError::invalid_args_with_details(
                "not a directory: a.json",
                serde_json::json!({ "path": "a.json" }),
            );
            let json = serde_json::to_value(ErrorResponse::from_error(&err, None)).unwrap();
            assert_eq!(json["error"]["code"], 2);
            assert_eq!(json["error"]["details"]["path"], "a.json");

            let bare = RefinferError::invalid_args("missing input");
            let json = serde_json::to_value(ErrorResponse::from_error(&bare, None)).unwrap();
            assert!(json["error"].get("details").is_none());
        }

        #[test]
        fn emit_compact_is_single_line() {
            let response = MappingsResponse::new("snap_1", vec!["A [0,1] -> A [2,3]".to_string()]);
            let mut out = Vec::new();
            emit_response_compact(&response, &mut out).unwrap();
            let text = String::from_utf8(out).unwrap();
            assert_eq!(text.lines().count(), 1);
            assert!(text.contains("A [0,1] -> A [2,3]"));
        }
    }
}

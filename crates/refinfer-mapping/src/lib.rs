//! Fragment mapping and replacement-inference engine.
//!
//! Given pairs of matched statement/expression fragments from two versions
//! of a program, this crate decides whether each pair is an exact match,
//! keeps the atomic textual differences ("replacements") between them, and
//! explains those differences as extract-variable or inline-variable
//! refactorings.
//!
//! - [`fragment`]: the fragment arena ([`FragmentStore`]) and fragment kinds
//! - [`replacement`]: replacements and their types
//! - [`mapping`]: [`CodeMapping`], exactness and the inference heuristics
//! - [`refactoring`]: inferred refactorings and the deduplicating [`RefactoringSet`]
//! - [`class_diff`]: facts about the enclosing class diff
//! - [`body_mapper`]: runs the heuristics over every mapping of a document
//! - [`document`]: the JSON diff document consumed by the CLI
//! - [`tree`]: AST node mappings as produced by the tree matcher

pub mod body_mapper;
pub mod call;
pub mod class_diff;
pub mod document;
pub mod fragment;
pub mod location;
pub mod mapping;
pub mod operation;
pub mod refactoring;
pub mod replacement;
pub mod ternary;
pub mod tree;
pub mod variable;

mod error_bridges;
mod inference;

pub use body_mapper::{BodyMapper, InferenceOptions};
pub use call::{Call, CallKind};
pub use class_diff::{ClassDiffContext, ClassDiffSnapshot, RenameOperationRefactoring};
pub use document::{DiffDocument, DocumentError};
pub use fragment::{CodeFragment, FragmentId, FragmentKind, FragmentStore};
pub use location::{CodeElementType, LocationInfo};
pub use mapping::{CodeMapping, InferenceContext, LeafMapping, MappingKey, MappingKind};
pub use operation::{Operation, OperationId};
pub use refactoring::{RefactoringKey, RefactoringSet, RefactoringType, VariableRefactoring};
pub use replacement::{Replacement, ReplacementPayload, ReplacementSet, ReplacementType};
pub use ternary::TernaryOperatorExpression;
pub use tree::{AstMapping, AstMappingStore, AstNode};
pub use variable::{VariableDeclaration, VariableId, VariableKind};

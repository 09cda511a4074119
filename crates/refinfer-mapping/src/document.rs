//! The diff document: the JSON input of the engine.
//!
//! A document carries everything the front end and the tree matcher
//! produced for one pair of operation bodies: fragments, variables and
//! operations, the fragment mappings with their replacements, the leaves
//! left unmapped on both sides, class-diff facts, and the raw AST node
//! mappings.
//!
//! Decoding happens in two steps. The JSON is first read into plain
//! `Raw*` records, then every cross reference is checked and the records
//! are moved into a [`FragmentStore`]. A dangling id is a
//! [`DocumentError`], never a panic later in the engine.
//!
//! ```json
//! {
//!   "file_path": "src/Clock.java",
//!   "operations": [{ "id": 0, "name": "tick", "class_name": "Clock" }],
//!   "fragments": [
//!     { "id": 0, "kind": "statement", "element_type": "RETURN_STATEMENT",
//!       "span": { "start": 10, "end": 30 }, "text": "return x+1;\n" }
//!   ],
//!   "mappings": [
//!     { "fragment1": 0, "fragment2": 1, "operation1": 0, "operation2": 1,
//!       "replacements": [{ "before": "a.b()", "after": "x", "type": "VARIABLE_NAME" }] }
//!   ],
//!   "non_mapped_leaves2": [2]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use refinfer_core::types::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::call::Call;
use crate::class_diff::ClassDiffSnapshot;
use crate::fragment::{CodeFragment, FragmentId, FragmentKind, FragmentStore};
use crate::location::{CodeElementType, LocationInfo};
use crate::mapping::{CodeMapping, MappingKind};
use crate::operation::{Operation, OperationId};
use crate::replacement::Replacement;
use crate::ternary::TernaryOperatorExpression;
use crate::tree::{AstMapping, AstMappingStore};
use crate::variable::{VariableDeclaration, VariableId, VariableKind};

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while decoding a diff document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{context} refers to unknown fragment {id}")]
    UnknownFragment { id: u32, context: String },

    #[error("{context} refers to unknown variable {id}")]
    UnknownVariable { id: u32, context: String },

    #[error("{context} refers to unknown operation {id}")]
    UnknownOperation { id: u32, context: String },

    #[error("duplicate {entity} id {id}")]
    DuplicateId { entity: &'static str, id: u32 },

    #[error("fragment {id} has an invalid span [{start},{end}]")]
    InvalidSpan { id: u32, start: u64, end: u64 },

    /// Any of the above, attributed to a file.
    #[error("{path}: {source}")]
    InFile {
        path: String,
        #[source]
        source: Box<DocumentError>,
    },
}

impl DocumentError {
    /// Attribute this error to `path`.
    pub fn in_file(self, path: impl Into<String>) -> Self {
        match self {
            DocumentError::Io { .. } | DocumentError::InFile { .. } => self,
            other => DocumentError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Whether the error is a reference to an id the document never defines.
    pub fn is_unresolved_reference(&self) -> bool {
        match self {
            DocumentError::UnknownFragment { .. }
            | DocumentError::UnknownVariable { .. }
            | DocumentError::UnknownOperation { .. } => true,
            DocumentError::InFile { source, .. } => source.is_unresolved_reference(),
            _ => false,
        }
    }
}

// ============================================================================
// Raw records
// ============================================================================

/// Fragment kind as written in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawFragmentKind {
    Statement,
    CompositeStatement,
    Expression,
    LeafExpression,
    Ternary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTernary {
    pub condition: u32,
    pub then: u32,
    #[serde(rename = "else")]
    pub else_: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFragment {
    pub id: u32,
    pub kind: RawFragmentKind,
    pub element_type: CodeElementType,
    pub span: Span,
    /// Overrides the document's `file_path`.
    #[serde(default)]
    pub file: Option<String>,
    pub text: String,
    /// Defaults to `text`.
    #[serde(default)]
    pub argumentized: Option<String>,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub variables: Vec<u32>,
    #[serde(default)]
    pub invocation: Option<Call>,
    #[serde(default)]
    pub creation: Option<Call>,
    #[serde(default)]
    pub ternaries: Vec<u32>,
    #[serde(default)]
    pub infix: Vec<u32>,
    #[serde(default)]
    pub children: Vec<u32>,
    /// Required when `kind` is `ternary`.
    #[serde(default)]
    pub ternary: Option<RawTernary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVariable {
    pub id: u32,
    pub name: String,
    #[serde(default, rename = "type")]
    pub var_type: Option<String>,
    #[serde(default)]
    pub initializer: Option<u32>,
    pub scope: Span,
    #[serde(default)]
    pub kind: VariableKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOperation {
    pub id: u32,
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub variables: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMapping {
    #[serde(default)]
    pub kind: MappingKind,
    pub fragment1: u32,
    pub fragment2: u32,
    pub operation1: u32,
    pub operation2: u32,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

/// A diff document exactly as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
    #[serde(default)]
    pub variables: Vec<RawVariable>,
    #[serde(default)]
    pub fragments: Vec<RawFragment>,
    #[serde(default)]
    pub mappings: Vec<RawMapping>,
    #[serde(default)]
    pub non_mapped_leaves1: Vec<u32>,
    #[serde(default)]
    pub non_mapped_leaves2: Vec<u32>,
    #[serde(default)]
    pub class_diff: ClassDiffSnapshot,
    #[serde(default)]
    pub ast_mappings: Vec<AstMapping>,
}

// ============================================================================
// Validated document
// ============================================================================

/// A validated diff document.
#[derive(Debug)]
pub struct DiffDocument {
    pub file_path: String,
    pub store: FragmentStore,
    /// Mappings in document order, duplicates included.
    pub mappings: Vec<CodeMapping>,
    pub non_mapped_leaves_t1: Vec<FragmentId>,
    pub non_mapped_leaves_t2: Vec<FragmentId>,
    pub class_diff: ClassDiffSnapshot,
    pub ast_mappings: AstMappingStore,
}

impl DiffDocument {
    /// Decode and validate a document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Read, decode and validate the document at `path`.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let display = path.display().to_string();
        let json = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&json).map_err(|e| e.in_file(display))
    }

    /// Validate a raw document.
    pub fn from_raw(raw: RawDocument) -> Result<Self, DocumentError> {
        let fragment_ids = unique_ids("fragment", raw.fragments.iter().map(|f| f.id))?;
        let variable_ids = unique_ids("variable", raw.variables.iter().map(|v| v.id))?;
        let operation_ids = unique_ids("operation", raw.operations.iter().map(|o| o.id))?;
        let refs = References {
            fragments: &fragment_ids,
            variables: &variable_ids,
            operations: &operation_ids,
        };

        let mut store = FragmentStore::new();
        for op in raw.operations {
            let context = format!("operation {}", op.id);
            let variables = op
                .variables
                .iter()
                .map(|&v| refs.variable(v, &context))
                .collect::<Result<Vec<_>, _>>()?;
            let operation = Operation {
                id: OperationId(op.id),
                name: op.name,
                class_name: op.class_name,
                parameters: op.parameters,
                variables,
            };
            store.insert_operation(operation);
        }

        for var in raw.variables {
            let context = format!("variable {}", var.id);
            let initializer = var
                .initializer
                .map(|f| refs.fragment(f, &context))
                .transpose()?;
            let mut declaration = VariableDeclaration::new(
                VariableId(var.id),
                var.name,
                var.var_type.as_deref(),
                var.scope,
            )
            .with_kind(var.kind);
            declaration.initializer = initializer;
            store.insert_variable(declaration);
        }

        for raw_fragment in raw.fragments {
            let fragment = build_fragment(raw_fragment, &raw.file_path, &refs)?;
            store.insert_fragment(fragment);
        }

        let mut mappings = Vec::with_capacity(raw.mappings.len());
        for (idx, m) in raw.mappings.into_iter().enumerate() {
            let context = format!("mapping {idx}");
            let mut mapping = CodeMapping::new(
                m.kind,
                refs.fragment(m.fragment1, &context)?,
                refs.fragment(m.fragment2, &context)?,
                refs.operation(m.operation1, &context)?,
                refs.operation(m.operation2, &context)?,
            );
            mapping.add_replacements(m.replacements);
            mappings.push(mapping);
        }

        let non_mapped_leaves_t1 = raw
            .non_mapped_leaves1
            .iter()
            .map(|&f| refs.fragment(f, "non_mapped_leaves1"))
            .collect::<Result<Vec<_>, _>>()?;
        let non_mapped_leaves_t2 = raw
            .non_mapped_leaves2
            .iter()
            .map(|&f| refs.fragment(f, "non_mapped_leaves2"))
            .collect::<Result<Vec<_>, _>>()?;

        let class_diff = raw.class_diff;
        for rename in &class_diff.renamed_operations {
            refs.operation(rename.original.0, "class_diff.renamed_operations")?;
            refs.operation(rename.renamed.0, "class_diff.renamed_operations")?;
        }
        for op in class_diff
            .removed_operations
            .iter()
            .chain(&class_diff.added_operations)
        {
            refs.operation(op.0, "class_diff")?;
        }

        Ok(DiffDocument {
            file_path: raw.file_path,
            store,
            mappings,
            non_mapped_leaves_t1,
            non_mapped_leaves_t2,
            class_diff,
            ast_mappings: raw.ast_mappings.into_iter().collect(),
        })
    }
}

fn unique_ids(entity: &'static str, ids: impl Iterator<Item = u32>) -> Result<HashSet<u32>, DocumentError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DocumentError::DuplicateId { entity, id });
        }
    }
    Ok(seen)
}

/// Known ids of one document.
struct References<'r> {
    fragments: &'r HashSet<u32>,
    variables: &'r HashSet<u32>,
    operations: &'r HashSet<u32>,
}

impl References<'_> {
    fn fragment(&self, id: u32, context: &str) -> Result<FragmentId, DocumentError> {
        if self.fragments.contains(&id) {
            Ok(FragmentId(id))
        } else {
            Err(DocumentError::UnknownFragment {
                id,
                context: context.to_string(),
            })
        }
    }

    fn fragments(&self, ids: &[u32], context: &str) -> Result<Vec<FragmentId>, DocumentError> {
        ids.iter().map(|&id| self.fragment(id, context)).collect()
    }

    fn variable(&self, id: u32, context: &str) -> Result<VariableId, DocumentError> {
        if self.variables.contains(&id) {
            Ok(VariableId(id))
        } else {
            Err(DocumentError::UnknownVariable {
                id,
                context: context.to_string(),
            })
        }
    }

    fn operation(&self, id: u32, context: &str) -> Result<OperationId, DocumentError> {
        if self.operations.contains(&id) {
            Ok(OperationId(id))
        } else {
            Err(DocumentError::UnknownOperation {
                id,
                context: context.to_string(),
            })
        }
    }
}

fn build_fragment(
    raw: RawFragment,
    default_file: &str,
    refs: &References<'_>,
) -> Result<CodeFragment, DocumentError> {
    let context = format!("fragment {}", raw.id);
    if raw.span.start > raw.span.end {
        return Err(DocumentError::InvalidSpan {
            id: raw.id,
            start: raw.span.start,
            end: raw.span.end,
        });
    }
    let kind = match raw.kind {
        RawFragmentKind::Statement => FragmentKind::Statement,
        RawFragmentKind::CompositeStatement => FragmentKind::CompositeStatement,
        RawFragmentKind::Expression => FragmentKind::Expression,
        RawFragmentKind::LeafExpression => FragmentKind::LeafExpression,
        RawFragmentKind::Ternary => {
            let Some(parts) = &raw.ternary else {
                return Err(DocumentError::UnknownFragment {
                    id: raw.id,
                    context: format!("{context} (ternary without branches)"),
                });
            };
            let mut ternary = TernaryOperatorExpression::new(
                refs.fragment(parts.condition, &context)?,
                refs.fragment(parts.then, &context)?,
                refs.fragment(parts.else_, &context)?,
            );
            ternary.id = FragmentId(raw.id);
            FragmentKind::Ternary(ternary)
        }
    };
    let file = raw.file.as_deref().unwrap_or(default_file);
    let location = LocationInfo::new(file, raw.span, raw.element_type);
    let variables = raw
        .variables
        .iter()
        .map(|&v| refs.variable(v, &context))
        .collect::<Result<Vec<_>, _>>()?;
    let parent = raw.parent.map(|p| refs.fragment(p, &context)).transpose()?;

    let mut fragment = CodeFragment::new(kind, location, raw.text);
    fragment.id = FragmentId(raw.id);
    if let Some(argumentized) = raw.argumentized {
        fragment.argumentized = argumentized;
    }
    fragment.parent = parent;
    fragment.variable_declarations = variables;
    fragment.invocation = raw.invocation;
    fragment.creation = raw.creation;
    fragment.ternary_expressions = refs.fragments(&raw.ternaries, &context)?;
    fragment.infix_expressions = refs.fragments(&raw.infix, &context)?;
    fragment.sub_expressions = refs.fragments(&raw.children, &context)?;
    Ok(fragment)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRACT: &str = r#"{
        "file_path": "src/Pricing.java",
        "operations": [
            { "id": 0, "name": "total", "class_name": "Pricing" },
            { "id": 1, "name": "total", "class_name": "Pricing", "variables": [0] }
        ],
        "variables": [
            { "id": 0, "name": "base", "type": "int", "initializer": 4,
              "scope": { "start": 0, "end": 1000 } }
        ],
        "fragments": [
            { "id": 0, "kind": "leaf_expression", "element_type": "METHOD_INVOCATION",
              "span": { "start": 17, "end": 28 }, "text": "item.price()", "parent": 1 },
            { "id": 1, "kind": "statement", "element_type": "RETURN_STATEMENT",
              "span": { "start": 10, "end": 35 }, "text": "return item.price()*2;\n",
              "children": [0] },
            { "id": 2, "kind": "statement", "element_type": "RETURN_STATEMENT",
              "span": { "start": 60, "end": 75 }, "text": "return base*2;\n" },
            { "id": 3, "kind": "statement", "element_type": "VARIABLE_DECLARATION_STATEMENT",
              "span": { "start": 40, "end": 58 }, "text": "int base=item.price();\n",
              "variables": [0], "children": [4] },
            { "id": 4, "kind": "expression", "element_type": "METHOD_INVOCATION",
              "span": { "start": 49, "end": 61 }, "text": "item.price()" }
        ],
        "mappings": [
            { "fragment1": 1, "fragment2": 2, "operation1": 0, "operation2": 1,
              "replacements": [
                  { "before": "item.price()", "after": "base", "type": "VARIABLE_NAME" }
              ] }
        ],
        "non_mapped_leaves2": [3]
    }"#;

    #[test]
    fn decodes_and_links_fragments() {
        let doc = DiffDocument::from_json(EXTRACT).unwrap();
        assert_eq!(doc.store.fragment_count(), 5);
        assert_eq!(doc.mappings.len(), 1);
        assert_eq!(doc.non_mapped_leaves_t2, vec![FragmentId(3)]);
        let leaf = doc.store.fragment(FragmentId(0)).unwrap();
        assert_eq!(leaf.location.file_path, "src/Pricing.java");
        assert_eq!(leaf.argumentized, "item.price()");
        let decl = doc.store.variable_declaration(FragmentId(3), "base").unwrap();
        assert_eq!(decl.initializer, Some(FragmentId(4)));
        assert_eq!(decl.to_string(), "base : int");
        assert_eq!(doc.mappings[0].replacements().len(), 1);
    }

    #[test]
    fn dangling_references_are_rejected() {
        let json = EXTRACT.replace(r#""non_mapped_leaves2": [3]"#, r#""non_mapped_leaves2": [9]"#);
        let err = DiffDocument::from_json(&json).unwrap_err();
        assert!(matches!(err, DocumentError::UnknownFragment { id: 9, .. }));
        assert!(err.is_unresolved_reference());

        let json = EXTRACT.replace(r#""operation2": 1"#, r#""operation2": 7"#);
        let err = DiffDocument::from_json(&json).unwrap_err();
        assert!(matches!(err, DocumentError::UnknownOperation { id: 7, .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = EXTRACT.replace(r#""id": 4, "kind""#, r#""id": 3, "kind""#);
        let err = DiffDocument::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::DuplicateId {
                entity: "fragment",
                id: 3
            }
        ));
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = DiffDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
        assert!(!err.is_unresolved_reference());
        let err = err.in_file("a.json");
        assert!(err.to_string().starts_with("a.json: invalid JSON"));
    }

    #[test]
    fn ternary_fragments_need_known_branches() {
        let doc = DiffDocument::from_json(
            r#"{
                "fragments": [
                    { "id": 0, "kind": "expression", "element_type": "SIMPLE_NAME",
                      "span": { "start": 0, "end": 1 }, "text": "c" },
                    { "id": 1, "kind": "expression", "element_type": "SIMPLE_NAME",
                      "span": { "start": 4, "end": 5 }, "text": "a" },
                    { "id": 2, "kind": "expression", "element_type": "SIMPLE_NAME",
                      "span": { "start": 8, "end": 9 }, "text": "b" },
                    { "id": 3, "kind": "ternary", "element_type": "TERNARY_OPERATOR",
                      "span": { "start": 0, "end": 9 }, "text": "c ? a : b",
                      "ternary": { "condition": 0, "then": 1, "else": 2 } }
                ]
            }"#,
        )
        .unwrap();
        let ternary = doc.store.fragment(FragmentId(3)).unwrap().ternary().copied().unwrap();
        assert_eq!(ternary.id, FragmentId(3));
        assert_eq!(ternary.branch(&doc.store, "b"), Some(FragmentId(2)));

        let err = DiffDocument::from_json(
            r#"{ "fragments": [
                { "id": 0, "kind": "ternary", "element_type": "TERNARY_OPERATOR",
                  "span": { "start": 0, "end": 9 }, "text": "c ? a : b",
                  "ternary": { "condition": 5, "then": 6, "else": 7 } }
            ] }"#,
        )
        .unwrap_err();
        assert!(err.is_unresolved_reference());
    }

    #[test]
    fn largest_ids_are_accepted() {
        let doc = DiffDocument::from_json(
            r#"{
                "operations": [ { "id": 4294967295, "name": "m", "class_name": "A" } ],
                "variables": [
                    { "id": 4294967295, "name": "x", "scope": { "start": 0, "end": 9 } }
                ],
                "fragments": [
                    { "id": 4294967295, "kind": "statement", "element_type": "RETURN_STATEMENT",
                      "span": { "start": 0, "end": 9 }, "text": "return x;\n" }
                ],
                "mappings": [
                    { "fragment1": 4294967295, "fragment2": 4294967295,
                      "operation1": 4294967295, "operation2": 4294967295 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.mappings[0].fragment1, FragmentId(u32::MAX));
        assert_eq!(doc.store.text(FragmentId(u32::MAX)), "return x;\n");
        assert!(doc.store.variable(VariableId(u32::MAX)).is_some());
        assert!(doc.store.operation(OperationId(u32::MAX)).is_some());
    }

    #[test]
    fn inverted_span_is_rejected() {
        let err = DiffDocument::from_json(
            r#"{ "fragments": [
                { "id": 0, "kind": "expression", "element_type": "SIMPLE_NAME",
                  "span": { "start": 9, "end": 1 }, "text": "c" }
            ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidSpan { id: 0, .. }));
    }

    #[test]
    fn ast_mappings_are_deduplicated_on_load() {
        let doc = DiffDocument::from_json(
            r#"{ "ast_mappings": [
                { "src": { "type": "ReturnStatement", "span": { "start": 17511, "end": 17714 } },
                  "dst": { "type": "ReturnStatement", "span": { "start": 17511, "end": 17714 } } },
                { "src": { "type": "ReturnStatement", "span": { "start": 17511, "end": 17714 } },
                  "dst": { "type": "ReturnStatement", "span": { "start": 17511, "end": 17714 } } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(doc.ast_mappings.len(), 1);
    }
}

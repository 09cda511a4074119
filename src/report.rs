//! Conversion from engine results to report types.
//!
//! The engine works with ids into a [`FragmentStore`]; reports carry the
//! rendered text and locations so they can be serialized on their own.

use std::fmt::Write as _;

use refinfer_core::output::{
    InferResponse, MappingReport, RefactoringReport, ReplacementReport, SubExpressionReport,
};
use refinfer_core::types::{Location, Span};
use refinfer_mapping::{
    CodeMapping, FragmentId, FragmentStore, LeafMapping, RefactoringSet, VariableRefactoring,
};

fn location(store: &FragmentStore, id: FragmentId) -> Location {
    store
        .fragment(id)
        .map(|f| f.location.to_location())
        .unwrap_or_else(|| Location::new("", Span::new(0, 0)))
}

/// Report one mapping after inference.
pub fn mapping_report(
    store: &FragmentStore,
    refactorings: &RefactoringSet,
    mapping: &CodeMapping,
) -> MappingReport {
    MappingReport {
        fragment1: store.text(mapping.fragment1).to_string(),
        fragment2: store.text(mapping.fragment2).to_string(),
        location1: location(store, mapping.fragment1),
        location2: location(store, mapping.fragment2),
        exact: mapping.is_exact(store),
        replacements: mapping
            .replacements()
            .iter()
            .map(|r| ReplacementReport {
                before: r.before.clone(),
                after: r.after.clone(),
                replacement_type: r.replacement_type.name().to_string(),
            })
            .collect(),
        identical_with_extracted_variable: mapping.is_identical_with_extracted_variable(),
        identical_with_inlined_variable: mapping.is_identical_with_inlined_variable(),
        refactorings: mapping
            .refactorings()
            .iter()
            .filter_map(|key| refactorings.get(key))
            .map(|r| r.describe(store))
            .collect(),
    }
}

fn sub_expression_report(store: &FragmentStore, leaf: &LeafMapping) -> SubExpressionReport {
    SubExpressionReport {
        before: store.text(leaf.fragment1).to_string(),
        after: store.text(leaf.fragment2).to_string(),
        location1: location(store, leaf.fragment1),
        location2: location(store, leaf.fragment2),
    }
}

/// Report one inferred refactoring.
pub fn refactoring_report(
    store: &FragmentStore,
    refactoring: &VariableRefactoring,
) -> RefactoringReport {
    let operation = |id| {
        store
            .operation(id)
            .map(|op| op.to_string())
            .unwrap_or_default()
    };
    RefactoringReport {
        refactoring_type: refactoring.refactoring_type.to_string(),
        description: refactoring.describe(store),
        variable: store
            .variable(refactoring.variable)
            .map(|v| v.to_string())
            .unwrap_or_default(),
        operation_before: operation(refactoring.operation1),
        operation_after: operation(refactoring.operation2),
        inside_extracted_or_inlined_method: refactoring.inside_extracted_or_inlined_method,
        sub_expression_mappings: refactoring
            .sub_expression_mappings()
            .iter()
            .map(|leaf| sub_expression_report(store, leaf))
            .collect(),
        references: refactoring.references().len(),
    }
}

/// Build the `infer` response for one document.
pub fn infer_response(
    snapshot_id: &str,
    document: &str,
    store: &FragmentStore,
    mappings: &[CodeMapping],
    refactorings: &RefactoringSet,
) -> InferResponse {
    InferResponse::new(
        snapshot_id,
        document,
        mappings
            .iter()
            .map(|m| mapping_report(store, refactorings, m))
            .collect(),
        refactorings
            .iter()
            .map(|r| refactoring_report(store, r))
            .collect(),
    )
}

/// Render a response as text: one line per refactoring, then one line
/// per mapping that carries replacements.
pub fn render_text(response: &InferResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} mappings ({} exact), {} extract, {} inline",
        response.document,
        response.summary.mappings,
        response.summary.exact_mappings,
        response.summary.extract_variable,
        response.summary.inline_variable
    );
    for refactoring in &response.refactorings {
        let _ = writeln!(out, "  {}", refactoring.description);
    }
    for mapping in response.mappings.iter().filter(|m| !m.replacements.is_empty()) {
        let replacements: Vec<String> = mapping
            .replacements
            .iter()
            .map(|r| format!("{} -> {}", r.before, r.after))
            .collect();
        let _ = writeln!(
            out,
            "  {} {} [{}]",
            mapping.location1.file,
            mapping.location1.span,
            replacements.join(", ")
        );
    }
    out
}

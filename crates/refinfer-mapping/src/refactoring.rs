//! Inferred variable refactorings and their deduplicating collection.
//!
//! Several mappings can independently discover the same refactoring.
//! Candidates are identified by a structural [`RefactoringKey`]
//! (type, declaration, operation pair); the [`RefactoringSet`] keeps one
//! accumulator per key and merges the references and sub-expression
//! mappings of later candidates into it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fragment::FragmentStore;
use crate::mapping::{LeafMapping, MappingKey};
use crate::operation::OperationId;
use crate::variable::VariableId;

/// Refactoring kinds produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefactoringType {
    ExtractVariable,
    InlineVariable,
}

impl RefactoringType {
    pub fn display_name(&self) -> &'static str {
        match self {
            RefactoringType::ExtractVariable => "Extract Variable",
            RefactoringType::InlineVariable => "Inline Variable",
        }
    }
}

impl fmt::Display for RefactoringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Structural identity of a variable refactoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefactoringKey {
    pub refactoring_type: RefactoringType,
    pub variable: VariableId,
    pub operation1: OperationId,
    pub operation2: OperationId,
}

/// An extract-variable or inline-variable refactoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRefactoring {
    pub refactoring_type: RefactoringType,
    /// The introduced (extract) or removed (inline) variable.
    pub variable: VariableId,
    pub operation1: OperationId,
    pub operation2: OperationId,
    pub inside_extracted_or_inlined_method: bool,
    sub_expression_mappings: Vec<LeafMapping>,
    references: Vec<MappingKey>,
}

impl VariableRefactoring {
    pub fn new(
        refactoring_type: RefactoringType,
        variable: VariableId,
        operation1: OperationId,
        operation2: OperationId,
        inside_extracted_or_inlined_method: bool,
    ) -> Self {
        VariableRefactoring {
            refactoring_type,
            variable,
            operation1,
            operation2,
            inside_extracted_or_inlined_method,
            sub_expression_mappings: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn extract(
        variable: VariableId,
        operation1: OperationId,
        operation2: OperationId,
        inside_extracted_or_inlined_method: bool,
    ) -> Self {
        Self::new(
            RefactoringType::ExtractVariable,
            variable,
            operation1,
            operation2,
            inside_extracted_or_inlined_method,
        )
    }

    pub fn inline(
        variable: VariableId,
        operation1: OperationId,
        operation2: OperationId,
        inside_extracted_or_inlined_method: bool,
    ) -> Self {
        Self::new(
            RefactoringType::InlineVariable,
            variable,
            operation1,
            operation2,
            inside_extracted_or_inlined_method,
        )
    }

    pub fn key(&self) -> RefactoringKey {
        RefactoringKey {
            refactoring_type: self.refactoring_type,
            variable: self.variable,
            operation1: self.operation1,
            operation2: self.operation2,
        }
    }

    /// Add a sub-expression mapping unless the same fragment pair is present.
    pub fn add_sub_expression_mapping(&mut self, leaf: LeafMapping) {
        let present = self
            .sub_expression_mappings
            .iter()
            .any(|m| m.fragment1 == leaf.fragment1 && m.fragment2 == leaf.fragment2);
        if !present {
            self.sub_expression_mappings.push(leaf);
        }
    }

    /// Record a supporting mapping unless already recorded.
    pub fn add_reference(&mut self, mapping: MappingKey) {
        if !self.references.contains(&mapping) {
            self.references.push(mapping);
        }
    }

    pub fn sub_expression_mappings(&self) -> &[LeafMapping] {
        &self.sub_expression_mappings
    }

    pub fn references(&self) -> &[MappingKey] {
        &self.references
    }

    /// Human-readable description.
    ///
    /// Extractions name the operation of the second version, inlinings the
    /// operation of the first.
    pub fn describe(&self, store: &FragmentStore) -> String {
        let variable = store
            .variable(self.variable)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let op = match self.refactoring_type {
            RefactoringType::ExtractVariable => store.operation(self.operation2),
            RefactoringType::InlineVariable => store.operation(self.operation1),
        };
        let (method, class) = op
            .map(|o| (o.to_string(), o.class_name.clone()))
            .unwrap_or_default();
        format!(
            "{} {} in method {} from class {}",
            self.refactoring_type, variable, method, class
        )
    }
}

// ============================================================================
// Refactoring Set
// ============================================================================

/// Insertion-ordered, key-deduplicated collection of variable refactorings.
#[derive(Debug, Clone, Default)]
pub struct RefactoringSet {
    entries: Vec<VariableRefactoring>,
    index: HashMap<RefactoringKey, usize>,
}

impl RefactoringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `candidate` as supported by `reference`.
    ///
    /// A new key stores the candidate with `reference` as its first
    /// reference. A known key keeps the stored entry, adds `reference` and
    /// unions in the candidate's sub-expression mappings; the candidate
    /// itself is dropped.
    pub fn process(&mut self, mut candidate: VariableRefactoring, reference: MappingKey) -> RefactoringKey {
        let key = candidate.key();
        match self.index.get(&key) {
            Some(&idx) => {
                let existing = &mut self.entries[idx];
                existing.add_reference(reference);
                for leaf in candidate.sub_expression_mappings {
                    existing.add_sub_expression_mapping(leaf);
                }
            }
            None => {
                candidate.add_reference(reference);
                self.index.insert(key, self.entries.len());
                self.entries.push(candidate);
            }
        }
        key
    }

    pub fn get(&self, key: &RefactoringKey) -> Option<&VariableRefactoring> {
        self.index.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, key: &RefactoringKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableRefactoring> {
        self.entries.iter()
    }

    /// Extract-variable entries, in discovery order.
    pub fn extract_variables(&self) -> impl Iterator<Item = &VariableRefactoring> {
        self.entries
            .iter()
            .filter(|r| r.refactoring_type == RefactoringType::ExtractVariable)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<VariableRefactoring> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a RefactoringSet {
    type Item = &'a VariableRefactoring;
    type IntoIter = std::slice::Iter<'a, VariableRefactoring>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! Fragment mappings.
//!
//! A [`CodeMapping`] pairs a fragment of the first version with a fragment
//! of the second, together with the enclosing operations. It owns the
//! replacements found between the two fragments and decides whether the
//! pair is an exact match.
//!
//! For inexact pairs the mapping can try to explain its replacements as an
//! extracted or inlined variable (see
//! [`CodeMapping::temporary_variable_assignment`] and
//! [`CodeMapping::inlined_variable_assignment`]). Accepted explanations are
//! registered in a caller-owned [`RefactoringSet`] and their keys recorded
//! on the mapping.
//!
//! Identity of a mapping is the identity of its fragment pair and
//! operations ([`MappingKey`]); replacements and flags never take part in
//! equality.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::class_diff::ClassDiffContext;
use crate::fragment::{CodeFragment, FragmentId, FragmentStore};
use crate::inference::{Direction, Inference};
use crate::location::CodeElementType;
use crate::operation::OperationId;
use crate::refactoring::{RefactoringKey, RefactoringSet};
use crate::replacement::{Replacement, ReplacementSet, ReplacementType};

// ============================================================================
// Keys and Leaf Mappings
// ============================================================================

/// Leaf (statement-level) or composite (statement-with-body) mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    #[default]
    Leaf,
    Composite,
}

/// Identity of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingKey {
    pub fragment1: FragmentId,
    pub fragment2: FragmentId,
    pub operation1: OperationId,
    pub operation2: OperationId,
}

/// A bare fragment pair, used for the sub-expressions bound by a refactoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafMapping {
    pub fragment1: FragmentId,
    pub fragment2: FragmentId,
    pub operation1: OperationId,
    pub operation2: OperationId,
}

impl LeafMapping {
    pub fn new(
        fragment1: FragmentId,
        fragment2: FragmentId,
        operation1: OperationId,
        operation2: OperationId,
    ) -> Self {
        LeafMapping {
            fragment1,
            fragment2,
            operation1,
            operation2,
        }
    }
}

// ============================================================================
// Inference Context
// ============================================================================

/// Read-only inputs shared by every inference call of one body mapping.
#[derive(Clone, Copy)]
pub struct InferenceContext<'a> {
    pub store: &'a FragmentStore,
    /// Class-level diff, absent when mapping bodies outside a class diff.
    pub class_diff: Option<&'a dyn ClassDiffContext>,
    /// Set while matching the body of an extracted or inlined method.
    pub inside_extracted_or_inlined_method: bool,
}

impl<'a> InferenceContext<'a> {
    pub fn new(store: &'a FragmentStore) -> Self {
        InferenceContext {
            store,
            class_diff: None,
            inside_extracted_or_inlined_method: false,
        }
    }

    pub fn with_class_diff(mut self, class_diff: &'a dyn ClassDiffContext) -> Self {
        self.class_diff = Some(class_diff);
        self
    }

    pub fn inside_extracted_or_inlined_method(mut self, inside: bool) -> Self {
        self.inside_extracted_or_inlined_method = inside;
        self
    }
}

impl fmt::Debug for InferenceContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceContext")
            .field("fragments", &self.store.fragment_count())
            .field("class_diff", &self.class_diff.is_some())
            .field(
                "inside_extracted_or_inlined_method",
                &self.inside_extracted_or_inlined_method,
            )
            .finish()
    }
}

// ============================================================================
// CodeMapping
// ============================================================================

/// A matched fragment pair and what is known about it.
#[derive(Debug, Clone)]
pub struct CodeMapping {
    pub fragment1: FragmentId,
    pub fragment2: FragmentId,
    pub operation1: OperationId,
    pub operation2: OperationId,
    pub kind: MappingKind,
    pub(crate) replacements: ReplacementSet,
    pub(crate) identical_with_extracted_variable: bool,
    pub(crate) identical_with_inlined_variable: bool,
    pub(crate) refactorings: Vec<RefactoringKey>,
}

impl CodeMapping {
    pub fn new(
        kind: MappingKind,
        fragment1: FragmentId,
        fragment2: FragmentId,
        operation1: OperationId,
        operation2: OperationId,
    ) -> Self {
        CodeMapping {
            fragment1,
            fragment2,
            operation1,
            operation2,
            kind,
            replacements: ReplacementSet::new(),
            identical_with_extracted_variable: false,
            identical_with_inlined_variable: false,
            refactorings: Vec::new(),
        }
    }

    pub fn leaf(
        fragment1: FragmentId,
        fragment2: FragmentId,
        operation1: OperationId,
        operation2: OperationId,
    ) -> Self {
        Self::new(MappingKind::Leaf, fragment1, fragment2, operation1, operation2)
    }

    pub fn composite(
        fragment1: FragmentId,
        fragment2: FragmentId,
        operation1: OperationId,
        operation2: OperationId,
    ) -> Self {
        Self::new(MappingKind::Composite, fragment1, fragment2, operation1, operation2)
    }

    pub fn key(&self) -> MappingKey {
        MappingKey {
            fragment1: self.fragment1,
            fragment2: self.fragment2,
            operation1: self.operation1,
            operation2: self.operation2,
        }
    }

    // ------------------------------------------------------------------------
    // Replacements
    // ------------------------------------------------------------------------

    pub fn add_replacement(&mut self, replacement: Replacement) {
        self.replacements.insert(replacement);
    }

    pub fn add_replacements(&mut self, replacements: impl IntoIterator<Item = Replacement>) {
        self.replacements.extend(replacements);
    }

    pub fn replacements(&self) -> &ReplacementSet {
        &self.replacements
    }

    pub fn contains_replacement(&self, replacement_type: ReplacementType) -> bool {
        self.replacements
            .iter()
            .any(|r| r.replacement_type == replacement_type)
    }

    /// Non-empty and every replacement has `replacement_type`.
    pub fn contains_only_replacement(&self, replacement_type: ReplacementType) -> bool {
        !self.replacements.is_empty()
            && self
                .replacements
                .iter()
                .all(|r| r.replacement_type == replacement_type)
    }

    /// Distinct replacement types, in first-seen order.
    pub fn replacement_types(&self) -> Vec<ReplacementType> {
        let mut types = Vec::new();
        for r in &self.replacements {
            if !types.contains(&r.replacement_type) {
                types.push(r.replacement_type);
            }
        }
        types
    }

    pub fn contains_composite_replacement(&self) -> Option<&Replacement> {
        self.replacements
            .iter()
            .find(|r| r.replacement_type == ReplacementType::Composite)
    }

    /// Replacements this mapping shares with `other`.
    pub fn common_replacements(&self, other: &CodeMapping) -> ReplacementSet {
        self.replacements.intersection(&other.replacements)
    }

    pub fn replacements_involving_method_invocation(&self) -> Vec<&Replacement> {
        self.replacements
            .iter()
            .filter(|r| r.involves_method_invocation())
            .collect()
    }

    /// A `VARIABLE_NAME` replacement renames `name` on either side.
    pub(crate) fn contains_variable_name_replacement(&self, name: &str) -> bool {
        self.replacements.iter().any(|r| {
            r.replacement_type == ReplacementType::VariableName
                && (r.before == name || r.after == name)
        })
    }

    // ------------------------------------------------------------------------
    // Flags and refactorings
    // ------------------------------------------------------------------------

    pub fn is_identical_with_extracted_variable(&self) -> bool {
        self.identical_with_extracted_variable
    }

    pub fn is_identical_with_inlined_variable(&self) -> bool {
        self.identical_with_inlined_variable
    }

    /// Keys of the refactorings this mapping supports, in order.
    pub fn refactorings(&self) -> &[RefactoringKey] {
        &self.refactorings
    }

    pub fn add_refactoring(&mut self, key: RefactoringKey) {
        if !self.refactorings.contains(&key) {
            self.refactorings.push(key);
        }
    }

    pub fn equal_container(&self) -> bool {
        self.operation1 == self.operation2
    }

    // ------------------------------------------------------------------------
    // Exactness
    // ------------------------------------------------------------------------

    /// Whether the two fragments are equivalent despite their replacements.
    ///
    /// Never true when the first fragment is a keyword statement.
    pub fn is_exact(&self, store: &FragmentStore) -> bool {
        let (Some(f1), Some(f2)) = (store.fragment(self.fragment1), store.fragment(self.fragment2))
        else {
            return false;
        };
        if f1.is_keyword() {
            return false;
        }
        f1.argumentized == f2.argumentized
            || self.argumentized_string_exact_after_type_replacement(&f1.argumentized, &f2.argumentized)
            || f1.text == f2.text
            || Self::is_exact_after_abstraction(f1, f2)
            || self.contains_identical_or_composite_replacement()
    }

    fn argumentized_string_exact_after_type_replacement(&self, s1: &str, s2: &str) -> bool {
        self.replacements
            .iter()
            .filter(|r| r.replacement_type == ReplacementType::Type)
            .any(|r| {
                if !(s1.starts_with(&r.before) && s2.starts_with(&r.after)) {
                    return false;
                }
                let restored = s2.replace(&r.after, &r.before);
                restored == s1 || restored == format!("{s1};\n")
            })
    }

    fn is_exact_after_abstraction(f1: &CodeFragment, f2: &CodeFragment) -> bool {
        if let (Some(i1), Some(i2)) = (&f1.invocation, &f2.invocation) {
            return i1.actual_string() == i2.actual_string();
        }
        if let (Some(c1), Some(c2)) = (&f1.creation, &f2.creation) {
            return c1.actual_string() == c2.actual_string();
        }
        false
    }

    fn contains_identical_or_composite_replacement(&self) -> bool {
        self.replacements.iter().any(|r| match r.replacement_type {
            ReplacementType::ArrayInitializerReplacedWithMethodInvocationArguments => {
                r.before == r.after
            }
            ReplacementType::Composite => true,
            _ => false,
        })
    }

    /// The replacements alone account for the difference.
    ///
    /// True for a single replacement when both fragments declare the same
    /// number of variables, or when every replacement involves a string
    /// literal.
    pub(crate) fn identical(&self, store: &FragmentStore) -> bool {
        if self.replacements.len() == 1
            && store.declarations(self.fragment1).len() == store.declarations(self.fragment2).len()
        {
            return true;
        }
        self.replacements.iter().all(Replacement::involves_string_literal)
    }

    // ------------------------------------------------------------------------
    // Inference
    // ------------------------------------------------------------------------

    /// Expression mapped to a statement declaring exactly one variable.
    pub fn temporary_variable_assignment_for_leaf(
        &mut self,
        ctx: &InferenceContext<'_>,
        refactorings: &mut RefactoringSet,
    ) {
        Inference::new(self, ctx, refactorings, &[], Direction::Extract).single_fragment_extract();
    }

    /// Explain this mapping by a variable declared in `statement` of the
    /// second version.
    pub fn temporary_variable_assignment(
        &mut self,
        ctx: &InferenceContext<'_>,
        statement: FragmentId,
        non_mapped_leaves_t2: &[FragmentId],
        refactorings: &mut RefactoringSet,
    ) {
        Inference::new(self, ctx, refactorings, non_mapped_leaves_t2, Direction::Extract)
            .run(statement);
    }

    /// Explain this mapping by a variable declared in `statement` of the
    /// first version that no longer exists.
    pub fn inlined_variable_assignment(
        &mut self,
        ctx: &InferenceContext<'_>,
        statement: FragmentId,
        non_mapped_leaves_t2: &[FragmentId],
        refactorings: &mut RefactoringSet,
    ) {
        Inference::new(self, ctx, refactorings, non_mapped_leaves_t2, Direction::Inline)
            .run(statement);
    }

    // ------------------------------------------------------------------------
    // Context queries
    // ------------------------------------------------------------------------

    /// Closest pair of catch clauses (or finally blocks) enclosing both
    /// fragments at the same depth.
    pub fn nested_under_catch_block(&self, store: &FragmentStore) -> Option<(FragmentId, FragmentId)> {
        let parents1 = store.ancestors(self.fragment1);
        let parents2 = store.ancestors(self.fragment2);
        parents1
            .into_iter()
            .zip(parents2)
            .find(|(p1, p2)| {
                let (t1, t2) = (p1.location.code_element_type, p2.location.code_element_type);
                (t1 == CodeElementType::CatchClause && t2 == CodeElementType::CatchClause)
                    || (t1 == CodeElementType::FinallyBlock && t2 == CodeElementType::FinallyBlock)
            })
            .map(|(p1, p2)| (p1.id, p2.id))
    }

    /// Normalized, case-insensitive edit distance of the two fragments.
    pub fn edit_distance(&self, store: &FragmentStore) -> f64 {
        let s1 = store.text(self.fragment1).to_lowercase();
        let s2 = store.text(self.fragment2).to_lowercase();
        if s1 == s2 {
            return 0.0;
        }
        let longest = s1.chars().count().max(s2.chars().count());
        refinfer_core::text::levenshtein(&s1, &s2) as f64 / longest as f64
    }

    /// Display adapter rendering both fragment texts.
    pub fn display<'a>(&'a self, store: &'a FragmentStore) -> MappingDisplay<'a> {
        MappingDisplay {
            mapping: self,
            store,
        }
    }
}

impl PartialEq for CodeMapping {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CodeMapping {}

impl Hash for CodeMapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// See [`CodeMapping::display`].
pub struct MappingDisplay<'a> {
    mapping: &'a CodeMapping,
    store: &'a FragmentStore,
}

impl fmt::Display for MappingDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.store.text(self.mapping.fragment1),
            self.store.text(self.mapping.fragment2)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::Call;
    use crate::fragment::{CodeFragment, FragmentKind};
    use crate::location::LocationInfo;
    use refinfer_core::types::Span;

    fn statement(store: &mut FragmentStore, text: &str) -> FragmentId {
        store.add_fragment(CodeFragment::new(
            FragmentKind::Statement,
            LocationInfo::new("A.java", Span::new(0, 10), CodeElementType::ExpressionStatement),
            text,
        ))
    }

    fn mapping(f1: FragmentId, f2: FragmentId) -> CodeMapping {
        CodeMapping::leaf(f1, f2, OperationId(0), OperationId(0))
    }

    mod exactness_tests {
        use super::*;

        #[test]
        fn equal_text_is_exact() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "foo(x);\n");
            let b = statement(&mut store, "foo(x);\n");
            assert!(mapping(a, b).is_exact(&store));
        }

        #[test]
        fn keyword_is_never_exact() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "return;\n");
            let b = statement(&mut store, "return;\n");
            let mut m = mapping(a, b);
            m.add_replacement(Replacement::new("", "", ReplacementType::Composite));
            assert!(!m.is_exact(&store));
        }

        #[test]
        fn type_replacement_restores_equality() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "List<String> xs=new ArrayList<>();\n");
            let b = statement(&mut store, "Collection<String> xs=new ArrayList<>();\n");
            let mut m = mapping(a, b);
            assert!(!m.is_exact(&store));
            m.add_replacement(Replacement::new("List<String>", "Collection<String>", ReplacementType::Type));
            assert!(m.is_exact(&store));
        }

        #[test]
        fn type_replacement_tolerates_missing_terminator() {
            let mut store = FragmentStore::new();
            let a = store.add_fragment(CodeFragment::new(
                FragmentKind::Expression,
                LocationInfo::new("A.java", Span::new(0, 10), CodeElementType::VariableDeclarationFragment),
                "int x=0",
            ));
            let b = statement(&mut store, "long x=0;\n");
            let mut m = mapping(a, b);
            m.add_replacement(Replacement::new("int", "long", ReplacementType::Type));
            assert!(m.is_exact(&store));
        }

        #[test]
        fn identical_covering_invocations_are_exact() {
            let mut store = FragmentStore::new();
            let call = Call::method("run", Some("task"), &[], "task.run()");
            let a = store.add_fragment(
                CodeFragment::new(
                    FragmentKind::Statement,
                    LocationInfo::new("A.java", Span::new(0, 10), CodeElementType::ExpressionStatement),
                    "task.run();\n",
                )
                .with_argumentized("task.run();\n"),
            );
            let b = store.add_fragment(
                CodeFragment::new(
                    FragmentKind::Statement,
                    LocationInfo::new("A.java", Span::new(0, 10), CodeElementType::ReturnStatement),
                    "return task.run();\n",
                )
                .with_invocation(call.clone()),
            );
            assert!(!mapping(a, b).is_exact(&store));
            let mut store2 = FragmentStore::new();
            let a2 = store2.add_fragment(
                CodeFragment::new(
                    FragmentKind::Statement,
                    LocationInfo::new("A.java", Span::new(0, 10), CodeElementType::ExpressionStatement),
                    "task.run();\n",
                )
                .with_invocation(call.clone()),
            );
            let b2 = store2.add_fragment(
                CodeFragment::new(
                    FragmentKind::Statement,
                    LocationInfo::new("A.java", Span::new(0, 10), CodeElementType::ReturnStatement),
                    "return task.run();\n",
                )
                .with_invocation(call),
            );
            assert!(mapping(a2, b2).is_exact(&store2));
        }

        #[test]
        fn identical_array_initializer_or_composite_is_exact() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "f(new int[]{1});\n");
            let b = statement(&mut store, "f(1);\n");
            let mut m = mapping(a, b);
            m.add_replacement(Replacement::new(
                "{1}",
                "1",
                ReplacementType::ArrayInitializerReplacedWithMethodInvocationArguments,
            ));
            assert!(!m.is_exact(&store));
            m.add_replacement(Replacement::new(
                "1",
                "1",
                ReplacementType::ArrayInitializerReplacedWithMethodInvocationArguments,
            ));
            assert!(m.is_exact(&store));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn only_replacement_requires_non_empty() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "a();\n");
            let b = statement(&mut store, "b();\n");
            let mut m = mapping(a, b);
            assert!(!m.contains_only_replacement(ReplacementType::MethodInvocationName));
            m.add_replacement(Replacement::new("a", "b", ReplacementType::MethodInvocationName));
            assert!(m.contains_only_replacement(ReplacementType::MethodInvocationName));
            m.add_replacement(Replacement::new("x", "y", ReplacementType::VariableName));
            assert!(!m.contains_only_replacement(ReplacementType::MethodInvocationName));
            assert_eq!(
                m.replacement_types(),
                vec![ReplacementType::MethodInvocationName, ReplacementType::VariableName]
            );
        }

        #[test]
        fn equality_ignores_replacements() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "a();\n");
            let b = statement(&mut store, "b();\n");
            let plain = mapping(a, b);
            let mut rich = mapping(a, b);
            rich.add_replacement(Replacement::new("a", "b", ReplacementType::MethodInvocationName));
            assert_eq!(plain, rich);
            let other_op = CodeMapping::leaf(a, b, OperationId(0), OperationId(1));
            assert_ne!(plain, other_op);
        }

        #[test]
        fn edit_distance_is_normalized() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "abcd");
            let b = statement(&mut store, "ABCE");
            let c = statement(&mut store, "abcd");
            assert!((mapping(a, b).edit_distance(&store) - 0.25).abs() < f64::EPSILON);
            assert_eq!(mapping(a, c).edit_distance(&store), 0.0);
        }

        #[test]
        fn display_concatenates_fragments() {
            let mut store = FragmentStore::new();
            let a = statement(&mut store, "a();\n");
            let b = statement(&mut store, "b();\n");
            assert_eq!(mapping(a, b).display(&store).to_string(), "a();\nb();\n");
        }

        #[test]
        fn nested_under_matching_catch_clauses() {
            let mut store = FragmentStore::new();
            let composite = |store: &mut FragmentStore, t: CodeElementType, parent: Option<FragmentId>| {
                let mut f = CodeFragment::new(
                    FragmentKind::CompositeStatement,
                    LocationInfo::new("A.java", Span::new(0, 100), t),
                    "",
                );
                f.parent = parent;
                store.add_fragment(f)
            };
            let catch1 = composite(&mut store, CodeElementType::CatchClause, None);
            let block1 = composite(&mut store, CodeElementType::Block, Some(catch1));
            let catch2 = composite(&mut store, CodeElementType::CatchClause, None);
            let block2 = composite(&mut store, CodeElementType::Block, Some(catch2));
            let s1 = store.add_fragment(
                CodeFragment::new(
                    FragmentKind::Statement,
                    LocationInfo::new("A.java", Span::new(10, 20), CodeElementType::ExpressionStatement),
                    "log(e);\n",
                )
                .with_parent(block1),
            );
            let s2 = store.add_fragment(
                CodeFragment::new(
                    FragmentKind::Statement,
                    LocationInfo::new("A.java", Span::new(10, 20), CodeElementType::ExpressionStatement),
                    "log(ex);\n",
                )
                .with_parent(block2),
            );
            assert_eq!(mapping(s1, s2).nested_under_catch_block(&store), Some((catch1, catch2)));
            assert_eq!(mapping(s1, catch2).nested_under_catch_block(&store), None);
        }
    }
}

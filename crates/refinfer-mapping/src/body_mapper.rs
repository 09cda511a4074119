//! Driver that runs variable inference over the mappings of one operation pair.
//!
//! A [`BodyMapper`] owns the mappings produced by the matcher together with
//! the leaves left unmapped on each side. [`BodyMapper::infer`] walks the
//! mappings in input order and, for each inexact one, runs:
//!
//! 1. the single-fragment extract check,
//! 2. the general extract inference against every unmapped leaf of the
//!    second version,
//! 3. the inline inference against every unmapped leaf of the first
//!    version.
//!
//! All runs share one [`RefactoringSet`].

use std::collections::HashSet;

use refinfer_core::config::InferenceConfig;
use tracing::{debug, info, trace};

use crate::class_diff::ClassDiffContext;
use crate::fragment::{FragmentId, FragmentStore};
use crate::mapping::{CodeMapping, InferenceContext, MappingKey};
use crate::refactoring::RefactoringSet;

/// Switches for one inference pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Marks every produced refactoring as found inside an extracted or
    /// inlined method.
    pub inside_extracted_or_inlined_method: bool,
    /// Skip mappings whose fragments are already exact.
    pub skip_exact_mappings: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        InferenceOptions {
            inside_extracted_or_inlined_method: false,
            skip_exact_mappings: true,
        }
    }
}

impl From<&InferenceConfig> for InferenceOptions {
    fn from(config: &InferenceConfig) -> Self {
        InferenceOptions {
            inside_extracted_or_inlined_method: config.inside_extracted_or_inlined_method,
            skip_exact_mappings: config.skip_exact_mappings,
        }
    }
}

/// Mappings and unmapped leaves of one operation pair.
pub struct BodyMapper<'a> {
    store: &'a FragmentStore,
    class_diff: Option<&'a dyn ClassDiffContext>,
    mappings: Vec<CodeMapping>,
    keys: HashSet<MappingKey>,
    non_mapped_leaves_t1: Vec<FragmentId>,
    non_mapped_leaves_t2: Vec<FragmentId>,
    refactorings: RefactoringSet,
    options: InferenceOptions,
}

impl<'a> BodyMapper<'a> {
    pub fn new(store: &'a FragmentStore) -> Self {
        BodyMapper {
            store,
            class_diff: None,
            mappings: Vec::new(),
            keys: HashSet::new(),
            non_mapped_leaves_t1: Vec::new(),
            non_mapped_leaves_t2: Vec::new(),
            refactorings: RefactoringSet::new(),
            options: InferenceOptions::default(),
        }
    }

    pub fn with_class_diff(mut self, class_diff: &'a dyn ClassDiffContext) -> Self {
        self.class_diff = Some(class_diff);
        self
    }

    pub fn with_options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a mapping. A mapping equal to one already present is dropped.
    pub fn add_mapping(&mut self, mapping: CodeMapping) -> bool {
        if !self.keys.insert(mapping.key()) {
            trace!(fragment1 = %mapping.fragment1, fragment2 = %mapping.fragment2, "duplicate mapping dropped");
            return false;
        }
        self.mappings.push(mapping);
        true
    }

    pub fn add_mappings(&mut self, mappings: impl IntoIterator<Item = CodeMapping>) {
        for mapping in mappings {
            self.add_mapping(mapping);
        }
    }

    pub fn set_non_mapped_leaves(&mut self, t1: Vec<FragmentId>, t2: Vec<FragmentId>) {
        self.non_mapped_leaves_t1 = t1;
        self.non_mapped_leaves_t2 = t2;
    }

    pub fn mappings(&self) -> &[CodeMapping] {
        &self.mappings
    }

    pub fn non_mapped_leaves_t1(&self) -> &[FragmentId] {
        &self.non_mapped_leaves_t1
    }

    pub fn non_mapped_leaves_t2(&self) -> &[FragmentId] {
        &self.non_mapped_leaves_t2
    }

    pub fn refactorings(&self) -> &RefactoringSet {
        &self.refactorings
    }

    /// Run variable inference over every mapping.
    pub fn infer(&mut self) {
        let mut ctx = InferenceContext::new(self.store)
            .inside_extracted_or_inlined_method(self.options.inside_extracted_or_inlined_method);
        if let Some(class_diff) = self.class_diff {
            ctx = ctx.with_class_diff(class_diff);
        }
        let mut skipped = 0usize;
        for mapping in &mut self.mappings {
            if self.options.skip_exact_mappings && mapping.is_exact(self.store) {
                skipped += 1;
                continue;
            }
            debug!(
                fragment1 = %mapping.fragment1,
                fragment2 = %mapping.fragment2,
                replacements = mapping.replacements().len(),
                "inferring"
            );
            mapping.temporary_variable_assignment_for_leaf(&ctx, &mut self.refactorings);
            for &leaf in &self.non_mapped_leaves_t2 {
                mapping.temporary_variable_assignment(
                    &ctx,
                    leaf,
                    &self.non_mapped_leaves_t2,
                    &mut self.refactorings,
                );
            }
            for &leaf in &self.non_mapped_leaves_t1 {
                mapping.inlined_variable_assignment(
                    &ctx,
                    leaf,
                    &self.non_mapped_leaves_t2,
                    &mut self.refactorings,
                );
            }
        }
        info!(
            mappings = self.mappings.len(),
            skipped,
            refactorings = self.refactorings.len(),
            "inference complete"
        );
    }

    /// Consume the mapper, returning the mappings and the inferred refactorings.
    pub fn into_parts(self) -> (Vec<CodeMapping>, RefactoringSet) {
        (self.mappings, self.refactorings)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{CodeFragment, FragmentKind};
    use crate::location::{CodeElementType, LocationInfo};
    use crate::operation::{Operation, OperationId};
    use crate::refactoring::RefactoringType;
    use crate::replacement::{Replacement, ReplacementType};
    use crate::variable::{VariableDeclaration, VariableId};
    use refinfer_core::types::Span;

    struct Body {
        store: FragmentStore,
        op1: OperationId,
        op2: OperationId,
        next: u64,
    }

    impl Body {
        fn new() -> Self {
            let mut store = FragmentStore::new();
            let op1 = store.add_operation(Operation::new(OperationId(0), "run", "Job"));
            let op2 = store.add_operation(Operation::new(OperationId(0), "run", "Job"));
            Body {
                store,
                op1,
                op2,
                next: 0,
            }
        }

        fn fragment(&mut self, kind: FragmentKind, text: &str) -> CodeFragment {
            let start = self.next;
            self.next += 100;
            CodeFragment::new(
                kind,
                LocationInfo::new(
                    "Job.java",
                    Span::new(start, start + text.len() as u64),
                    CodeElementType::ExpressionStatement,
                ),
                text,
            )
        }

        fn add(&mut self, kind: FragmentKind, text: &str, subs: Vec<FragmentId>) -> FragmentId {
            let fragment = self.fragment(kind, text).with_sub_expressions(subs);
            self.store.add_fragment(fragment)
        }

        /// `int name=init;\n` declared in `op`.
        fn declare(&mut self, name: &str, init: &str, op: OperationId) -> (FragmentId, VariableId) {
            let initializer = self.add(FragmentKind::Expression, init, vec![]);
            let var = self.store.add_variable(
                VariableDeclaration::new(VariableId(0), name, Some("int"), Span::new(0, 10_000))
                    .with_initializer(initializer),
            );
            self.store.declare_in_operation(op, var);
            let statement = self
                .fragment(FragmentKind::Statement, &format!("int {name}={init};\n"))
                .with_sub_expressions(vec![initializer])
                .with_variables(vec![var]);
            (self.store.add_fragment(statement), var)
        }
    }

    #[test]
    fn defaults_skip_exact_mappings() {
        let options = InferenceOptions::default();
        assert!(options.skip_exact_mappings);
        assert!(!options.inside_extracted_or_inlined_method);
        let config = InferenceConfig {
            inside_extracted_or_inlined_method: true,
            skip_exact_mappings: false,
        };
        let options = InferenceOptions::from(&config);
        assert!(options.inside_extracted_or_inlined_method);
        assert!(!options.skip_exact_mappings);
    }

    #[test]
    fn duplicate_mappings_are_dropped() {
        let mut body = Body::new();
        let a = body.add(FragmentKind::Statement, "f();\n", vec![]);
        let b = body.add(FragmentKind::Statement, "f();\n", vec![]);
        let mut mapper = BodyMapper::new(&body.store);
        assert!(mapper.add_mapping(CodeMapping::leaf(a, b, body.op1, body.op2)));
        assert!(!mapper.add_mapping(CodeMapping::leaf(a, b, body.op1, body.op2)));
        assert_eq!(mapper.mappings().len(), 1);
    }

    #[test]
    fn infers_extract_and_inline_in_one_pass() {
        let mut body = Body::new();
        let occurrence = body.add(FragmentKind::LeafExpression, "a.b()", vec![]);
        let f1 = body.add(FragmentKind::Statement, "use(a.b());\n", vec![occurrence]);
        let f2 = body.add(FragmentKind::Statement, "use(x);\n", vec![]);
        let (x_stmt, x) = body.declare("x", "a.b()", body.op2);
        let g1 = body.add(FragmentKind::Statement, "log(y);\n", vec![]);
        let inlined = body.add(FragmentKind::LeafExpression, "c.d()", vec![]);
        let g2 = body.add(FragmentKind::Statement, "log(c.d());\n", vec![inlined]);
        let (y_stmt, y) = body.declare("y", "c.d()", body.op1);

        let mut m1 = CodeMapping::leaf(f1, f2, body.op1, body.op2);
        m1.add_replacement(Replacement::new("a.b()", "x", ReplacementType::VariableName));
        let mut m2 = CodeMapping::leaf(g1, g2, body.op1, body.op2);
        m2.add_replacement(Replacement::new("y", "c.d()", ReplacementType::VariableName));

        let mut mapper = BodyMapper::new(&body.store);
        mapper.add_mappings([m1, m2]);
        mapper.set_non_mapped_leaves(vec![y_stmt], vec![x_stmt]);
        mapper.infer();

        let (mappings, refactorings) = mapper.into_parts();
        let found: Vec<_> = refactorings
            .iter()
            .map(|r| (r.refactoring_type, r.variable))
            .collect();
        assert_eq!(
            found,
            vec![
                (RefactoringType::ExtractVariable, x),
                (RefactoringType::InlineVariable, y),
            ]
        );
        assert!(mappings[0].is_identical_with_extracted_variable());
        assert!(mappings[1].is_identical_with_inlined_variable());
    }

    #[test]
    fn exact_mappings_are_skipped_unless_configured() {
        let mut body = Body::new();
        let f1 = body.add(FragmentKind::Statement, "use(x);\n", vec![]);
        let f2 = body.add(FragmentKind::Statement, "use(x);\n", vec![]);
        let (x_stmt, _) = body.declare("x", "x", body.op2);
        let mut mapping = CodeMapping::leaf(f1, f2, body.op1, body.op2);
        mapping.add_replacement(Replacement::new("x", "x", ReplacementType::VariableName));

        let mut mapper = BodyMapper::new(&body.store);
        mapper.add_mapping(mapping.clone());
        mapper.set_non_mapped_leaves(vec![], vec![x_stmt]);
        mapper.infer();
        assert!(mapper.refactorings().is_empty());

        let mut mapper = BodyMapper::new(&body.store).with_options(InferenceOptions {
            inside_extracted_or_inlined_method: true,
            skip_exact_mappings: false,
        });
        mapper.add_mapping(mapping);
        mapper.set_non_mapped_leaves(vec![], vec![x_stmt]);
        mapper.infer();
        assert_eq!(mapper.refactorings().len(), 1);
        assert!(mapper
            .refactorings()
            .iter()
            .all(|r| r.inside_extracted_or_inlined_method));
    }
}

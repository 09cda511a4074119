//! Extract-variable and inline-variable inference for one mapping.
//!
//! Both directions run the same heuristics with the roles of the two
//! versions swapped ([`Direction`]). For each variable declared in the
//! candidate statement, every replacement of the mapping is tested in
//! order:
//!
//! 1. member-access split (`v.m()` against `init.m()`)
//! 2. direct substitution (`v` against `init`), accepted by the first
//!    matcher of [`DIRECT_SUBSTITUTION`] that holds
//!
//! followed by the rename-aware and sibling-declaration fallbacks for that
//! variable. When no variable explains the mapping, the assignment
//! fallback splits the candidate statement at its first `=`.
//!
//! The first accepted rule registers a refactoring and stops the search.

use refinfer_core::text::{
    contains_token, is_upper_case, keep_reserved_tokens, longest_common_prefix,
    longest_common_suffix, split_whitespace_tokens, strip_enclosing_parentheses,
};
use tracing::{debug, trace};

use crate::fragment::{CodeFragment, FragmentId, FragmentKind, FragmentStore};
use crate::mapping::{CodeMapping, InferenceContext, LeafMapping, MappingKind};
use crate::refactoring::{RefactoringSet, RefactoringType, VariableRefactoring};
use crate::replacement::{Replacement, ReplacementType};
use crate::variable::{render_declarations, VariableDeclaration};

// ============================================================================
// Direction
// ============================================================================

/// Which version gained (extract) or lost (inline) the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Extract,
    Inline,
}

impl Direction {
    fn refactoring_type(self) -> RefactoringType {
        match self {
            Direction::Extract => RefactoringType::ExtractVariable,
            Direction::Inline => RefactoringType::InlineVariable,
        }
    }

    /// `(variable side, expression side)` of a replacement.
    fn sides<'r>(self, before: &'r str, after: &'r str) -> (&'r str, &'r str) {
        match self {
            Direction::Extract => (after, before),
            Direction::Inline => (before, after),
        }
    }

    /// Fragment in which the replaced expression is searched.
    fn expression_fragment(self, mapping: &CodeMapping) -> FragmentId {
        match self {
            Direction::Extract => mapping.fragment1,
            Direction::Inline => mapping.fragment2,
        }
    }

    /// Fragment that mentions the variable.
    fn variable_fragment(self, mapping: &CodeMapping) -> FragmentId {
        match self {
            Direction::Extract => mapping.fragment2,
            Direction::Inline => mapping.fragment1,
        }
    }

    /// Sub-expression mapping between an occurrence and the initializer.
    fn leaf(self, mapping: &CodeMapping, occurrence: FragmentId, initializer: FragmentId) -> LeafMapping {
        let (f1, f2) = match self {
            Direction::Extract => (occurrence, initializer),
            Direction::Inline => (initializer, occurrence),
        };
        LeafMapping::new(f1, f2, mapping.operation1, mapping.operation2)
    }
}

// ============================================================================
// Direct Substitution Rules
// ============================================================================

/// A replacement whose variable side is exactly a declared variable.
struct Candidate<'s> {
    declaration: &'s VariableDeclaration,
    initializer: &'s CodeFragment,
    replacement: &'s Replacement,
    /// Expression side of the replacement, parentheses normalized.
    expression: &'s str,
}

type Matcher = fn(&mut Inference<'_>, &Candidate<'_>) -> bool;

/// Matchers accepting a direct substitution, tried in order.
const DIRECT_SUBSTITUTION: &[(&str, Matcher)] = &[
    ("initializer_text", initializer_text_match),
    ("overlapping_extract_variable", overlapping_match),
    ("cast", cast_match),
    ("ternary", ternary_match),
    ("infix_operand", infix_operand_match),
    ("wrapped_as_argument", wrapped_as_argument),
    ("reserved_token", reserved_token_match),
];

fn initializer_text_match(_: &mut Inference<'_>, c: &Candidate<'_>) -> bool {
    c.initializer.text == c.expression
}

fn overlapping_match(inf: &mut Inference<'_>, c: &Candidate<'_>) -> bool {
    inf.overlapping_extract_variable(c.initializer, c.expression)
}

/// The initializer is the expression cast to the declared type.
fn cast_match(inf: &mut Inference<'_>, c: &Candidate<'_>) -> bool {
    let Some(var_type) = c.declaration.var_type.as_deref() else {
        return false;
    };
    c.initializer.text == format!("({var_type}){}", c.expression)
        && !inf
            .mapping
            .contains_variable_name_replacement(&c.declaration.name)
}

fn ternary_match(inf: &mut Inference<'_>, c: &Candidate<'_>) -> bool {
    let store = inf.ctx.store;
    store
        .ternaries(c.initializer.id)
        .iter()
        .any(|t| t.has_branch(store, c.expression))
}

fn infix_operand_match(inf: &mut Inference<'_>, c: &Candidate<'_>) -> bool {
    inf.ctx
        .store
        .infix_expressions(c.initializer.id)
        .iter()
        .any(|infix| infix.text.starts_with(c.expression) || infix.text.ends_with(c.expression))
}

/// The expression is an argument or the receiver of the initializer's call.
fn wrapped_as_argument(inf: &mut Inference<'_>, c: &Candidate<'_>) -> bool {
    let text = c.expression;
    let mentions = inf
        .mapping
        .replacements
        .iter()
        .filter(|r| r.before == text || r.after == text)
        .count();
    if mentions > 1 {
        return false;
    }
    if let Some(invocation) = &c.initializer.invocation {
        if invocation.arguments.iter().any(|a| a == text) {
            return true;
        }
        if let Some(receiver) = invocation.expression.as_deref() {
            if receiver == text || contains_token(receiver, text) {
                let recursive = invocation
                    .sub_expression_is_call_to_same_method()
                    .is_some_and(|sub| contains_token(sub, text));
                if !recursive {
                    return true;
                }
            }
        }
    }
    c.initializer
        .creation
        .as_ref()
        .is_some_and(|creation| creation.arguments.iter().any(|a| a == text))
}

/// Compare punctuation skeletons.
///
/// When the replacement carries a call with the same name and receiver as
/// the initializer's call, an argument-level replacement between the two
/// calls is recorded on the mapping and the match succeeds.
fn reserved_token_match(inf: &mut Inference<'_>, c: &Candidate<'_>) -> bool {
    let initializer_call = c.initializer.invocation.as_ref();
    let replacement_call = c.replacement.variable_invocation();
    let mut invocation_match = true;
    match (initializer_call, replacement_call) {
        (Some(init), Some(repl)) => {
            if init.name != repl.name {
                invocation_match = false;
            }
            if init.identical_name(repl) && init.identical_expression(repl) {
                inf.mapping.add_replacement(Replacement::method_invocation(
                    repl.clone(),
                    init.clone(),
                    ReplacementType::MethodInvocationArgument,
                ));
                return true;
            }
        }
        (None, None) => {}
        _ => invocation_match = false,
    }
    let initializer_tokens = keep_reserved_tokens(&c.initializer.text);
    let expression_tokens = keep_reserved_tokens(c.expression);
    invocation_match
        && !initializer_tokens.is_empty()
        && !matches!(initializer_tokens.as_str(), "[]" | ".()" | " ()")
        && initializer_tokens == expression_tokens
}

// ============================================================================
// Inference
// ============================================================================

/// One inference run over one mapping.
pub(crate) struct Inference<'a> {
    mapping: &'a mut CodeMapping,
    ctx: &'a InferenceContext<'a>,
    refactorings: &'a mut RefactoringSet,
    non_mapped_leaves: &'a [FragmentId],
    direction: Direction,
}

impl<'a> Inference<'a> {
    pub(crate) fn new(
        mapping: &'a mut CodeMapping,
        ctx: &'a InferenceContext<'a>,
        refactorings: &'a mut RefactoringSet,
        non_mapped_leaves: &'a [FragmentId],
        direction: Direction,
    ) -> Self {
        Inference {
            mapping,
            ctx,
            refactorings,
            non_mapped_leaves,
            direction,
        }
    }

    fn candidate(&self, declaration: &VariableDeclaration, direction: Direction) -> VariableRefactoring {
        VariableRefactoring::new(
            direction.refactoring_type(),
            declaration.id,
            self.mapping.operation1,
            self.mapping.operation2,
            self.ctx.inside_extracted_or_inlined_method,
        )
    }

    /// Register a candidate and remember it on the mapping.
    fn register(&mut self, candidate: VariableRefactoring) {
        let key = self.refactorings.process(candidate, self.mapping.key());
        self.mapping.add_refactoring(key);
    }

    fn mark_identical(&mut self) {
        match self.direction {
            Direction::Extract => self.mapping.identical_with_extracted_variable = true,
            Direction::Inline => self.mapping.identical_with_inlined_variable = true,
        }
    }

    /// Build, register and (optionally) flag an accepted refactoring whose
    /// sub-expressions are the occurrences of `expression`.
    fn accept(
        &mut self,
        rule: &str,
        declaration: &VariableDeclaration,
        initializer: FragmentId,
        expression: &str,
        check_identical: bool,
    ) {
        let store = self.ctx.store;
        debug!(
            rule,
            variable = %declaration,
            direction = ?self.direction,
            "variable refactoring accepted"
        );
        let mut candidate = self.candidate(declaration, self.direction);
        for occurrence in store.find_expression(self.direction.expression_fragment(self.mapping), expression) {
            candidate.add_sub_expression_mapping(self.direction.leaf(self.mapping, occurrence, initializer));
        }
        self.register(candidate);
        if check_identical && self.mapping.identical(store) {
            self.mark_identical();
        }
    }

    // ------------------------------------------------------------------------
    // Single-fragment extraction
    // ------------------------------------------------------------------------

    /// An expression became the initializer of the only variable of a
    /// statement.
    pub(crate) fn single_fragment_extract(mut self) {
        let store = self.ctx.store;
        if self.mapping.kind != MappingKind::Leaf {
            return;
        }
        let (Some(f1), Some(f2)) = (
            store.fragment(self.mapping.fragment1),
            store.fragment(self.mapping.fragment2),
        ) else {
            return;
        };
        if f1.kind != FragmentKind::Expression || !f2.is_statement() {
            return;
        }
        if self.mapping.replacements.iter().any(Replacement::is_call_replacement) {
            trace!("single-fragment extraction skipped: call replacement present");
            return;
        }
        let declarations = store.declarations(f2.id);
        if !f1.variable_declarations.is_empty() || declarations.len() != 1 {
            return;
        }
        let declaration = declarations[0];
        debug!(rule = "single_fragment", variable = %declaration, "variable refactoring accepted");
        let mut candidate = self.candidate(declaration, Direction::Extract);
        if let Some(initializer) = declaration.initializer {
            candidate.add_sub_expression_mapping(LeafMapping::new(
                f1.id,
                initializer,
                self.mapping.operation1,
                self.mapping.operation2,
            ));
        }
        self.register(candidate);
        self.mapping.identical_with_extracted_variable = true;
    }

    // ------------------------------------------------------------------------
    // General inference
    // ------------------------------------------------------------------------

    /// Try every rule against the variables declared by `statement`.
    pub(crate) fn run(mut self, statement: FragmentId) {
        let store = self.ctx.store;
        let replacements: Vec<Replacement> = self.mapping.replacements.iter().cloned().collect();
        for declaration in store.declarations(statement) {
            let initializer = declaration.initializer.and_then(|id| store.fragment(id));
            for replacement in &replacements {
                if self.try_replacement(declaration, initializer, replacement) {
                    return;
                }
            }
            if let Some(initializer) = initializer {
                if self.rename_fallback(declaration, initializer) {
                    return;
                }
                if self.sibling_declaration_fallback(declaration, initializer) {
                    return;
                }
            }
        }
        if let Some(statement) = store.fragment(statement) {
            self.assignment_fallback(statement, &replacements);
        }
    }

    fn try_replacement(
        &mut self,
        declaration: &VariableDeclaration,
        initializer: Option<&'a CodeFragment>,
        replacement: &Replacement,
    ) -> bool {
        let name = declaration.name.as_str();
        let (mut before, mut after) = (replacement.before.as_str(), replacement.after.as_str());
        if replacement.replacement_type.is_parenthesized() {
            before = strip_enclosing_parentheses(before);
            after = strip_enclosing_parentheses(after);
        }
        if self.direction == Direction::Extract {
            if let Some((call_before, call_after)) = replacement.invoked_operations() {
                if let Some(idx) = call_after.arguments.iter().position(|a| a == name) {
                    if call_before.arguments.len() == call_after.arguments.len() {
                        after = name;
                        before = call_before.arguments[idx].as_str();
                    }
                }
            }
        }
        let (variable_side, expression_side) = self.direction.sides(before, after);

        // v.m() on the variable side, init.m() on the expression side
        if variable_side.starts_with(&format!("{name}.")) {
            let suffix = &variable_side[name.len()..];
            if expression_side.ends_with(suffix) {
                if let (Some(idx), Some(initializer)) = (expression_side.find(suffix), initializer) {
                    let prefix = &expression_side[..idx];
                    if initializer.text == prefix || self.overlapping_extract_variable(initializer, prefix) {
                        self.accept("member_access_split", declaration, initializer.id, prefix, true);
                        return true;
                    }
                }
            }
        }

        if variable_side == name {
            if let Some(initializer) = initializer {
                let candidate = Candidate {
                    declaration,
                    initializer,
                    replacement,
                    expression: expression_side,
                };
                for (rule, matcher) in DIRECT_SUBSTITUTION {
                    if matcher(self, &candidate) {
                        self.accept(rule, declaration, initializer.id, expression_side, true);
                        return true;
                    }
                }
                trace!(variable = name, expression = expression_side, "direct substitution rejected");
            }
        }
        false
    }

    /// The initializer calls an operation that was renamed.
    fn rename_fallback(&mut self, declaration: &VariableDeclaration, initializer: &CodeFragment) -> bool {
        let store = self.ctx.store;
        let Some(class_diff) = self.ctx.class_diff else {
            return false;
        };
        let Some(invocation) = &initializer.invocation else {
            return false;
        };
        for rename in class_diff.rename_operation_refactorings() {
            let (Some(original), Some(renamed)) =
                (store.operation(rename.original), store.operation(rename.renamed))
            else {
                continue;
            };
            let (from, to) = match self.direction {
                Direction::Extract => (&renamed.name, &original.name),
                Direction::Inline => (&original.name, &renamed.name),
            };
            if &invocation.name != from {
                continue;
            }
            let rewritten = initializer.text.replace(from.as_str(), to);
            let expression_text = store.text(self.direction.expression_fragment(self.mapping));
            let variable_text = store.text(self.direction.variable_fragment(self.mapping));
            if expression_text.contains(&rewritten) && variable_text.contains(&declaration.name) {
                self.accept("renamed_operation", declaration, initializer.id, &rewritten, false);
                return true;
            }
        }
        false
    }

    /// Both fragments declare the same variables and exactly one of their
    /// covering calls targets an added or removed operation.
    fn sibling_declaration_fallback(
        &mut self,
        declaration: &VariableDeclaration,
        initializer: &CodeFragment,
    ) -> bool {
        let store = self.ctx.store;
        let Some(class_diff) = self.ctx.class_diff else {
            return false;
        };
        let declarations1 = store.declarations(self.mapping.fragment1);
        let declarations2 = store.declarations(self.mapping.fragment2);
        if declarations1.is_empty()
            || render_declarations(declarations1.iter().copied())
                != render_declarations(declarations2.iter().copied())
        {
            return false;
        }
        let sibling = match self.direction {
            Direction::Extract => declarations1[0],
            Direction::Inline => declarations2[0],
        };
        let contains_initializer = sibling
            .initializer
            .and_then(|id| store.fragment(id))
            .is_some_and(|f| f.text.contains(&initializer.text));
        if !contains_initializer {
            return false;
        }
        let (Some(f1), Some(f2)) = (
            store.fragment(self.mapping.fragment1),
            store.fragment(self.mapping.fragment2),
        ) else {
            return false;
        };
        let call_to_deleted = f1.invocation.as_ref().is_some_and(|call| {
            class_diff
                .matches_operation(store, call, class_diff.removed_operations(), self.mapping.operation1)
                .is_some()
        });
        let call_to_added = f2.invocation.as_ref().is_some_and(|call| {
            class_diff
                .matches_operation(store, call, class_diff.added_operations(), self.mapping.operation2)
                .is_some()
        });
        let equal_invocations = match (&f1.invocation, &f2.invocation) {
            (Some(a), Some(b)) => {
                a == b
                    || self
                        .mapping
                        .contains_only_replacement(ReplacementType::MethodInvocationName)
            }
            _ => false,
        };
        if call_to_added != call_to_deleted && !equal_invocations {
            self.accept("sibling_declaration", declaration, initializer.id, &initializer.text, false);
            return true;
        }
        false
    }

    /// `x = expr` in the candidate statement explains a replacement.
    fn assignment_fallback(&mut self, statement: &CodeFragment, replacements: &[Replacement]) {
        let store = self.ctx.store;
        let text = statement.argumentized.as_str();
        let Some(eq) = text.find('=') else {
            return;
        };
        let tokens = split_whitespace_tokens(&text[..eq]);
        let Some(&variable) = tokens.last() else {
            return;
        };
        let end = if text.ends_with(";\n") { text.len() - 2 } else { text.len() };
        let Some(assigned) = text.get(eq + 1..end) else {
            return;
        };
        for replacement in replacements {
            let (variable_side, expression_side) =
                self.direction.sides(&replacement.before, &replacement.after);
            let matches = variable.ends_with(variable_side)
                && match self.direction {
                    Direction::Extract => {
                        assigned == expression_side
                            || assigned.contains(&format!(": {expression_side}"))
                            || assigned.contains(&format!("? {expression_side}"))
                    }
                    Direction::Inline => assigned == expression_side,
                };
            if !matches {
                continue;
            }
            let (operation, location) = match self.direction {
                Direction::Extract => (self.mapping.operation2, self.mapping.fragment2),
                Direction::Inline => (self.mapping.operation1, self.mapping.fragment1),
            };
            let (Some(operation), Some(location)) = (store.operation(operation), store.fragment(location))
            else {
                continue;
            };
            let in_scope = operation.variable_declarations_in_scope(store, &location.location);
            let Some(declaration) = in_scope.into_iter().find(|d| d.name == variable) else {
                continue;
            };
            debug!(rule = "assignment", variable = %declaration, direction = ?self.direction, "variable refactoring accepted");
            let mut candidate = self.candidate(declaration, self.direction);
            let initializer_occurrences = store.find_expression(statement.id, assigned);
            for occurrence in
                store.find_expression(self.direction.expression_fragment(self.mapping), expression_side)
            {
                if let Some(&initializer) = initializer_occurrences.first() {
                    candidate.add_sub_expression_mapping(self.direction.leaf(self.mapping, occurrence, initializer));
                }
            }
            self.register(candidate);
            if self.mapping.identical(store) {
                self.mark_identical();
            }
            return;
        }
    }

    // ------------------------------------------------------------------------
    // Overlapping extractions
    // ------------------------------------------------------------------------

    /// Whether `input` is the initializer once overlapping extractions are
    /// accounted for.
    ///
    /// Known extract-variable initializers occurring in `input` are replaced
    /// by their variable names first. Failing that, a shared member-access
    /// suffix is accepted unless one side is a static-constant prefix.
    /// Otherwise the differing middle of the two strings may itself be a
    /// variable extracted in an unmapped leaf, which is then registered as
    /// its own extraction.
    fn overlapping_extract_variable(&mut self, initializer: &CodeFragment, input: &str) -> bool {
        let store = self.ctx.store;
        let init = initializer.text.as_str();
        let mut output = input.to_string();
        for extracted in self.refactorings.extract_variables() {
            let Some(declaration) = store.variable(extracted.variable) else {
                continue;
            };
            let Some(extracted_init) = declaration.initializer.map(|id| store.text(id)) else {
                continue;
            };
            if !extracted_init.is_empty() && input.contains(extracted_init) {
                output = output.replace(extracted_init, &declaration.name);
            }
        }
        if init == output {
            return true;
        }

        let suffix = longest_common_suffix(init, input);
        if suffix.starts_with('.') {
            if let (Some(i1), Some(i2)) = (init.find(suffix.as_str()), input.find(suffix.as_str())) {
                let (prefix1, prefix2) = (&init[..i1], &input[..i2]);
                // static constant prefixes do not count
                if prefix1 == prefix2 || (!is_upper_case(prefix1) && !is_upper_case(prefix2)) {
                    return true;
                }
            }
        }

        let prefix = longest_common_prefix(init, input);
        let carved = !suffix.is_empty()
            && !prefix.is_empty()
            && prefix != init
            && prefix != input
            && suffix != init
            && suffix != input
            && prefix.len() + suffix.len() < input.len()
            && prefix.len() + suffix.len() < init.len();
        if !carved {
            return false;
        }
        let (Some(s1), Some(s2)) = (middle_of(input, &prefix, &suffix), middle_of(init, &prefix, &suffix))
        else {
            return false;
        };
        for &leaf in self.non_mapped_leaves {
            let Some(variable) = store.variable_declaration(leaf, s2) else {
                continue;
            };
            if let Some(var_init) = variable.initializer {
                if store.text(var_init) == s1 {
                    self.register_overlapping(variable, var_init, s1);
                    return true;
                }
            }
            for ternary in store.ternaries(leaf) {
                if let Some(branch) = ternary.branch(store, s1) {
                    self.register_overlapping(variable, branch, s1);
                    return true;
                }
            }
        }
        false
    }

    /// Register an extraction found while carving overlapping expressions.
    ///
    /// These are always extractions out of the first fragment, whichever
    /// direction the outer inference runs in.
    fn register_overlapping(&mut self, variable: &VariableDeclaration, target: FragmentId, expression: &str) {
        let store = self.ctx.store;
        debug!(rule = "overlapping_carve", variable = %variable, "variable refactoring accepted");
        let mut candidate = self.candidate(variable, Direction::Extract);
        for occurrence in store.find_expression(self.mapping.fragment1, expression) {
            candidate.add_sub_expression_mapping(Direction::Extract.leaf(self.mapping, occurrence, target));
        }
        self.register(candidate);
    }
}

/// `s` without the common `prefix` and the last occurrence of `suffix`.
fn middle_of<'s>(s: &'s str, prefix: &str, suffix: &str) -> Option<&'s str> {
    let end = s.rfind(suffix)?;
    s.get(prefix.len()..end)
}

// ============================================================================
// Tests
// ============================================================================

//! Code fragments and the arena that owns them.
//!
//! Fragments are produced by the front end and are immutable afterwards.
//! Mappings, refactorings and other fragments refer to them by
//! [`FragmentId`]; the [`FragmentStore`] owns every fragment, variable
//! declaration and operation of one document.
//!
//! Fragment kinds form a closed set ([`FragmentKind`]). Ternary
//! expressions carry their decomposition inline; all other structure
//! (sub-expressions, declarations, covering calls) lives in the shared
//! [`CodeFragment`] record.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::call::Call;
use crate::location::LocationInfo;
use crate::operation::{Operation, OperationId};
use crate::ternary::TernaryOperatorExpression;
use crate::variable::{VariableDeclaration, VariableId};

// ============================================================================
// IDs
// ============================================================================

/// Unique identifier for a fragment within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FragmentId(pub u32);

impl FragmentId {
    pub fn new(id: u32) -> Self {
        FragmentId(id)
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frag_{}", self.0)
    }
}

// ============================================================================
// Fragments
// ============================================================================

/// Closed set of fragment kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentKind {
    /// A leaf statement (`int x=f();\n`).
    Statement,
    /// A statement with a body (`if`, `for`, `try`, `catch`, blocks).
    CompositeStatement,
    /// An expression that is not itself a leaf (conditions, initializers).
    Expression,
    /// A leaf expression (names, literals, calls found inside a fragment).
    LeafExpression,
    /// A conditional expression.
    Ternary(TernaryOperatorExpression),
}

/// A statement or expression from one program version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFragment {
    pub id: FragmentId,
    pub kind: FragmentKind,
    pub location: LocationInfo,
    /// Rendered text (statements end with `;\n`).
    pub text: String,
    /// Text with arguments normalized, used for comparison.
    pub argumentized: String,
    /// Enclosing composite statement.
    pub parent: Option<FragmentId>,
    /// Variables declared by this fragment.
    pub variable_declarations: Vec<VariableId>,
    /// Method invocation covering the entire fragment.
    pub invocation: Option<Call>,
    /// Object creation covering the entire fragment.
    pub creation: Option<Call>,
    pub ternary_expressions: Vec<FragmentId>,
    pub infix_expressions: Vec<FragmentId>,
    /// Direct sub-expressions, in source order.
    pub sub_expressions: Vec<FragmentId>,
}

impl CodeFragment {
    /// Create a fragment whose argumentized text equals its text.
    pub fn new(kind: FragmentKind, location: LocationInfo, text: impl Into<String>) -> Self {
        let text = text.into();
        CodeFragment {
            id: FragmentId(0),
            kind,
            location,
            argumentized: text.clone(),
            text,
            parent: None,
            variable_declarations: Vec::new(),
            invocation: None,
            creation: None,
            ternary_expressions: Vec::new(),
            infix_expressions: Vec::new(),
            sub_expressions: Vec::new(),
        }
    }

    pub fn with_argumentized(mut self, argumentized: impl Into<String>) -> Self {
        self.argumentized = argumentized.into();
        self
    }

    pub fn with_parent(mut self, parent: FragmentId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_variables(mut self, variables: Vec<VariableId>) -> Self {
        self.variable_declarations = variables;
        self
    }

    pub fn with_invocation(mut self, invocation: Call) -> Self {
        self.invocation = Some(invocation);
        self
    }

    pub fn with_creation(mut self, creation: Call) -> Self {
        self.creation = Some(creation);
        self
    }

    pub fn with_ternaries(mut self, ternaries: Vec<FragmentId>) -> Self {
        self.ternary_expressions = ternaries;
        self
    }

    pub fn with_infix(mut self, infix: Vec<FragmentId>) -> Self {
        self.infix_expressions = infix;
        self
    }

    pub fn with_sub_expressions(mut self, sub_expressions: Vec<FragmentId>) -> Self {
        self.sub_expressions = sub_expressions;
        self
    }

    /// `return;`, `break;`, `continue;` or the empty statement.
    pub fn is_keyword(&self) -> bool {
        self.text.starts_with("return;")
            || self.text.starts_with("break;")
            || self.text.starts_with("continue;")
            || self.text == ";"
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self.kind,
            FragmentKind::Expression | FragmentKind::LeafExpression | FragmentKind::Ternary(_)
        )
    }

    /// A leaf statement (not a composite one).
    pub fn is_statement(&self) -> bool {
        matches!(self.kind, FragmentKind::Statement)
    }

    pub fn ternary(&self) -> Option<&TernaryOperatorExpression> {
        match &self.kind {
            FragmentKind::Ternary(t) => Some(t),
            _ => None,
        }
    }

    /// Fragments directly below this one.
    fn children(&self) -> impl Iterator<Item = FragmentId> + '_ {
        let parts = self
            .ternary()
            .map(|t| [t.condition, t.then_expression, t.else_expression]);
        self.sub_expressions
            .iter()
            .copied()
            .chain(parts.into_iter().flatten())
    }
}

impl fmt::Display for CodeFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================================================
// Store
// ============================================================================

/// Arena owning every fragment, variable and operation of one document.
///
/// Storage uses `BTreeMap` so that iteration follows id order.
#[derive(Debug, Default)]
pub struct FragmentStore {
    fragments: BTreeMap<FragmentId, CodeFragment>,
    variables: BTreeMap<VariableId, VariableDeclaration>,
    operations: BTreeMap<OperationId, Operation>,
    next_fragment_id: u32,
    next_variable_id: u32,
    next_operation_id: u32,
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------------

    /// Add a fragment under a fresh id.
    pub fn add_fragment(&mut self, mut fragment: CodeFragment) -> FragmentId {
        let id = FragmentId(self.next_fragment_id);
        fragment.id = id;
        if let FragmentKind::Ternary(t) = &mut fragment.kind {
            t.id = id;
        }
        self.insert_fragment(fragment);
        id
    }

    /// Insert a fragment under its own id. Returns false if the id is taken.
    pub fn insert_fragment(&mut self, fragment: CodeFragment) -> bool {
        if self.fragments.contains_key(&fragment.id) {
            return false;
        }
        self.next_fragment_id = self.next_fragment_id.max(fragment.id.0.saturating_add(1));
        self.fragments.insert(fragment.id, fragment);
        true
    }

    /// Add a variable under a fresh id.
    pub fn add_variable(&mut self, mut variable: VariableDeclaration) -> VariableId {
        let id = VariableId(self.next_variable_id);
        variable.id = id;
        self.insert_variable(variable);
        id
    }

    /// Insert a variable under its own id. Returns false if the id is taken.
    pub fn insert_variable(&mut self, variable: VariableDeclaration) -> bool {
        if self.variables.contains_key(&variable.id) {
            return false;
        }
        self.next_variable_id = self.next_variable_id.max(variable.id.0.saturating_add(1));
        self.variables.insert(variable.id, variable);
        true
    }

    /// Add an operation under a fresh id.
    pub fn add_operation(&mut self, mut operation: Operation) -> OperationId {
        let id = OperationId(self.next_operation_id);
        operation.id = id;
        self.insert_operation(operation);
        id
    }

    /// Insert an operation under its own id. Returns false if the id is taken.
    pub fn insert_operation(&mut self, operation: Operation) -> bool {
        if self.operations.contains_key(&operation.id) {
            return false;
        }
        self.next_operation_id = self.next_operation_id.max(operation.id.0.saturating_add(1));
        self.operations.insert(operation.id, operation);
        true
    }

    /// Record `variable` as declared in `operation`.
    pub fn declare_in_operation(&mut self, operation: OperationId, variable: VariableId) -> bool {
        match self.operations.get_mut(&operation) {
            Some(op) if !op.variables.contains(&variable) => {
                op.variables.push(variable);
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn fragment(&self, id: FragmentId) -> Option<&CodeFragment> {
        self.fragments.get(&id)
    }

    pub fn variable(&self, id: VariableId) -> Option<&VariableDeclaration> {
        self.variables.get(&id)
    }

    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(&id)
    }

    pub fn fragments(&self) -> impl Iterator<Item = &CodeFragment> {
        self.fragments.values()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Rendered text of a fragment, empty if unknown.
    pub fn text(&self, id: FragmentId) -> &str {
        self.fragment(id).map_or("", |f| f.text.as_str())
    }

    /// Variables declared by a fragment, in order.
    pub fn declarations(&self, id: FragmentId) -> Vec<&VariableDeclaration> {
        self.fragment(id)
            .map(|f| {
                f.variable_declarations
                    .iter()
                    .filter_map(|v| self.variable(*v))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First variable named `name` declared by a fragment.
    pub fn variable_declaration(&self, id: FragmentId, name: &str) -> Option<&VariableDeclaration> {
        self.declarations(id).into_iter().find(|d| d.name == name)
    }

    /// Ternary expressions contained in a fragment.
    pub fn ternaries(&self, id: FragmentId) -> Vec<&TernaryOperatorExpression> {
        self.fragment(id)
            .map(|f| {
                f.ternary_expressions
                    .iter()
                    .filter_map(|t| self.fragment(*t).and_then(CodeFragment::ternary))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Infix expressions contained in a fragment.
    pub fn infix_expressions(&self, id: FragmentId) -> Vec<&CodeFragment> {
        self.fragment(id)
            .map(|f| {
                f.infix_expressions
                    .iter()
                    .filter_map(|i| self.fragment(*i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sub-expressions of `id` whose text is `text`, in pre-order.
    ///
    /// When no descendant matches and the fragment is itself an expression
    /// with that text, the fragment itself is returned.
    pub fn find_expression(&self, id: FragmentId, text: &str) -> Vec<FragmentId> {
        let Some(root) = self.fragment(id) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut stack: Vec<FragmentId> = root.children().collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(fragment) = self.fragment(current) else {
                continue;
            };
            if fragment.text == text {
                found.push(current);
            }
            let mut children: Vec<FragmentId> = fragment.children().collect();
            children.reverse();
            stack.extend(children);
        }
        if found.is_empty() && root.is_expression() && root.text == text {
            found.push(id);
        }
        found
    }

    /// Parent chain of a fragment, nearest first.
    pub fn ancestors(&self, id: FragmentId) -> Vec<&CodeFragment> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.fragment(id).and_then(|f| f.parent);
        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            let Some(parent) = self.fragment(parent_id) else {
                break;
            };
            chain.push(parent);
            current = parent.parent;
        }
        chain
    }
}

// ============================================================================
// Tests
// ============================================================================

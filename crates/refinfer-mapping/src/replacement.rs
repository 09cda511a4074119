//! Replacements: atomic textual substitutions between two mapped fragments.
//!
//! A [`Replacement`] is a `before -> after` pair tagged with a
//! [`ReplacementType`]. Some replacements carry the calls they were derived
//! from in a [`ReplacementPayload`]; the payload never takes part in
//! equality, so two replacements with the same text and type are the same
//! replacement whatever their provenance.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::call::Call;

// ============================================================================
// Replacement Types
// ============================================================================

/// Kind of a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementType {
    Type,
    VariableName,
    MethodInvocation,
    MethodInvocationName,
    MethodInvocationArgument,
    MethodInvocationExpression,
    ClassInstanceCreation,
    ClassInstanceCreationArgument,
    ParenthesizedExpression,
    VariableReplacedWithParenthesizedExpression,
    ArrayInitializerReplacedWithMethodInvocationArguments,
    Composite,
    ExpressionReplacedWithTernaryThen,
    ExpressionReplacedWithTernaryElse,
    VariableReplacedWithMethodInvocation,
    ArgumentReplacedWithRightHandSideOfAssignmentExpression,
    ArgumentReplacedWithReturnExpression,
    ArgumentReplacedWithMethodInvocation,
    MethodInvocationReplacedWithConditionalExpression,
    AnonymousClassDeclaration,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    NullLiteral,
    ArgumentReplacedWithVariable,
    Infix,
    Assignment,
}

impl ReplacementType {
    /// Wire name (SCREAMING_SNAKE_CASE).
    pub fn name(&self) -> &'static str {
        match self {
            ReplacementType::Type => "TYPE",
            ReplacementType::VariableName => "VARIABLE_NAME",
            ReplacementType::MethodInvocation => "METHOD_INVOCATION",
            ReplacementType::MethodInvocationName => "METHOD_INVOCATION_NAME",
            ReplacementType::MethodInvocationArgument => "METHOD_INVOCATION_ARGUMENT",
            ReplacementType::MethodInvocationExpression => "METHOD_INVOCATION_EXPRESSION",
            ReplacementType::ClassInstanceCreation => "CLASS_INSTANCE_CREATION",
            ReplacementType::ClassInstanceCreationArgument => "CLASS_INSTANCE_CREATION_ARGUMENT",
            ReplacementType::ParenthesizedExpression => "PARENTHESIZED_EXPRESSION",
            ReplacementType::VariableReplacedWithParenthesizedExpression => {
                "VARIABLE_REPLACED_WITH_PARENTHESIZED_EXPRESSION"
            }
            ReplacementType::ArrayInitializerReplacedWithMethodInvocationArguments => {
                "ARRAY_INITIALIZER_REPLACED_WITH_METHOD_INVOCATION_ARGUMENTS"
            }
            ReplacementType::Composite => "COMPOSITE",
            ReplacementType::ExpressionReplacedWithTernaryThen => {
                "EXPRESSION_REPLACED_WITH_TERNARY_THEN"
            }
            ReplacementType::ExpressionReplacedWithTernaryElse => {
                "EXPRESSION_REPLACED_WITH_TERNARY_ELSE"
            }
            ReplacementType::VariableReplacedWithMethodInvocation => {
                "VARIABLE_REPLACED_WITH_METHOD_INVOCATION"
            }
            ReplacementType::ArgumentReplacedWithRightHandSideOfAssignmentExpression => {
                "ARGUMENT_REPLACED_WITH_RIGHT_HAND_SIDE_OF_ASSIGNMENT_EXPRESSION"
            }
            ReplacementType::ArgumentReplacedWithReturnExpression => {
                "ARGUMENT_REPLACED_WITH_RETURN_EXPRESSION"
            }
            ReplacementType::ArgumentReplacedWithMethodInvocation => {
                "ARGUMENT_REPLACED_WITH_METHOD_INVOCATION"
            }
            ReplacementType::MethodInvocationReplacedWithConditionalExpression => {
                "METHOD_INVOCATION_REPLACED_WITH_CONDITIONAL_EXPRESSION"
            }
            ReplacementType::AnonymousClassDeclaration => "ANONYMOUS_CLASS_DECLARATION",
            ReplacementType::StringLiteral => "STRING_LITERAL",
            ReplacementType::NumberLiteral => "NUMBER_LITERAL",
            ReplacementType::BooleanLiteral => "BOOLEAN_LITERAL",
            ReplacementType::NullLiteral => "NULL_LITERAL",
            ReplacementType::ArgumentReplacedWithVariable => "ARGUMENT_REPLACED_WITH_VARIABLE",
            ReplacementType::Infix => "INFIX",
            ReplacementType::Assignment => "ASSIGNMENT",
        }
    }

    /// Whether parentheses around either side are noise for this type.
    pub fn is_parenthesized(&self) -> bool {
        matches!(
            self,
            ReplacementType::ParenthesizedExpression
                | ReplacementType::VariableReplacedWithParenthesizedExpression
        )
    }
}

impl fmt::Display for ReplacementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Structured data a replacement was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplacementPayload {
    /// Plain text substitution.
    #[default]
    None,
    /// One method invocation replaced by another.
    MethodInvocation { before: Call, after: Call },
    /// One object creation replaced by another.
    ObjectCreation { before: Call, after: Call },
    /// A variable replaced by a method invocation (either direction).
    VariableWithMethodInvocation { invocation: Call },
    /// An object creation replaced by a method invocation.
    ClassInstanceCreationWithMethodInvocation { creation: Call, invocation: Call },
    /// A method invocation replaced by an object creation.
    MethodInvocationWithClassInstanceCreation { invocation: Call, creation: Call },
    /// Several statements collapsed into one.
    Composite,
    /// Intersecting invocation chains.
    Intersection,
}

// ============================================================================
// Replacement
// ============================================================================

/// One `before -> after` substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replacement {
    pub before: String,
    pub after: String,
    #[serde(rename = "type")]
    pub replacement_type: ReplacementType,
    #[serde(default)]
    pub payload: ReplacementPayload,
}

impl Replacement {
    /// Create a plain replacement.
    pub fn new(
        before: impl Into<String>,
        after: impl Into<String>,
        replacement_type: ReplacementType,
    ) -> Self {
        Replacement {
            before: before.into(),
            after: after.into(),
            replacement_type,
            payload: ReplacementPayload::None,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: ReplacementPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Create a method-invocation replacement from two calls.
    pub fn method_invocation(before: Call, after: Call, replacement_type: ReplacementType) -> Self {
        Replacement::new(before.text.clone(), after.text.clone(), replacement_type)
            .with_payload(ReplacementPayload::MethodInvocation { before, after })
    }

    /// Calls of a method-invocation replacement.
    pub fn invoked_operations(&self) -> Option<(&Call, &Call)> {
        match &self.payload {
            ReplacementPayload::MethodInvocation { before, after } => Some((before, after)),
            _ => None,
        }
    }

    /// Call of a variable-with-method-invocation replacement.
    pub fn variable_invocation(&self) -> Option<&Call> {
        match &self.payload {
            ReplacementPayload::VariableWithMethodInvocation { invocation } => Some(invocation),
            _ => None,
        }
    }

    /// Method-invocation or object-creation replacement.
    pub fn is_call_replacement(&self) -> bool {
        matches!(
            self.payload,
            ReplacementPayload::MethodInvocation { .. } | ReplacementPayload::ObjectCreation { .. }
        )
    }

    /// Whether this replacement involves a method invocation on either side.
    pub fn involves_method_invocation(&self) -> bool {
        matches!(
            self.payload,
            ReplacementPayload::MethodInvocation { .. }
                | ReplacementPayload::VariableWithMethodInvocation { .. }
                | ReplacementPayload::ClassInstanceCreationWithMethodInvocation { .. }
                | ReplacementPayload::MethodInvocationWithClassInstanceCreation { .. }
                | ReplacementPayload::Intersection
        ) || matches!(
            self.replacement_type,
            ReplacementType::ArgumentReplacedWithRightHandSideOfAssignmentExpression
                | ReplacementType::ArgumentReplacedWithReturnExpression
                | ReplacementType::ArgumentReplacedWithMethodInvocation
                | ReplacementType::MethodInvocationReplacedWithConditionalExpression
                | ReplacementType::AnonymousClassDeclaration
        )
    }

    /// Either side is a double-quoted string literal.
    pub fn involves_string_literal(&self) -> bool {
        refinfer_core::text::is_string_literal(&self.before)
            || refinfer_core::text::is_string_literal(&self.after)
    }
}

impl PartialEq for Replacement {
    fn eq(&self, other: &Self) -> bool {
        self.before == other.before
            && self.after == other.after
            && self.replacement_type == other.replacement_type
    }
}

impl Eq for Replacement {}

impl Hash for Replacement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.before.hash(state);
        self.after.hash(state);
        self.replacement_type.hash(state);
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.before, self.after, self.replacement_type)
    }
}

// ============================================================================
// Replacement Set
// ============================================================================

/// Insertion-ordered set of replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementSet {
    items: Vec<Replacement>,
}

impl ReplacementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a replacement; returns false if an equal one is present.
    pub fn insert(&mut self, replacement: Replacement) -> bool {
        if self.items.contains(&replacement) {
            return false;
        }
        self.items.push(replacement);
        true
    }

    pub fn extend(&mut self, replacements: impl IntoIterator<Item = Replacement>) {
        for r in replacements {
            self.insert(r);
        }
    }

    pub fn contains(&self, replacement: &Replacement) -> bool {
        self.items.contains(replacement)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Replacement> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replacements also present in `other`, in this set's order.
    pub fn intersection(&self, other: &ReplacementSet) -> ReplacementSet {
        ReplacementSet {
            items: self
                .items
                .iter()
                .filter(|r| other.contains(r))
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<Replacement> for ReplacementSet {
    fn from_iter<I: IntoIterator<Item = Replacement>>(iter: I) -> Self {
        let mut set = ReplacementSet::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a ReplacementSet {
    type Item = &'a Replacement;
    type IntoIter = std::slice::Iter<'a, Replacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Conditional (`c ? a : b`) expressions.

use crate::fragment::{FragmentId, FragmentStore};
use crate::replacement::{Replacement, ReplacementType};

/// A conditional expression split into its three parts.
///
/// Each part is an expression fragment in the same store. `id` is the
/// fragment of the whole conditional expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TernaryOperatorExpression {
    pub id: FragmentId,
    pub condition: FragmentId,
    pub then_expression: FragmentId,
    pub else_expression: FragmentId,
}

impl TernaryOperatorExpression {
    /// Create a ternary; `id` is set when the fragment is added to a store.
    pub fn new(condition: FragmentId, then_expression: FragmentId, else_expression: FragmentId) -> Self {
        TernaryOperatorExpression {
            id: FragmentId(0),
            condition,
            then_expression,
            else_expression,
        }
    }

    /// Text of the whole conditional expression.
    pub fn expression<'s>(&self, store: &'s FragmentStore) -> &'s str {
        store.text(self.id)
    }

    /// The branch whose text equals `text`, else branch first.
    fn matching_branch(&self, store: &FragmentStore, text: &str) -> Option<ReplacementType> {
        if store.text(self.else_expression) == text {
            Some(ReplacementType::ExpressionReplacedWithTernaryElse)
        } else if store.text(self.then_expression) == text {
            Some(ReplacementType::ExpressionReplacedWithTernaryThen)
        } else {
            None
        }
    }

    /// `statement` in the first version became this ternary in the second.
    pub fn make_replacement_with_ternary_on_the_right(
        &self,
        store: &FragmentStore,
        statement: &str,
    ) -> Option<Replacement> {
        self.matching_branch(store, statement)
            .map(|t| Replacement::new(statement, self.expression(store), t))
    }

    /// This ternary in the first version became `statement` in the second.
    pub fn make_replacement_with_ternary_on_the_left(
        &self,
        store: &FragmentStore,
        statement: &str,
    ) -> Option<Replacement> {
        self.matching_branch(store, statement)
            .map(|t| Replacement::new(self.expression(store), statement, t))
    }

    /// Whether the then or else branch renders as `text`.
    pub fn has_branch(&self, store: &FragmentStore, text: &str) -> bool {
        self.matching_branch(store, text).is_some()
    }

    /// The branch fragment rendering as `text`, then branch first.
    pub fn branch(&self, store: &FragmentStore, text: &str) -> Option<FragmentId> {
        if store.text(self.then_expression) == text {
            Some(self.then_expression)
        } else if store.text(self.else_expression) == text {
            Some(self.else_expression)
        } else {
            None
        }
    }
}

//! Facts about the class-level diff surrounding a body mapping.
//!
//! The inference heuristics consult the class diff for renamed, removed and
//! added operations. [`ClassDiffContext`] is the seam; [`ClassDiffSnapshot`]
//! is the implementation loaded from diff documents.

use serde::{Deserialize, Serialize};

use crate::call::Call;
use crate::fragment::FragmentStore;
use crate::operation::OperationId;

/// An operation renamed between the two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenameOperationRefactoring {
    /// The operation in the first version.
    pub original: OperationId,
    /// The operation in the second version.
    pub renamed: OperationId,
}

/// Read access to the enclosing class diff.
pub trait ClassDiffContext {
    /// Rename-operation refactorings detected so far.
    fn rename_operation_refactorings(&self) -> &[RenameOperationRefactoring];

    /// Operations present only in the first version.
    fn removed_operations(&self) -> &[OperationId];

    /// Operations present only in the second version.
    fn added_operations(&self) -> &[OperationId];

    /// The operation among `operations` that `call` (made from `caller`)
    /// invokes, if any.
    fn matches_operation(
        &self,
        store: &FragmentStore,
        call: &Call,
        operations: &[OperationId],
        caller: OperationId,
    ) -> Option<OperationId>;
}

/// Class-diff facts recorded in a diff document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDiffSnapshot {
    #[serde(default)]
    pub renamed_operations: Vec<RenameOperationRefactoring>,
    #[serde(default)]
    pub removed_operations: Vec<OperationId>,
    #[serde(default)]
    pub added_operations: Vec<OperationId>,
}

impl ClassDiffContext for ClassDiffSnapshot {
    fn rename_operation_refactorings(&self) -> &[RenameOperationRefactoring] {
        &self.renamed_operations
    }

    fn removed_operations(&self) -> &[OperationId] {
        &self.removed_operations
    }

    fn added_operations(&self) -> &[OperationId] {
        &self.added_operations
    }

    /// Match by name and argument count. A call never matches its caller.
    fn matches_operation(
        &self,
        store: &FragmentStore,
        call: &Call,
        operations: &[OperationId],
        caller: OperationId,
    ) -> Option<OperationId> {
        operations.iter().copied().find(|&id| {
            id != caller
                && store.operation(id).is_some_and(|op| {
                    op.name == call.name && op.parameters.len() == call.arguments.len()
                })
        })
    }
}

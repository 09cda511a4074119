//! Operations: the methods (or other variable containers) enclosing fragments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fragment::FragmentStore;
use crate::location::LocationInfo;
use crate::variable::{VariableDeclaration, VariableId};

/// Unique identifier for an operation within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct OperationId(pub u32);

impl OperationId {
    pub fn new(id: u32) -> Self {
        OperationId(id)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op_{}", self.0)
    }
}

/// A method, constructor or initializer that declares variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: OperationId,
    pub name: String,
    pub class_name: String,
    /// Rendered parameters (`long millis`).
    pub parameters: Vec<String>,
    /// Every variable declared in the operation, parameters included.
    pub variables: Vec<VariableId>,
}

impl Operation {
    pub fn new(id: OperationId, name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Operation {
            id,
            name: name.into(),
            class_name: class_name.into(),
            parameters: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: &[&str]) -> Self {
        self.parameters = parameters.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_variables(mut self, variables: Vec<VariableId>) -> Self {
        self.variables = variables;
        self
    }

    /// Declarations visible at `location`, in declaration order.
    pub fn variable_declarations_in_scope<'s>(
        &self,
        store: &'s FragmentStore,
        location: &LocationInfo,
    ) -> Vec<&'s VariableDeclaration> {
        self.variables
            .iter()
            .filter_map(|id| store.variable(*id))
            .filter(|decl| decl.is_in_scope(&location.span))
            .collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameters.join(", "))
    }
}

//! Variable declarations.

use std::fmt;

use refinfer_core::types::Span;
use serde::{Deserialize, Serialize};

use crate::fragment::FragmentId;

/// Unique identifier for a variable declaration within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct VariableId(pub u32);

impl VariableId {
    pub fn new(id: u32) -> Self {
        VariableId(id)
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var_{}", self.0)
    }
}

/// Where a variable is declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    #[default]
    Local,
    Parameter,
    Field,
    EnhancedFor,
}

/// A declared variable with its optional initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub id: VariableId,
    pub name: String,
    /// Declared type, absent for inferred (`var`) declarations.
    pub var_type: Option<String>,
    /// Initializer expression fragment.
    pub initializer: Option<FragmentId>,
    /// Region of the enclosing operation where the variable is visible.
    pub scope: Span,
    pub kind: VariableKind,
}

impl VariableDeclaration {
    pub fn new(id: VariableId, name: impl Into<String>, var_type: Option<&str>, scope: Span) -> Self {
        VariableDeclaration {
            id,
            name: name.into(),
            var_type: var_type.map(str::to_string),
            initializer: None,
            scope,
            kind: VariableKind::Local,
        }
    }

    pub fn with_initializer(mut self, initializer: FragmentId) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn with_kind(mut self, kind: VariableKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the declaration is visible at `span`.
    pub fn is_in_scope(&self, span: &Span) -> bool {
        self.scope.contains(span)
    }
}

impl fmt::Display for VariableDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.var_type {
            Some(t) => write!(f, "{} : {}", self.name, t),
            None => f.write_str(&self.name),
        }
    }
}

/// Render a declaration list as `[a : T, b : U]`.
pub fn render_declarations<'a>(decls: impl IntoIterator<Item = &'a VariableDeclaration>) -> String {
    let items: Vec<String> = decls.into_iter().map(|d| d.to_string()).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_name_and_type() {
        let d = VariableDeclaration::new(VariableId(1), "count", Some("int"), Span::new(0, 10));
        assert_eq!(d.to_string(), "count : int");
        let d = VariableDeclaration::new(VariableId(2), "v", None, Span::new(0, 10));
        assert_eq!(d.to_string(), "v");
    }

    #[test]
    fn renders_lists() {
        let a = VariableDeclaration::new(VariableId(1), "a", Some("A"), Span::new(0, 10));
        let b = VariableDeclaration::new(VariableId(2), "b", Some("B"), Span::new(0, 10));
        assert_eq!(render_declarations([&a, &b]), "[a : A, b : B]");
        assert_eq!(render_declarations(std::iter::empty()), "[]");
    }

    #[test]
    fn scope_containment() {
        let d = VariableDeclaration::new(VariableId(1), "x", Some("int"), Span::new(10, 50));
        assert!(d.is_in_scope(&Span::new(20, 30)));
        assert!(!d.is_in_scope(&Span::new(5, 30)));
    }
}

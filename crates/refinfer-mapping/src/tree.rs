//! AST node mappings recorded alongside fragment mappings.
//!
//! Nodes render the way the tree matcher prints them:
//!
//! ```text
//! SimpleName: millis [3891,3897]
//! SingleVariableDeclaration [3886,3897]
//! ```
//!
//! and a mapping renders as `src -> dst`.

use std::collections::HashSet;
use std::fmt;

use refinfer_core::types::Span;
use serde::{Deserialize, Serialize};

use crate::fragment::{CodeFragment, FragmentStore};
use crate::mapping::CodeMapping;

/// A node of the syntax tree: type name, optional label, character span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AstNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub span: Span,
}

impl AstNode {
    pub fn new(node_type: impl Into<String>, span: Span) -> Self {
        AstNode {
            node_type: node_type.into(),
            label: None,
            span,
        }
    }

    pub fn labeled(node_type: impl Into<String>, label: impl Into<String>, span: Span) -> Self {
        AstNode {
            node_type: node_type.into(),
            label: Some(label.into()),
            span,
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(
                f,
                "{}: {} [{},{}]",
                self.node_type, label, self.span.start, self.span.end
            ),
            None => write!(f, "{} [{},{}]", self.node_type, self.span.start, self.span.end),
        }
    }
}

/// A source node matched to a destination node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AstMapping {
    pub src: AstNode,
    pub dst: AstNode,
}

impl AstMapping {
    pub fn new(src: AstNode, dst: AstNode) -> Self {
        AstMapping { src, dst }
    }
}

impl fmt::Display for AstMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

// ============================================================================
// Store
// ============================================================================

/// Ordered set of node mappings.
///
/// Adding a pair that is already present is a no-op, so feeding the same
/// node mapping from several fragment mappings keeps one copy. Identity is
/// the whole `(src, dst)` pair: a source matched to two different
/// destinations is held twice.
#[derive(Debug, Clone, Default)]
pub struct AstMappingStore {
    mappings: Vec<AstMapping>,
    seen: HashSet<AstMapping>,
}

impl AstMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the pair was already stored.
    pub fn add(&mut self, mapping: AstMapping) -> bool {
        if self.seen.contains(&mapping) {
            return false;
        }
        self.seen.insert(mapping.clone());
        self.mappings.push(mapping);
        true
    }

    pub fn contains(&self, mapping: &AstMapping) -> bool {
        self.seen.contains(mapping)
    }

    /// Mappings whose source is `src`, in insertion order.
    pub fn mappings_of_src<'s>(&'s self, src: &'s AstNode) -> impl Iterator<Item = &'s AstMapping> {
        self.mappings.iter().filter(move |m| &m.src == src)
    }

    /// Number of stored mappings whose source renders as `rendered`.
    ///
    /// Counts destinations, so a source with several targets counts once
    /// per target.
    pub fn count_src(&self, rendered: &str) -> usize {
        self.mappings
            .iter()
            .filter(|m| m.src.to_string() == rendered)
            .count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AstMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Extend<AstMapping> for AstMappingStore {
    fn extend<I: IntoIterator<Item = AstMapping>>(&mut self, iter: I) {
        for mapping in iter {
            self.add(mapping);
        }
    }
}

impl FromIterator<AstMapping> for AstMappingStore {
    fn from_iter<I: IntoIterator<Item = AstMapping>>(iter: I) -> Self {
        let mut store = AstMappingStore::new();
        store.extend(iter);
        store
    }
}

impl<'a> IntoIterator for &'a AstMappingStore {
    type Item = &'a AstMapping;
    type IntoIter = std::slice::Iter<'a, AstMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

// ============================================================================
// Fragment mappings as node mappings
// ============================================================================

impl CodeMapping {
    /// The node mapping between the roots of the two fragments.
    ///
    /// Labeled node types (names, literals, primitive types) carry the
    /// fragment text as label.
    pub fn ast_mapping(&self, store: &FragmentStore) -> Option<AstMapping> {
        let f1 = store.fragment(self.fragment1)?;
        let f2 = store.fragment(self.fragment2)?;
        let node = |fragment: &CodeFragment| {
            let element = fragment.location.code_element_type;
            let span = fragment.location.span;
            if element.is_labeled() {
                AstNode::labeled(element.ast_node_type(), fragment.text.trim(), span)
            } else {
                AstNode::new(element.ast_node_type(), span)
            }
        };
        Some(AstMapping::new(node(f1), node(f2)))
    }
}

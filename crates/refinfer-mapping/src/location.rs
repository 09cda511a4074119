//! Source locations of code fragments.

use std::fmt;

use refinfer_core::types::{Location, Span};
use serde::{Deserialize, Serialize};

/// Syntactic category of a code fragment, as reported by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeElementType {
    // statements
    VariableDeclarationStatement,
    ExpressionStatement,
    ReturnStatement,
    ThrowStatement,
    BreakStatement,
    ContinueStatement,
    EmptyStatement,
    Block,
    IfStatement,
    ForStatement,
    EnhancedForStatement,
    WhileStatement,
    DoStatement,
    SwitchStatement,
    SwitchCase,
    TryStatement,
    CatchClause,
    FinallyBlock,
    SynchronizedStatement,
    LabeledStatement,
    // declarations
    SingleVariableDeclaration,
    VariableDeclarationFragment,
    FieldDeclaration,
    MethodDeclaration,
    // expressions
    MethodInvocation,
    SuperMethodInvocation,
    ClassInstanceCreation,
    ArrayCreation,
    ArrayAccess,
    Assignment,
    InfixExpression,
    PrefixExpression,
    PostfixExpression,
    CastExpression,
    ParenthesizedExpression,
    LambdaExpression,
    FieldAccess,
    QualifiedName,
    SimpleName,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    NullLiteral,
    CharLiteral,
    TypeLiteral,
    ThisExpression,
    TernaryOperator,
    TernaryOperatorCondition,
    TernaryOperatorThenExpression,
    TernaryOperatorElseExpression,
    // types
    PrimitiveType,
    SimpleType,
    ParameterizedType,
    ArrayType,
}

impl CodeElementType {
    /// Name of the AST node type this element corresponds to.
    pub fn ast_node_type(&self) -> &'static str {
        match self {
            CodeElementType::VariableDeclarationStatement => "VariableDeclarationStatement",
            CodeElementType::ExpressionStatement => "ExpressionStatement",
            CodeElementType::ReturnStatement => "ReturnStatement",
            CodeElementType::ThrowStatement => "ThrowStatement",
            CodeElementType::BreakStatement => "BreakStatement",
            CodeElementType::ContinueStatement => "ContinueStatement",
            CodeElementType::EmptyStatement => "EmptyStatement",
            CodeElementType::Block | CodeElementType::FinallyBlock => "Block",
            CodeElementType::IfStatement => "IfStatement",
            CodeElementType::ForStatement => "ForStatement",
            CodeElementType::EnhancedForStatement => "EnhancedForStatement",
            CodeElementType::WhileStatement => "WhileStatement",
            CodeElementType::DoStatement => "DoStatement",
            CodeElementType::SwitchStatement => "SwitchStatement",
            CodeElementType::SwitchCase => "SwitchCase",
            CodeElementType::TryStatement => "TryStatement",
            CodeElementType::CatchClause => "CatchClause",
            CodeElementType::SynchronizedStatement => "SynchronizedStatement",
            CodeElementType::LabeledStatement => "LabeledStatement",
            CodeElementType::SingleVariableDeclaration => "SingleVariableDeclaration",
            CodeElementType::VariableDeclarationFragment => "VariableDeclarationFragment",
            CodeElementType::FieldDeclaration => "FieldDeclaration",
            CodeElementType::MethodDeclaration => "MethodDeclaration",
            CodeElementType::MethodInvocation => "MethodInvocation",
            CodeElementType::SuperMethodInvocation => "SuperMethodInvocation",
            CodeElementType::ClassInstanceCreation => "ClassInstanceCreation",
            CodeElementType::ArrayCreation => "ArrayCreation",
            CodeElementType::ArrayAccess => "ArrayAccess",
            CodeElementType::Assignment => "Assignment",
            CodeElementType::InfixExpression => "InfixExpression",
            CodeElementType::PrefixExpression => "PrefixExpression",
            CodeElementType::PostfixExpression => "PostfixExpression",
            CodeElementType::CastExpression => "CastExpression",
            CodeElementType::ParenthesizedExpression => "ParenthesizedExpression",
            CodeElementType::LambdaExpression => "LambdaExpression",
            CodeElementType::FieldAccess => "FieldAccess",
            CodeElementType::QualifiedName => "QualifiedName",
            CodeElementType::SimpleName => "SimpleName",
            CodeElementType::StringLiteral => "StringLiteral",
            CodeElementType::NumberLiteral => "NumberLiteral",
            CodeElementType::BooleanLiteral => "BooleanLiteral",
            CodeElementType::NullLiteral => "NullLiteral",
            CodeElementType::CharLiteral => "CharacterLiteral",
            CodeElementType::TypeLiteral => "TypeLiteral",
            CodeElementType::ThisExpression => "ThisExpression",
            CodeElementType::TernaryOperator
            | CodeElementType::TernaryOperatorCondition
            | CodeElementType::TernaryOperatorThenExpression
            | CodeElementType::TernaryOperatorElseExpression => "ConditionalExpression",
            CodeElementType::PrimitiveType => "PrimitiveType",
            CodeElementType::SimpleType => "SimpleType",
            CodeElementType::ParameterizedType => "ParameterizedType",
            CodeElementType::ArrayType => "ArrayType",
        }
    }

    /// Whether AST dumps print the node's text as a label.
    ///
    /// Leaves (names, literals, primitive types) carry a label; inner nodes
    /// are printed with their type and span only.
    pub fn is_labeled(&self) -> bool {
        matches!(
            self,
            CodeElementType::SimpleName
                | CodeElementType::StringLiteral
                | CodeElementType::NumberLiteral
                | CodeElementType::BooleanLiteral
                | CodeElementType::NullLiteral
                | CodeElementType::CharLiteral
                | CodeElementType::PrimitiveType
        )
    }
}

/// Where a fragment sits: file, offsets and syntactic category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationInfo {
    /// File path (repository-relative).
    pub file_path: String,
    /// Offsets of the fragment.
    pub span: Span,
    /// Syntactic category.
    pub code_element_type: CodeElementType,
}

impl LocationInfo {
    /// Create a new location.
    pub fn new(file_path: impl Into<String>, span: Span, code_element_type: CodeElementType) -> Self {
        LocationInfo {
            file_path: file_path.into(),
            span,
            code_element_type,
        }
    }

    /// Whether `other` lies inside this location.
    pub fn subsumes(&self, other: &LocationInfo) -> bool {
        self.file_path == other.file_path && self.span.contains(&other.span)
    }

    /// File/offset view used by reports.
    pub fn to_location(&self) -> Location {
        Location::new(self.file_path.clone(), self.span)
    }
}

impl fmt::Display for LocationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.code_element_type.ast_node_type(),
            self.file_path,
            self.span
        )
    }
}

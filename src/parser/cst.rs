//! Concrete syntax tree produced by the parser.
//!
//! The tree mirrors the source closely: parenthesized groups, nested
//! `BEGIN … END` blocks and local object declarations are kept, and every
//! operator carries the lexeme it was written with. The builder turns this
//! into the canonical [`crate::ast::Program`].

use crate::token::Span;

#[derive(Debug, PartialEq, Clone)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

/// An operator exactly as written, e.g. `≤`, `<=` or `DIV`.
#[derive(Debug, PartialEq, Clone)]
pub struct OperatorToken {
    pub lexeme: String,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SyntaxTree {
    pub items: Vec<Item>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Item {
    Procedure(ProcedureDecl),
    Class(ClassDecl),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassDecl {
    pub name: Option<Ident>,
    pub attributes: Vec<Ident>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ProcedureDecl {
    pub name: Ident,
    pub params: Vec<ParamDecl>,
    pub body: Block,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ParamDecl {
    pub name: Ident,
    pub type_name: Option<Ident>,
}

/// A statement list. `delimited` is set for `BEGIN … END` blocks.
#[derive(Debug, PartialEq, Clone)]
pub struct Block {
    pub statements: Vec<StatementNode>,
    pub delimited: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum StatementNode {
    Assign {
        target: ExprNode,
        assign: OperatorToken,
        value: ExprNode,
    },
    If {
        condition: ExprNode,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        condition: ExprNode,
        body: Block,
    },
    For {
        var: Ident,
        start: ExprNode,
        end: ExprNode,
        step: Option<ExprNode>,
        body: Block,
    },
    Repeat {
        body: Block,
        condition: ExprNode,
    },
    Call {
        name: Ident,
        args: Vec<ExprNode>,
    },
    Return {
        value: Option<ExprNode>,
        span: Span,
    },
    ObjectDecl {
        class_name: Option<Ident>,
        name: Ident,
    },
    Block(Block),
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExprNode {
    Name(Ident),
    Integer {
        value: i64,
        span: Span,
    },
    Str {
        value: String,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    Group {
        inner: Box<ExprNode>,
        span: Span,
    },
    Binary {
        left: Box<ExprNode>,
        op: Option<OperatorToken>,
        right: Box<ExprNode>,
    },
    Unary {
        op: OperatorToken,
        operand: Box<ExprNode>,
    },
    Call {
        callee: Ident,
        args: Vec<ExprNode>,
    },
    Index {
        base: Box<ExprNode>,
        index: Box<ExprNode>,
    },
    Field {
        base: Box<ExprNode>,
        field: Ident,
    },
}

impl ExprNode {
    /// Position of the leftmost token of the node.
    pub fn span(&self) -> Span {
        match self {
            ExprNode::Name(ident) => ident.span,
            ExprNode::Integer { span, .. }
            | ExprNode::Str { span, .. }
            | ExprNode::Boolean { span, .. }
            | ExprNode::Group { span, .. } => *span,
            ExprNode::Binary { left, .. } => left.span(),
            ExprNode::Unary { op, .. } => op.span,
            ExprNode::Call { callee, .. } => callee.span,
            ExprNode::Index { base, .. } | ExprNode::Field { base, .. } => base.span(),
        }
    }
}

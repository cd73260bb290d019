//! Canonical syntax tree handed to the pattern extractor.
//!
//! Every node is a closed enum variant with owned children, and all types
//! serialize with an internal `"type"` tag so the lowered program can be
//! dumped as JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    pub fn is_multiplicative(self) -> bool {
        matches!(
            self,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::IntDiv
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::IntDiv => "div",
            BinaryOperator::Mod => "mod",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Not,
    Floor,
    Ceil,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Access {
    Index { index: Expression },
    Field { name: String },
}

/// Assignment target: a variable followed by index or field accesses.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LValue {
    pub name: String,
    pub accesses: Vec<Access>,
}

impl LValue {
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accesses: Vec::new(),
        }
    }

    /// The target names a whole variable rather than an element or field.
    pub fn is_scalar(&self) -> bool {
        self.accesses.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    Identifier {
        name: String,
    },
    Number {
        value: i64,
    },
    Boolean {
        value: bool,
    },
    StringLiteral {
        value: String,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    LogicalOp {
        op: LogicalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        name: String,
        args: Vec<Expression>,
    },
    ArrayAccess {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    FieldAccess {
        object: Box<Expression>,
        field: String,
    },
    LValue(LValue),
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier { name: name.into() }
    }

    pub fn number(value: i64) -> Self {
        Expression::Number { value }
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Pre-order walk over this expression and all of its subexpressions.
    pub fn visit<'e>(&'e self, f: &mut dyn FnMut(&'e Expression)) {
        f(self);
        match self {
            Expression::Identifier { .. }
            | Expression::Number { .. }
            | Expression::Boolean { .. }
            | Expression::StringLiteral { .. } => {}
            Expression::BinaryOp { left, right, .. } | Expression::LogicalOp { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expression::UnaryOp { operand, .. } => operand.visit(f),
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.visit(f);
                }
            }
            Expression::ArrayAccess { base, index } => {
                base.visit(f);
                index.visit(f);
            }
            Expression::FieldAccess { object, .. } => object.visit(f),
            Expression::LValue(lvalue) => {
                for access in &lvalue.accesses {
                    if let Access::Index { index } = access {
                        index.visit(f);
                    }
                }
            }
        }
    }

    /// Names of every variable read by the expression, in order of appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.visit(&mut |expr| match expr {
            Expression::Identifier { name } => names.push(name.as_str()),
            Expression::LValue(lvalue) => names.push(lvalue.name.as_str()),
            _ => {}
        });
        names
    }

    /// True when the expression inspects array elements or object fields.
    pub fn reads_data(&self) -> bool {
        let mut found = false;
        self.visit(&mut |expr| {
            if matches!(
                expr,
                Expression::ArrayAccess { .. } | Expression::FieldAccess { .. }
            ) || matches!(expr, Expression::LValue(lvalue) if !lvalue.is_scalar())
            {
                found = true;
            }
        });
        found
    }

    /// Strips any `floor`/`ceil` wrappers.
    pub fn without_rounding(&self) -> &Expression {
        match self {
            Expression::UnaryOp {
                op: UnaryOperator::Floor | UnaryOperator::Ceil,
                operand,
            } => operand.without_rounding(),
            other => other,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    Assign {
        target: LValue,
        value: Expression,
    },
    If {
        cond: Expression,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
    While {
        cond: Expression,
        body: Vec<Statement>,
    },
    For {
        var: String,
        start: Expression,
        end: Expression,
        step: Option<Expression>,
        body: Vec<Statement>,
    },
    Repeat {
        body: Vec<Statement>,
        cond: Expression,
    },
    Call {
        name: String,
        args: Vec<Expression>,
    },
    Return {
        value: Option<Expression>,
    },
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_name: Option<String>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Option<String>,
    pub attributes: Vec<String>,
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub procedures: Vec<Procedure>,
    pub classes: Vec<ClassDecl>,
}

impl Program {
    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|procedure| procedure.name == name)
    }

    pub fn procedure_names(&self) -> Vec<String> {
        self.procedures.iter().map(|p| p.name.clone()).collect()
    }
}

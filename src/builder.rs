//! Lowers the concrete syntax tree into the canonical [`Program`].
//!
//! Groups and nested `BEGIN … END` blocks disappear, local object
//! declarations are dropped and every surface operator is mapped onto its
//! typed enum. Nothing here guesses: a binary node without an operator is a
//! [`BuildError::MalformedExpression`].

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::ast::{
    Access, BinaryOperator, ClassDecl, Expression, LValue, LogicalOperator, Param, Procedure,
    Program, Statement, UnaryOperator,
};
use crate::parser::cst::{
    self, Block, ExprNode, Item, OperatorToken, ProcedureDecl, StatementNode, SyntaxTree,
};

pub mod error;

pub use error::{BuildError, BuildResult};

enum Operator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

pub fn lower(tree: &SyntaxTree) -> BuildResult<Program> {
    let mut program = Program::default();
    let mut seen = FxHashSet::default();
    for item in &tree.items {
        match item {
            Item::Procedure(decl) => {
                if !seen.insert(decl.name.text.as_str()) {
                    return Err(BuildError::DuplicateProcedure {
                        name: decl.name.text.clone(),
                    });
                }
                program.procedures.push(lower_procedure(decl)?);
            }
            Item::Class(decl) => program.classes.push(lower_class(decl)),
        }
    }
    debug!(
        procedures = program.procedures.len(),
        classes = program.classes.len(),
        "lowered program"
    );
    Ok(program)
}

fn lower_class(decl: &cst::ClassDecl) -> ClassDecl {
    ClassDecl {
        name: decl.name.as_ref().map(|name| name.text.clone()),
        attributes: decl.attributes.iter().map(|a| a.text.clone()).collect(),
    }
}

fn lower_procedure(decl: &ProcedureDecl) -> BuildResult<Procedure> {
    let params = decl
        .params
        .iter()
        .map(|param| Param {
            name: param.name.text.clone(),
            type_name: param.type_name.as_ref().map(|t| t.text.clone()),
        })
        .collect();
    Ok(Procedure {
        name: decl.name.text.clone(),
        params,
        body: lower_block(&decl.body)?,
    })
}

fn lower_block(block: &Block) -> BuildResult<Vec<Statement>> {
    let mut statements = Vec::with_capacity(block.statements.len());
    for statement in &block.statements {
        lower_statement(statement, &mut statements)?;
    }
    Ok(statements)
}

fn lower_statement(node: &StatementNode, out: &mut Vec<Statement>) -> BuildResult<()> {
    let statement = match node {
        StatementNode::Assign { target, value, .. } => Statement::Assign {
            target: lower_target(target)?,
            value: lower_expression(value)?,
        },
        StatementNode::If {
            condition,
            then_block,
            else_block,
        } => Statement::If {
            cond: lower_expression(condition)?,
            then_body: lower_block(then_block)?,
            else_body: match else_block {
                Some(block) => lower_block(block)?,
                None => Vec::new(),
            },
        },
        StatementNode::While { condition, body } => Statement::While {
            cond: lower_expression(condition)?,
            body: lower_block(body)?,
        },
        StatementNode::For {
            var,
            start,
            end,
            step,
            body,
        } => Statement::For {
            var: var.text.clone(),
            start: lower_expression(start)?,
            end: lower_expression(end)?,
            step: step.as_ref().map(lower_expression).transpose()?,
            body: lower_block(body)?,
        },
        StatementNode::Repeat { body, condition } => Statement::Repeat {
            body: lower_block(body)?,
            cond: lower_expression(condition)?,
        },
        StatementNode::Call { name, args } => Statement::Call {
            name: name.text.clone(),
            args: lower_arguments(args)?,
        },
        StatementNode::Return { value, .. } => Statement::Return {
            value: value.as_ref().map(lower_expression).transpose()?,
        },
        StatementNode::ObjectDecl { class_name, name } => {
            trace!(
                object = %name.text,
                class = class_name.as_ref().map(|c| c.text.as_str()),
                "dropping local object declaration"
            );
            return Ok(());
        }
        StatementNode::Block(block) => {
            for statement in &block.statements {
                lower_statement(statement, out)?;
            }
            return Ok(());
        }
    };
    out.push(statement);
    Ok(())
}

fn lower_arguments(args: &[ExprNode]) -> BuildResult<Vec<Expression>> {
    args.iter().map(lower_expression).collect()
}

fn lower_target(target: &ExprNode) -> BuildResult<LValue> {
    match target {
        ExprNode::Name(_) | ExprNode::Index { .. } | ExprNode::Field { .. } => {
            lvalue_chain(target)?.ok_or(BuildError::InvalidAssignTarget {
                position: target.span(),
            })
        }
        other => Err(BuildError::InvalidAssignTarget {
            position: other.span(),
        }),
    }
}

/// Collects `name[..].field…` into an [`LValue`]; `None` when the chain is
/// not rooted at a plain name.
fn lvalue_chain(node: &ExprNode) -> BuildResult<Option<LValue>> {
    match node {
        ExprNode::Name(ident) => Ok(Some(LValue::variable(ident.text.clone()))),
        ExprNode::Index { base, index } => {
            let Some(mut lvalue) = lvalue_chain(base)? else {
                return Ok(None);
            };
            lvalue.accesses.push(Access::Index {
                index: lower_expression(index)?,
            });
            Ok(Some(lvalue))
        }
        ExprNode::Field { base, field } => {
            let Some(mut lvalue) = lvalue_chain(base)? else {
                return Ok(None);
            };
            lvalue.accesses.push(Access::Field {
                name: field.text.clone(),
            });
            Ok(Some(lvalue))
        }
        _ => Ok(None),
    }
}

fn lower_expression(node: &ExprNode) -> BuildResult<Expression> {
    let expr = match node {
        ExprNode::Name(ident) => Expression::identifier(ident.text.clone()),
        ExprNode::Integer { value, .. } => Expression::number(*value),
        ExprNode::Str { value, .. } => Expression::StringLiteral {
            value: value.clone(),
        },
        ExprNode::Boolean { value, .. } => Expression::Boolean { value: *value },
        ExprNode::Group { inner, .. } => lower_expression(inner)?,
        ExprNode::Binary { left, op, right } => {
            let Some(op) = op else {
                return Err(BuildError::MalformedExpression {
                    position: node.span(),
                });
            };
            let left = Box::new(lower_expression(left)?);
            let right = Box::new(lower_expression(right)?);
            match binary_operator(op)? {
                Operator::Binary(op) => Expression::BinaryOp { op, left, right },
                Operator::Logical(op) => Expression::LogicalOp { op, left, right },
            }
        }
        ExprNode::Unary { op, operand } => Expression::UnaryOp {
            op: unary_operator(op)?,
            operand: Box::new(lower_expression(operand)?),
        },
        ExprNode::Call { callee, args } => Expression::Call {
            name: callee.text.clone(),
            args: lower_arguments(args)?,
        },
        ExprNode::Index { base, index } => match lvalue_chain(node)? {
            Some(lvalue) => Expression::LValue(lvalue),
            None => Expression::ArrayAccess {
                base: Box::new(lower_expression(base)?),
                index: Box::new(lower_expression(index)?),
            },
        },
        ExprNode::Field { base, field } => match lvalue_chain(node)? {
            Some(lvalue) => Expression::LValue(lvalue),
            None => Expression::FieldAccess {
                object: Box::new(lower_expression(base)?),
                field: field.text.clone(),
            },
        },
    };
    Ok(expr)
}

fn binary_operator(token: &OperatorToken) -> BuildResult<Operator> {
    let op = match token.lexeme.to_ascii_lowercase().as_str() {
        "+" => Operator::Binary(BinaryOperator::Add),
        "-" => Operator::Binary(BinaryOperator::Sub),
        "*" => Operator::Binary(BinaryOperator::Mul),
        "/" => Operator::Binary(BinaryOperator::Div),
        "div" => Operator::Binary(BinaryOperator::IntDiv),
        "mod" => Operator::Binary(BinaryOperator::Mod),
        "=" => Operator::Binary(BinaryOperator::Eq),
        "<>" | "!=" | "≠" => Operator::Binary(BinaryOperator::Ne),
        "<" => Operator::Binary(BinaryOperator::Lt),
        "<=" | "≤" => Operator::Binary(BinaryOperator::Le),
        ">" => Operator::Binary(BinaryOperator::Gt),
        ">=" | "≥" => Operator::Binary(BinaryOperator::Ge),
        "and" => Operator::Logical(LogicalOperator::And),
        "or" => Operator::Logical(LogicalOperator::Or),
        _ => return Err(unknown(token)),
    };
    Ok(op)
}

fn unary_operator(token: &OperatorToken) -> BuildResult<UnaryOperator> {
    let op = match token.lexeme.to_ascii_lowercase().as_str() {
        "-" => UnaryOperator::Negate,
        "not" => UnaryOperator::Not,
        "floor" => UnaryOperator::Floor,
        "ceil" => UnaryOperator::Ceil,
        _ => return Err(unknown(token)),
    };
    Ok(op)
}

fn unknown(token: &OperatorToken) -> BuildError {
    BuildError::UnknownOperator {
        lexeme: token.lexeme.clone(),
        position: token.span,
    }
}

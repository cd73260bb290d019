//! Variable facts accumulated while walking a procedure body in order.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::ast::{BinaryOperator, Expression, LValue, Procedure};
use crate::config::AnalyzerConfig;

/// Variables whose value comes from a multiplicative or divisive update,
/// directly or through another geometric variable. Membership only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometricVarSet {
    vars: FxHashSet<String>,
}

impl GeometricVarSet {
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.vars.insert(name.into())
    }

    /// Sorted names, for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.vars.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// True when assigning `value` to `target` makes `target` geometric.
    pub fn classifies(&self, target: &str, value: &Expression) -> bool {
        if is_multiplicative(value) || is_midpoint(value) {
            return true;
        }
        value
            .variables()
            .into_iter()
            .any(|name| name != target && self.contains(name))
    }

    pub fn read_by(&self, expr: &Expression) -> bool {
        expr.variables().into_iter().any(|name| self.contains(name))
    }
}

/// `*`, `/` or `div` at the top of the expression, looking through rounding.
pub fn is_multiplicative(expr: &Expression) -> bool {
    matches!(
        expr.without_rounding(),
        Expression::BinaryOp { op, .. } if op.is_multiplicative()
    )
}

/// `x / c` or `x div c` with a literal `c >= 2`, looking through rounding.
fn is_halving(expr: &Expression) -> bool {
    matches!(
        expr.without_rounding(),
        Expression::BinaryOp {
            op: BinaryOperator::Div | BinaryOperator::IntDiv,
            right,
            ..
        } if matches!(right.as_ref(), Expression::Number { value } if *value >= 2)
    )
}

/// `low + (high - low) div 2` and its variants: a sum or difference with a
/// halved operand.
fn is_midpoint(expr: &Expression) -> bool {
    match expr.without_rounding() {
        Expression::BinaryOp {
            op: BinaryOperator::Add | BinaryOperator::Sub,
            left,
            right,
        } => is_halving(left) || is_halving(right),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentEffect {
    pub geometric: bool,
    pub size_dependent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Dataflow {
    pub geometric: GeometricVarSet,
    pub size_vars: FxHashSet<String>,
    pub call_assigned: FxHashSet<String>,
}

impl Dataflow {
    pub fn seeded(procedure: &Procedure, config: &AnalyzerConfig) -> Self {
        let mut size_vars: FxHashSet<String> = config.size_symbols.iter().cloned().collect();
        if config.params_are_size {
            size_vars.extend(procedure.params.iter().map(|param| param.name.clone()));
        }
        Self {
            size_vars,
            ..Self::default()
        }
    }

    pub fn is_size_dependent(&self, expr: &Expression) -> bool {
        expr.variables()
            .into_iter()
            .any(|name| self.size_vars.contains(name))
    }

    pub fn mark_size_dependent(&mut self, name: &str) {
        self.size_vars.insert(name.to_string());
    }

    /// Folds one assignment into the facts. Element and field targets only
    /// count for their reads, never as variables.
    pub fn record_assignment(&mut self, target: &LValue, value: &Expression) -> AssignmentEffect {
        if !target.is_scalar() {
            return AssignmentEffect::default();
        }
        let name = target.name.as_str();
        let geometric = self.geometric.classifies(name, value);
        if geometric && self.geometric.insert(name) {
            trace!(variable = name, "geometric variable");
        }
        let size_dependent = self.is_size_dependent(value);
        if size_dependent {
            self.mark_size_dependent(name);
        }
        if matches!(value.without_rounding(), Expression::Call { .. }) {
            self.call_assigned.insert(name.to_string());
        }
        AssignmentEffect {
            geometric,
            size_dependent,
        }
    }
}

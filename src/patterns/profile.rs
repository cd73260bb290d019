use rustc_hash::FxHashSet;

use crate::ast::Expression;

use super::dataflow::GeometricVarSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    While,
    Repeat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopProfile {
    pub kind: LoopKind,
    pub control_var: Option<String>,
    /// `[start, end]` for counted loops, empty otherwise.
    pub bound_exprs: Vec<Expression>,
    pub step_expr: Option<Expression>,
    pub cond_expr: Option<Expression>,
    /// 1 for an outermost loop.
    pub nesting: usize,
    /// Index of the innermost enclosing loop in [`PatternProfile::loops`].
    pub parent: Option<usize>,
    pub size_dependent: bool,
    pub is_geometric: bool,
    pub is_harmonic: bool,
    /// Enclosing control variable read by the bounds, e.g. `j` in `FOR k := j TO n`.
    pub triangular_on: Option<String>,
    /// Enclosing control variable that sets the stride.
    pub harmonic_on: Option<String>,
}

impl LoopProfile {
    pub fn is_counted(&self) -> bool {
        self.kind == LoopKind::For
    }
}

/// One call of the procedure to itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RecursionProfile {
    pub args: Vec<Expression>,
    pub uses_geometric_arg: bool,
    pub in_loop: bool,
    /// Some enclosing conditional inspects array or field data, so an input
    /// exists on which the call is skipped.
    pub data_guarded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCall {
    pub name: String,
    pub in_loop: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternProfile {
    pub procedure: String,
    pub params: Vec<String>,
    pub loops: Vec<LoopProfile>,
    pub recursions: Vec<RecursionProfile>,
    pub external_calls: Vec<ExternalCall>,
    pub max_nesting: usize,
    pub geometric_vars: GeometricVarSet,
    pub call_assigned: FxHashSet<String>,
    /// Indices into `recursions` along the control path with the most self-calls.
    pub worst_path: Vec<usize>,
}

impl PatternProfile {
    pub fn is_recursive(&self) -> bool {
        !self.recursions.is_empty()
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|param| param == name)
    }

    /// Enclosing loops of `index`, innermost first.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = &LoopProfile> + '_ {
        std::iter::successors(self.loops[index].parent, |&parent| self.loops[parent].parent)
            .map(|parent| &self.loops[parent])
    }
}

//! Static pattern extraction over one procedure.
//!
//! A single depth-first walk records every loop and call together with the
//! variable facts in [`dataflow::Dataflow`]. Loop flags are settled when the
//! walk leaves the loop, so updates made anywhere in its body are visible.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::ast::{Access, BinaryOperator, Expression, Procedure, Statement};
use crate::config::AnalyzerConfig;

pub mod dataflow;
pub mod profile;

use dataflow::{Dataflow, is_multiplicative};
pub use dataflow::GeometricVarSet;
pub use profile::{ExternalCall, LoopKind, LoopProfile, PatternProfile, RecursionProfile};

pub fn extract(procedure: &Procedure) -> PatternProfile {
    extract_with(procedure, &AnalyzerConfig::default())
}

pub fn extract_with(procedure: &Procedure, config: &AnalyzerConfig) -> PatternProfile {
    let mut extractor = Extractor {
        name: &procedure.name,
        flow: Dataflow::seeded(procedure, config),
        loops: Vec::new(),
        recursions: Vec::new(),
        external_calls: Vec::new(),
        frames: Vec::new(),
        guards: Vec::new(),
    };
    let worst_path = extractor.walk_block(&procedure.body);

    let max_nesting = extractor
        .loops
        .iter()
        .map(|profile| profile.nesting)
        .max()
        .unwrap_or(0)
        .min(extractor.loops.len());
    let profile = PatternProfile {
        procedure: procedure.name.clone(),
        params: procedure.params.iter().map(|p| p.name.clone()).collect(),
        loops: extractor.loops,
        recursions: extractor.recursions,
        external_calls: extractor.external_calls,
        max_nesting,
        geometric_vars: extractor.flow.geometric,
        call_assigned: extractor.flow.call_assigned,
        worst_path,
    };
    debug!(
        procedure = %profile.procedure,
        loops = profile.loops.len(),
        recursions = profile.recursions.len(),
        max_nesting = profile.max_nesting,
        "extracted patterns"
    );
    profile
}

/// Bookkeeping for a loop whose body is being walked.
struct LoopFrame {
    index: usize,
    control_var: Option<String>,
    geometric_updates: FxHashSet<String>,
    /// `(v, w)` for every `v := v + w` in the body.
    additive_updates: Vec<(String, Expression)>,
}

struct Extractor<'p> {
    name: &'p str,
    flow: Dataflow,
    loops: Vec<LoopProfile>,
    recursions: Vec<RecursionProfile>,
    external_calls: Vec<ExternalCall>,
    frames: Vec<LoopFrame>,
    /// One entry per enclosing conditional: whether its condition reads data.
    guards: Vec<bool>,
}

impl Extractor<'_> {
    /// Walks a statement list and returns the recursion sites on its
    /// heaviest control path.
    fn walk_block(&mut self, statements: &[Statement]) -> Vec<usize> {
        let mut path = Vec::new();
        for statement in statements {
            path.extend(self.walk_statement(statement));
        }
        path
    }

    fn walk_statement(&mut self, statement: &Statement) -> Vec<usize> {
        match statement {
            Statement::Assign { target, value } => {
                let mut path = Vec::new();
                for access in &target.accesses {
                    if let Access::Index { index } = access {
                        path.extend(self.visit_calls(index));
                    }
                }
                path.extend(self.visit_calls(value));
                let effect = self.flow.record_assignment(target, value);
                if target.is_scalar() {
                    self.note_update(&target.name, value, effect.geometric);
                }
                path
            }
            Statement::If {
                cond,
                then_body,
                else_body,
            } => {
                let mut path = self.visit_calls(cond);
                self.guards.push(cond.reads_data());
                let then_path = self.walk_block(then_body);
                let else_path = self.walk_block(else_body);
                self.guards.pop();
                path.extend(if else_path.len() > then_path.len() {
                    else_path
                } else {
                    then_path
                });
                path
            }
            Statement::While { cond, body } => {
                self.walk_conditional_loop(LoopKind::While, cond, body)
            }
            Statement::Repeat { body, cond } => {
                self.walk_conditional_loop(LoopKind::Repeat, cond, body)
            }
            Statement::For {
                var,
                start,
                end,
                step,
                body,
            } => self.walk_for(var, start, end, step.as_ref(), body),
            Statement::Call { name, args } => {
                let mut path = Vec::new();
                for arg in args {
                    path.extend(self.visit_calls(arg));
                }
                path.extend(self.record_call(name, args));
                path
            }
            Statement::Return { value } => value
                .as_ref()
                .map(|value| self.visit_calls(value))
                .unwrap_or_default(),
        }
    }

    fn walk_for(
        &mut self,
        var: &str,
        start: &Expression,
        end: &Expression,
        step: Option<&Expression>,
        body: &[Statement],
    ) -> Vec<usize> {
        let mut path = self.visit_calls(start);
        path.extend(self.visit_calls(end));
        if let Some(step) = step {
            path.extend(self.visit_calls(step));
        }

        let size_dependent = [Some(start), Some(end), step]
            .into_iter()
            .flatten()
            .any(|expr| self.flow.is_size_dependent(expr));
        if size_dependent {
            self.flow.mark_size_dependent(var);
        }
        let triangular_on = self
            .enclosing_var(start)
            .or_else(|| self.enclosing_var(end));
        let harmonic_on = step.and_then(|step| self.enclosing_var(step));
        let geometric_step =
            step.is_some_and(|step| is_multiplicative(step) || self.flow.geometric.read_by(step));

        let index = self.open_loop(LoopProfile {
            kind: LoopKind::For,
            control_var: Some(var.to_string()),
            bound_exprs: vec![start.clone(), end.clone()],
            step_expr: step.cloned(),
            cond_expr: None,
            nesting: 0,
            parent: None,
            size_dependent,
            is_geometric: geometric_step,
            is_harmonic: harmonic_on.is_some(),
            triangular_on,
            harmonic_on,
        });
        path.extend(self.walk_block(body));
        let Some(frame) = self.frames.pop() else {
            return path;
        };

        if frame.geometric_updates.contains(var) {
            self.loops[index].is_geometric = true;
        }
        self.trace_loop(index);
        path
    }

    fn walk_conditional_loop(
        &mut self,
        kind: LoopKind,
        cond: &Expression,
        body: &[Statement],
    ) -> Vec<usize> {
        let index = self.open_loop(LoopProfile {
            kind,
            control_var: None,
            bound_exprs: Vec::new(),
            step_expr: None,
            cond_expr: Some(cond.clone()),
            nesting: 0,
            parent: None,
            size_dependent: false,
            is_geometric: false,
            is_harmonic: false,
            triangular_on: None,
            harmonic_on: None,
        });
        let mut path = Vec::new();
        if kind == LoopKind::While {
            path.extend(self.visit_calls(cond));
        }
        path.extend(self.walk_block(body));
        if kind == LoopKind::Repeat {
            path.extend(self.visit_calls(cond));
        }
        let Some(frame) = self.frames.pop() else {
            return path;
        };

        let cond_vars = cond.variables();
        let is_geometric = cond_vars
            .iter()
            .any(|name| frame.geometric_updates.contains(*name));
        let harmonic_on = frame
            .additive_updates
            .iter()
            .filter(|(name, _)| cond_vars.contains(&name.as_str()))
            .find_map(|(_, increment)| self.enclosing_var(increment));
        let size_dependent = self.flow.is_size_dependent(cond);

        let profile = &mut self.loops[index];
        profile.is_geometric = is_geometric;
        profile.is_harmonic = harmonic_on.is_some();
        profile.harmonic_on = harmonic_on;
        profile.size_dependent = size_dependent;
        self.trace_loop(index);
        path
    }

    fn open_loop(&mut self, mut profile: LoopProfile) -> usize {
        profile.nesting = self.frames.len() + 1;
        profile.parent = self.frames.last().map(|frame| frame.index);
        let index = self.loops.len();
        self.frames.push(LoopFrame {
            index,
            control_var: profile.control_var.clone(),
            geometric_updates: FxHashSet::default(),
            additive_updates: Vec::new(),
        });
        self.loops.push(profile);
        index
    }


    /// First control variable of an enclosing loop read by `expr`.
    fn enclosing_var(&self, expr: &Expression) -> Option<String> {
        let variables = expr.variables();
        self.frames
            .iter()
            .filter_map(|frame| frame.control_var.as_deref())
            .find(|var| variables.contains(var))
            .map(str::to_string)
    }

    /// Records an update of `name` in every enclosing loop.
    fn note_update(&mut self, name: &str, value: &Expression, geometric: bool) {
        let increment = match value {
            Expression::BinaryOp {
                op: BinaryOperator::Add,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expression::Identifier { name: var }, other)
                | (other, Expression::Identifier { name: var })
                    if var == name =>
                {
                    Some(other.clone())
                }
                _ => None,
            },
            _ => None,
        };
        for frame in &mut self.frames {
            if geometric {
                frame.geometric_updates.insert(name.to_string());
            }
            if let Some(increment) = &increment {
                frame
                    .additive_updates
                    .push((name.to_string(), increment.clone()));
            }
        }
    }

    /// Records every call inside `expr`; returns the self-call sites.
    fn visit_calls(&mut self, expr: &Expression) -> Vec<usize> {
        let mut calls = Vec::new();
        expr.visit(&mut |node| {
            if let Expression::Call { name, args } = node {
                calls.push((name, args));
            }
        });
        calls
            .into_iter()
            .filter_map(|(name, args)| self.record_call(name, args))
            .collect()
    }

    fn record_call(&mut self, name: &str, args: &[Expression]) -> Option<usize> {
        let in_loop = !self.frames.is_empty();
        if name != self.name {
            self.external_calls.push(ExternalCall {
                name: name.to_string(),
                in_loop,
            });
            return None;
        }
        let uses_geometric_arg = args
            .iter()
            .any(|arg| is_multiplicative(arg) || self.flow.geometric.read_by(arg));
        let data_guarded = self.guards.iter().any(|&guard| guard);
        trace!(
            procedure = self.name,
            args = args.len(),
            in_loop,
            uses_geometric_arg,
            data_guarded,
            "recursion site"
        );
        self.recursions.push(RecursionProfile {
            args: args.to_vec(),
            uses_geometric_arg,
            in_loop,
            data_guarded,
        });
        Some(self.recursions.len() - 1)
    }

    fn trace_loop(&self, index: usize) {
        let profile = &self.loops[index];
        trace!(
            kind = ?profile.kind,
            nesting = profile.nesting,
            size_dependent = profile.size_dependent,
            geometric = profile.is_geometric,
            harmonic = profile.is_harmonic,
            "loop"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::lower;
    use crate::parser::parse;
    use indoc::indoc;

    fn profile(source: &str) -> PatternProfile {
        let tree = parse(source).expect("parse failed");
        let program = lower(&tree).expect("lowering failed");
        extract(&program.procedures[0])
    }

    #[test]
    fn records_nesting_and_parents() {
        let profile = profile(indoc! {"
            PROCEDURE Sum(A, n)
            BEGIN
                FOR i := 1 TO n DO
                    IF A[i] > 0 THEN
                        FOR j := 1 TO n DO
                            s := s + A[j];
                        END
                    END
                END
                WHILE n > 0 DO
                    n := n - 1;
                END
            END
        "});
        let nesting: Vec<usize> = profile.loops.iter().map(|l| l.nesting).collect();
        assert_eq!(nesting, vec![1, 2, 1]);
        assert_eq!(profile.loops[1].parent, Some(0));
        assert_eq!(profile.loops[2].parent, None);
        assert_eq!(profile.max_nesting, 2);
        assert!(profile.loops.iter().all(|l| l.size_dependent));
    }

    #[test]
    fn while_loop_over_halving_variable_is_geometric() {
        let profile = profile(indoc! {"
            PROCEDURE BinarySearch(A, n, x)
            BEGIN
                low := 1;
                high := n;
                WHILE low <= high DO
                    mid := (low + high) div 2;
                    IF A[mid] = x THEN
                        RETURN mid;
                    ELSE
                        IF A[mid] < x THEN
                            low := mid + 1;
                        ELSE
                            high := mid - 1;
                        END
                    END
                END
                RETURN 0;
            END
        "});
        assert_eq!(profile.loops.len(), 1);
        assert!(profile.loops[0].is_geometric);
        assert!(profile.loops[0].size_dependent);
        assert_eq!(profile.geometric_vars.names(), vec!["high", "low", "mid"]);
    }

    #[test]
    fn counter_decrement_is_not_geometric() {
        let profile = profile(indoc! {"
            PROCEDURE InsertionSort(A, n)
            BEGIN
                FOR j := 2 TO n DO
                    key := A[j];
                    i := j - 1;
                    WHILE i > 0 and A[i] > key DO
                        A[i + 1] := A[i];
                        i := i - 1;
                    END
                    A[i + 1] := key;
                END
            END
        "});
        assert!(profile.loops.iter().all(|l| !l.is_geometric));
        assert!(profile.loops[1].size_dependent);
        assert_eq!(profile.loops[1].kind, LoopKind::While);
    }

    #[test]
    fn detects_triangular_and_harmonic_loops() {
        let profile = profile(indoc! {"
            PROCEDURE Pairs(n)
            BEGIN
                FOR i := 1 TO n DO
                    FOR j := i TO n DO
                        c := c + 1;
                    END
                    FOR k := 1 TO n STEP i DO
                        c := c + 1;
                    END
                    m := 1;
                    WHILE m <= n DO
                        m := m + i;
                    END
                END
            END
        "});
        assert_eq!(profile.loops[1].triangular_on.as_deref(), Some("i"));
        assert!(!profile.loops[1].is_harmonic);
        assert_eq!(profile.loops[2].harmonic_on.as_deref(), Some("i"));
        assert!(profile.loops[3].is_harmonic);
    }

    #[test]
    fn doubling_control_variable_makes_loop_geometric() {
        let profile = profile(indoc! {"
            PROCEDURE Doubling(n)
            BEGIN
                i := 1;
                REPEAT
                    i := i * 2;
                UNTIL i >= n
            END
        "});
        assert_eq!(profile.loops[0].kind, LoopKind::Repeat);
        assert!(profile.loops[0].is_geometric);
    }

    #[test]
    fn records_recursion_sites_and_heaviest_path() {
        let profile = profile(indoc! {"
            PROCEDURE Fib(n)
            BEGIN
                IF n <= 1 THEN
                    RETURN n;
                ELSE
                    RETURN Fib(n - 1) + Fib(n - 2);
                END
            END
        "});
        assert_eq!(profile.recursions.len(), 2);
        assert_eq!(profile.worst_path, vec![0, 1]);
        assert!(profile.recursions.iter().all(|r| !r.in_loop && !r.data_guarded));
    }

    #[test]
    fn alternative_branches_do_not_accumulate() {
        let profile = profile(indoc! {"
            PROCEDURE Search(A, low, high, x)
            BEGIN
                mid := (low + high) div 2;
                IF A[mid] < x THEN
                    RETURN Search(A, mid + 1, high, x);
                ELSE
                    RETURN Search(A, low, mid - 1, x);
                END
            END
        "});
        assert_eq!(profile.recursions.len(), 2);
        assert_eq!(profile.worst_path.len(), 1);
        assert!(profile.recursions.iter().all(|r| r.uses_geometric_arg));
        assert!(profile.recursions.iter().all(|r| r.data_guarded));
    }

    #[test]
    fn separates_external_calls_and_pivots() {
        let profile = profile(indoc! {"
            PROCEDURE QuickSort(A, p, r)
            BEGIN
                IF p < r THEN
                    q := Partition(A, p, r);
                    CALL QuickSort(A, p, q - 1);
                    CALL QuickSort(A, q + 1, r);
                END
            END
        "});
        assert_eq!(profile.external_calls.len(), 1);
        assert_eq!(profile.external_calls[0].name, "Partition");
        assert!(profile.call_assigned.contains("q"));
        assert_eq!(profile.worst_path, vec![0, 1]);
    }

    #[test]
    fn calls_inside_loops_are_flagged() {
        let profile = profile(indoc! {"
            PROCEDURE Permute(A, k, n)
            BEGIN
                FOR i := k TO n DO
                    CALL Permute(A, k + 1, n);
                END
            END
        "});
        assert!(profile.recursions[0].in_loop);
    }
}

use crate::patterns::{LoopKind, LoopProfile, PatternProfile};

use super::growth::{Bound, Growth};
use super::ComplexityResult;

/// Cost of the loops in a body: the heaviest loop chain for the worst case
/// and the heaviest chain of counted loops for the best case.
pub(super) struct LoopCost {
    pub worst: Growth,
    pub best: Growth,
    pub reasoning: Vec<String>,
}

fn factor(profile: &LoopProfile) -> Growth {
    if !profile.size_dependent {
        Growth::CONSTANT
    } else if profile.is_geometric || profile.is_harmonic {
        Growth::LOG
    } else {
        Growth::LINEAR
    }
}

fn describe(index: usize, profile: &LoopProfile) -> String {
    let header = match (profile.kind, profile.control_var.as_deref()) {
        (LoopKind::For, Some(var)) => format!("FOR {var}"),
        (LoopKind::For, None) => "FOR".to_string(),
        (LoopKind::While, _) => "WHILE".to_string(),
        (LoopKind::Repeat, _) => "REPEAT".to_string(),
    };
    let detail = if !profile.size_dependent {
        "bounds do not depend on the input size, contributes 1".to_string()
    } else if profile.is_geometric {
        "variable scaled geometrically each pass, contributes log n".to_string()
    } else if let Some(outer) = profile.harmonic_on.as_deref() {
        format!("stride grows with enclosing `{outer}`, harmonic series Σ n/{outer} = n·H(n), contributes log n")
    } else if let Some(outer) = profile.triangular_on.as_deref() {
        format!(
            "bounds depend on enclosing `{outer}`, arithmetic series Σ{outer} = n(n+1)/2 keeps the order, contributes n"
        )
    } else {
        "runs a number of iterations proportional to n, contributes n".to_string()
    };
    format!(
        "loop #{} ({header}, depth {}): {detail}",
        index + 1,
        profile.nesting
    )
}

/// Reasoning line for calls to other procedures, whose bodies are not
/// followed.
pub(super) fn external_call_note(profile: &PatternProfile) -> Option<String> {
    let mut names: Vec<&str> = profile
        .external_calls
        .iter()
        .map(|call| call.name.as_str())
        .collect();
    names.sort_unstable();
    names.dedup();
    if names.is_empty() {
        return None;
    }
    Some(format!(
        "calls to {} are not analyzed here and are assumed O(1)",
        names.join(", ")
    ))
}

/// Product of the factors from `index` up to its outermost enclosing loop.
fn chain_product(profile: &PatternProfile, index: usize) -> Growth {
    profile
        .ancestors(index)
        .fold(factor(&profile.loops[index]), |acc, outer| {
            acc.times(factor(outer))
        })
}

pub(super) fn loop_cost(profile: &PatternProfile) -> LoopCost {
    let mut reasoning: Vec<String> = profile
        .loops
        .iter()
        .enumerate()
        .map(|(index, loop_profile)| describe(index, loop_profile))
        .collect();
    reasoning.extend(external_call_note(profile));

    let worst = (0..profile.loops.len())
        .map(|index| chain_product(profile, index))
        .fold(Growth::CONSTANT, Growth::max);
    let best = (0..profile.loops.len())
        .filter(|&index| {
            profile.loops[index].is_counted()
                && profile.ancestors(index).all(LoopProfile::is_counted)
        })
        .map(|index| chain_product(profile, index))
        .fold(Growth::CONSTANT, Growth::max);

    if !profile.loops.is_empty() {
        reasoning.push(format!(
            "heaviest loop chain (max nesting {}) multiplies to {worst}",
            profile.max_nesting
        ));
    }
    LoopCost {
        worst,
        best,
        reasoning,
    }
}

pub(super) fn classify(profile: &PatternProfile) -> ComplexityResult {
    let cost = loop_cost(profile);
    let mut reasoning = vec![format!(
        "iterative procedure with {} loop(s), no self-recursion",
        profile.loops.len()
    )];
    reasoning.extend(cost.reasoning);

    if cost.worst.is_constant() {
        reasoning.push("no loop depends on the input size: constant time".to_string());
        return ComplexityResult::exact(Growth::CONSTANT, None, reasoning);
    }

    reasoning.push(format!("worst case: Θ({})", cost.worst));
    if cost.best.is_constant() {
        reasoning.push(
            "best case: conditional loops may stop after one test, Ω(1)".to_string(),
        );
    } else {
        reasoning.push(format!(
            "best case: counted FOR loops always run in full, Ω({})",
            cost.best
        ));
    }
    reasoning.push("average case taken equal to the worst case".to_string());

    ComplexityResult::new(
        Bound::theta(cost.worst),
        Bound::omega(cost.best),
        Bound::theta(cost.worst),
        None,
        reasoning,
    )
}

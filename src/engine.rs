//! Complexity inference over a [`PatternProfile`].
//!
//! Recursive procedures are classified from their call-argument shapes
//! (Master theorem, characteristic equations); iterative ones from the
//! products of loop factors along each nesting chain. Shapes that match no
//! rule come back as `Θ(?)` with a reasoning note rather than an error.

use serde::Serialize;
use tracing::debug;

use crate::patterns::PatternProfile;

pub mod growth;
mod iterative;
mod recurrence;

pub use growth::{Base, Bound, Degree, Growth, Notation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityResult {
    pub worst_case: Bound,
    pub best_case: Bound,
    pub average_case: Bound,
    pub recurrence: Option<String>,
    pub bound_certificate: String,
    pub reasoning: Vec<String>,
}

impl ComplexityResult {
    pub fn new(
        worst_case: Bound,
        best_case: Bound,
        average_case: Bound,
        recurrence: Option<String>,
        reasoning: Vec<String>,
    ) -> Self {
        let tight = [worst_case, average_case]
            .into_iter()
            .find(|bound| bound.notation == Notation::Theta)
            .unwrap_or(worst_case);
        Self {
            worst_case,
            best_case,
            average_case,
            recurrence,
            bound_certificate: tight.certificate(),
            reasoning,
        }
    }

    /// Same class in all three cases: Θ for worst and average, Ω for best.
    pub fn exact(growth: Growth, recurrence: Option<String>, reasoning: Vec<String>) -> Self {
        Self::new(
            Bound::theta(growth),
            Bound::omega(growth),
            Bound::theta(growth),
            recurrence,
            reasoning,
        )
    }

    /// Analyzed, but no rule matched.
    pub fn is_unknown(&self) -> bool {
        self.worst_case.growth.is_unknown()
    }
}

pub fn infer(profile: &PatternProfile) -> ComplexityResult {
    let result = if profile.is_recursive() {
        recurrence::classify(profile)
    } else if !profile.loops.is_empty() {
        iterative::classify(profile)
    } else {
        let mut reasoning =
            vec!["no loops and no self-recursion: every statement runs at most once".to_string()];
        reasoning.extend(iterative::external_call_note(profile));
        ComplexityResult::exact(Growth::CONSTANT, None, reasoning)
    };
    debug!(
        procedure = %profile.procedure,
        worst = %result.worst_case,
        best = %result.best_case,
        average = %result.average_case,
        "inferred complexity"
    );
    result
}

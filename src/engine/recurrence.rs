//! Classification of self-recursive procedures from the shape of the
//! arguments on the heaviest call path.

use tracing::trace;

use crate::ast::{BinaryOperator, Expression};
use crate::patterns::{PatternProfile, RecursionProfile};

use super::growth::{Base, Bound, Degree, Growth};
use super::iterative::loop_cost;
use super::ComplexityResult;

const UNRECOGNIZED: &str = "recursion pattern not recognized";

#[derive(Debug, Clone, PartialEq)]
enum ArgShape {
    /// Problem divided by `b`.
    Halving { b: u32 },
    /// `q ± c` around a local pivot `q`, returned by a call or computed by
    /// an inline partition pass.
    PivotOffset {
        pivot: String,
        offset: i64,
        from_call: bool,
    },
    /// Parameter moved by a constant `c`.
    Reduction { c: u32 },
    Unrecognized,
}

fn literal_divisor(arg: &Expression) -> Option<u32> {
    match arg.without_rounding() {
        Expression::BinaryOp {
            op: BinaryOperator::Div | BinaryOperator::IntDiv,
            right,
            ..
        } => match right.as_ref() {
            Expression::Number { value } if *value >= 2 => u32::try_from(*value).ok(),
            _ => None,
        },
        _ => None,
    }
}

/// `(name, ±c)` for an argument of the form `name + c` or `name - c`.
fn offset_of(arg: &Expression) -> Option<(&str, i64)> {
    let Expression::BinaryOp { op, left, right } = arg else {
        return None;
    };
    let sign = match op {
        BinaryOperator::Add => 1,
        BinaryOperator::Sub => -1,
        _ => return None,
    };
    match (left.as_ref(), right.as_ref()) {
        (Expression::Identifier { name }, Expression::Number { value }) if *value != 0 => {
            Some((name.as_str(), sign * value))
        }
        (Expression::Number { value }, Expression::Identifier { name })
            if sign == 1 && *value != 0 =>
        {
            Some((name.as_str(), *value))
        }
        _ => None,
    }
}

/// Shape of one call site. Halving wins over a call-returned pivot, which wins
/// over a parameter reduction; any other local offset is taken as a pivot.
fn shape_of(site: &RecursionProfile, profile: &PatternProfile) -> ArgShape {
    if let Some(b) = site.args.iter().find_map(literal_divisor) {
        return ArgShape::Halving { b };
    }
    if site.uses_geometric_arg {
        return ArgShape::Halving { b: 2 };
    }
    let offsets: Vec<(&str, i64)> = site.args.iter().filter_map(offset_of).collect();
    if let Some((pivot, offset)) = offsets
        .iter()
        .find(|(name, _)| profile.call_assigned.contains(*name))
    {
        return ArgShape::PivotOffset {
            pivot: pivot.to_string(),
            offset: *offset,
            from_call: true,
        };
    }
    if let Some((_, offset)) = offsets.iter().find(|(name, _)| profile.is_param(name)) {
        if let Ok(c) = u32::try_from(offset.unsigned_abs()) {
            return ArgShape::Reduction { c };
        }
    }
    if let Some((pivot, offset)) = offsets.iter().find(|(name, _)| !profile.is_param(name)) {
        return ArgShape::PivotOffset {
            pivot: pivot.to_string(),
            offset: *offset,
            from_call: false,
        };
    }
    ArgShape::Unrecognized
}

fn unrecognized(mut reasoning: Vec<String>, detail: &str) -> ComplexityResult {
    reasoning.push(format!("{UNRECOGNIZED}: {detail}"));
    let unknown = Bound::unknown();
    ComplexityResult::new(unknown, unknown, unknown, None, reasoning)
}

fn cost_term(growth: Growth) -> String {
    if growth.is_constant() {
        "O(1)".to_string()
    } else {
        format!("Θ({growth})")
    }
}

fn calls_term(a: usize, argument: &str) -> String {
    if a == 1 {
        format!("T({argument})")
    } else {
        format!("{a}T({argument})")
    }
}

/// `2T(n-1) + T(n-2)`: equal reductions are grouped, in order of first use.
fn reduction_terms(reductions: &[u32]) -> String {
    let mut groups: Vec<(u32, usize)> = Vec::new();
    for &c in reductions {
        match groups.iter_mut().find(|(seen, _)| *seen == c) {
            Some((_, count)) => *count += 1,
            None => groups.push((c, 1)),
        }
    }
    groups
        .iter()
        .map(|&(c, count)| calls_term(count, &format!("n-{c}")))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// T(n) = aT(n/b) + n^d log^k n.
fn master(a: u32, b: u32, f: Growth) -> Option<(Growth, &'static str)> {
    let Growth::Poly {
        degree: Degree::Whole(d),
        log: k,
    } = f
    else {
        return None;
    };
    let critical = b.checked_pow(d).map(u64::from).unwrap_or(u64::MAX);
    let a_wide = u64::from(a);
    let result = match a_wide.cmp(&critical) {
        std::cmp::Ordering::Less => (f, "case 3, f(n) dominates"),
        std::cmp::Ordering::Equal => (Growth::poly(d, k + 1), "case 2, balanced levels"),
        std::cmp::Ordering::Greater => {
            let degree = (1..=32)
                .find(|&e| b.checked_pow(e) == Some(a))
                .map(Degree::Whole)
                .unwrap_or(Degree::LogOf { base: b, arg: a });
            (Growth::Poly { degree, log: 0 }, "case 1, leaves dominate")
        }
    };
    Some(result)
}

/// Dominant root of r^m − Σ r^(m − c_i) = 0, found by bisection on [1, a].
fn dominant_root(reductions: &[u32]) -> f64 {
    let m = reductions.iter().copied().max().unwrap_or(1) as i32;
    let poly = |r: f64| {
        r.powi(m)
            - reductions
                .iter()
                .map(|&c| r.powi(m - c as i32))
                .sum::<f64>()
    };
    let (mut low, mut high) = (1.0_f64, reductions.len().max(1) as f64);
    for _ in 0..200 {
        let mid = (low + high) / 2.0;
        if poly(mid) < 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

pub(super) fn classify(profile: &PatternProfile) -> ComplexityResult {
    let cost = loop_cost(profile);
    let mut reasoning = vec![format!(
        "{} self-call site(s) in {}",
        profile.recursions.len(),
        profile.procedure
    )];
    reasoning.extend(cost.reasoning);

    if profile.recursions.iter().any(|site| site.in_loop) {
        return unrecognized(
            reasoning,
            "a self-call inside a loop makes the branching factor grow with the input",
        );
    }

    let path: Vec<&RecursionProfile> = profile
        .worst_path
        .iter()
        .filter_map(|&index| profile.recursions.get(index))
        .collect();
    if path.is_empty() {
        return unrecognized(reasoning, "no self-call lies on an executable path");
    }
    let a = path.len();
    let shapes: Vec<ArgShape> = path.iter().map(|site| shape_of(site, profile)).collect();
    trace!(procedure = %profile.procedure, a, ?shapes, "recursion shapes");
    reasoning.push(format!("heaviest control path makes a = {a} self-call(s)"));

    if let [
        ArgShape::PivotOffset {
            pivot: left,
            offset: o1,
            from_call,
        },
        ArgShape::PivotOffset {
            pivot: right,
            offset: o2,
            ..
        },
    ] = shapes.as_slice()
    {
        if left == right && o1.signum() != o2.signum() {
            return pivot_split(left, *from_call, cost.worst, reasoning);
        }
    }

    if let Some(ArgShape::Halving { b }) = shapes.first() {
        if shapes
            .iter()
            .all(|shape| matches!(shape, ArgShape::Halving { .. }))
        {
            return divide_and_conquer(a, *b, cost.worst, reasoning);
        }
    }

    let reductions: Vec<u32> = shapes
        .iter()
        .filter_map(|shape| match shape {
            ArgShape::Reduction { c } => Some(*c),
            _ => None,
        })
        .collect();
    if reductions.len() == shapes.len() {
        let guarded = profile.recursions.iter().all(|site| site.data_guarded);
        return constant_reduction(&reductions, cost.worst, guarded, reasoning);
    }

    unrecognized(reasoning, "arguments are neither halved nor reduced by a constant")
}

fn pivot_split(
    pivot: &str,
    from_call: bool,
    f: Growth,
    mut reasoning: Vec<String>,
) -> ComplexityResult {
    let origin = if from_call {
        "returned by a call"
    } else {
        "computed by the partition pass"
    };
    reasoning.push(format!(
        "partition split around pivot `{pivot}` {origin}: subproblems of sizes k and n-k-1"
    ));
    let per_level = if from_call {
        f.max(Growth::LINEAR)
    } else {
        f
    };
    if per_level != f {
        reasoning.push(
            "the call producing the pivot scans its range: per-level cost taken as Θ(n) rather than O(1)"
                .to_string(),
        );
    }
    let worst = Growth::LINEAR.times(per_level);
    let Some((balanced, case)) = master(2, 2, per_level) else {
        return unrecognized(reasoning, "per-level cost is not polynomial");
    };
    reasoning.push(format!(
        "worst case: pivot at an end of the range, T(n) = T(n-1) + {} = O({worst})",
        cost_term(per_level)
    ));
    reasoning.push(format!(
        "average and best case: balanced split, T(n) = 2T(n/2) + {}, Master theorem {case} = Θ({balanced})",
        cost_term(per_level)
    ));
    ComplexityResult::new(
        Bound::big_o(worst),
        Bound::omega(balanced),
        Bound::theta(balanced),
        Some(format!("T(n) = T(k) + T(n-k-1) + {}", cost_term(per_level))),
        reasoning,
    )
}

fn divide_and_conquer(a: usize, b: u32, f: Growth, mut reasoning: Vec<String>) -> ComplexityResult {
    let recurrence = format!("T(n) = {} + {}", calls_term(a, &format!("n/{b}")), cost_term(f));
    let a_narrow = u32::try_from(a).unwrap_or(u32::MAX);
    let Some((growth, case)) = master(a_narrow, b, f) else {
        return unrecognized(reasoning, "per-level cost is not polynomial");
    };
    reasoning.push(format!(
        "divide-and-conquer, Master theorem {case}: a = {a}, b = {b}, f(n) = {}",
        cost_term(f)
    ));
    let best = if f.is_constant() {
        reasoning.push("best case: the base case can be reached immediately, Ω(1)".to_string());
        Growth::CONSTANT
    } else {
        reasoning.push("best case: every level still pays the loop cost".to_string());
        growth
    };
    ComplexityResult::new(
        Bound::theta(growth),
        Bound::omega(best),
        Bound::theta(growth),
        Some(recurrence),
        reasoning,
    )
}

fn constant_reduction(
    reductions: &[u32],
    f: Growth,
    guarded: bool,
    mut reasoning: Vec<String>,
) -> ComplexityResult {
    if let [c] = reductions {
        let growth = Growth::LINEAR.times(f);
        reasoning.push(format!(
            "linear recursion: depth n/{c} with {} work per level gives Θ({growth})",
            cost_term(f)
        ));
        let best = if guarded {
            reasoning.push(
                "best case: a data test can stop the recursion at the first level, Ω(1)"
                    .to_string(),
            );
            Growth::CONSTANT
        } else {
            growth
        };
        return ComplexityResult::new(
            Bound::theta(growth),
            Bound::omega(best),
            Bound::theta(growth),
            Some(format!("T(n) = T(n-{c}) + {}", cost_term(f))),
            reasoning,
        );
    }

    let recurrence = format!("T(n) = {} + {}", reduction_terms(reductions), cost_term(f));
    let mut sorted = reductions.to_vec();
    sorted.sort_unstable();
    let base = if sorted.iter().all(|&c| c == 1) {
        reasoning.push(format!(
            "branching recursion: {} calls reducing by 1, characteristic root r = {}",
            sorted.len(),
            sorted.len()
        ));
        Base::Integer(u32::try_from(sorted.len()).unwrap_or(u32::MAX))
    } else if sorted == [1, 2] {
        reasoning.push(
            "homogeneous linear recurrence of order 2, characteristic equation r² - r - 1 = 0"
                .to_string(),
        );
        reasoning.push("dominant root φ = (1 + √5) / 2 ≈ 1.618".to_string());
        Base::Golden
    } else {
        let root = dominant_root(&sorted);
        reasoning.push(format!(
            "characteristic equation r^m - Σ r^(m-c) = 0 with c = {sorted:?}, dominant root r ≈ {root:.3}"
        ));
        Base::Real(root)
    };
    let growth = Growth::Exponential(base);
    reasoning.push("best case: the base case can be reached immediately, Ω(1)".to_string());
    ComplexityResult::new(
        Bound::theta(growth),
        Bound::omega(Growth::CONSTANT),
        Bound::theta(growth),
        Some(recurrence),
        reasoning,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_theorem_cases() {
        assert_eq!(master(1, 2, Growth::CONSTANT).map(|r| r.0), Some(Growth::LOG));
        assert_eq!(master(2, 2, Growth::LINEAR).map(|r| r.0), Some(Growth::poly(1, 1)));
        assert_eq!(master(2, 2, Growth::poly(2, 0)).map(|r| r.0), Some(Growth::poly(2, 0)));
        assert_eq!(master(4, 2, Growth::LINEAR).map(|r| r.0), Some(Growth::poly(2, 0)));
        assert_eq!(
            master(3, 2, Growth::CONSTANT).map(|r| r.0),
            Some(Growth::Poly {
                degree: Degree::LogOf { base: 2, arg: 3 },
                log: 0
            })
        );
        assert_eq!(master(2, 2, Growth::Unknown), None);
    }

    #[test]
    fn bisection_finds_tribonacci_root() {
        let root = dominant_root(&[1, 2, 3]);
        assert!((root - 1.839_286).abs() < 1e-4, "{root}");
        let golden = dominant_root(&[1, 2]);
        assert!((golden - Base::Golden.value()).abs() < 1e-9);
    }

    #[test]
    fn equal_reductions_are_grouped() {
        assert_eq!(reduction_terms(&[1, 1]), "2T(n-1)");
        assert_eq!(reduction_terms(&[1, 2]), "T(n-1) + T(n-2)");
        assert_eq!(reduction_terms(&[2, 1, 2]), "2T(n-2) + T(n-1)");
    }

    #[test]
    fn classifies_argument_shapes() {
        let half = Expression::binary(
            BinaryOperator::IntDiv,
            Expression::identifier("n"),
            Expression::number(3),
        );
        assert_eq!(literal_divisor(&half), Some(3));
        let minus = Expression::binary(
            BinaryOperator::Sub,
            Expression::identifier("n"),
            Expression::number(2),
        );
        assert_eq!(offset_of(&minus), Some(("n", -2)));
        let plus = Expression::binary(
            BinaryOperator::Add,
            Expression::number(1),
            Expression::identifier("i"),
        );
        assert_eq!(offset_of(&plus), Some(("i", 1)));
        assert_eq!(offset_of(&Expression::identifier("n")), None);
    }
}

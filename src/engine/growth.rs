//! Typed growth classes and their canonical rendering.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// Exponent of `n` in a polynomial-logarithmic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Whole(u32),
    /// `log_base(arg)`, kept symbolic when it is not a whole number.
    LogOf { base: u32, arg: u32 },
}

impl Degree {
    pub fn value(self) -> f64 {
        match self {
            Degree::Whole(d) => f64::from(d),
            Degree::LogOf { base, arg } => f64::from(arg).ln() / f64::from(base).ln(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Base {
    Integer(u32),
    /// The golden ratio φ = (1 + √5) / 2.
    Golden,
    Real(f64),
}

impl Base {
    pub fn value(self) -> f64 {
        match self {
            Base::Integer(b) => f64::from(b),
            Base::Golden => (1.0 + 5f64.sqrt()) / 2.0,
            Base::Real(r) => r,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    /// `n^degree · log^log n`
    Poly { degree: Degree, log: u32 },
    Exponential(Base),
    Unknown,
}

impl Growth {
    pub const CONSTANT: Growth = Growth::poly(0, 0);
    pub const LOG: Growth = Growth::poly(0, 1);
    pub const LINEAR: Growth = Growth::poly(1, 0);

    pub const fn poly(degree: u32, log: u32) -> Self {
        Growth::Poly {
            degree: Degree::Whole(degree),
            log,
        }
    }

    pub fn is_constant(&self) -> bool {
        *self == Growth::CONSTANT
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Growth::Unknown)
    }

    /// Product of two classes; only whole polynomial-logarithmic factors combine.
    pub fn times(self, other: Growth) -> Growth {
        match (self, other) {
            (
                Growth::Poly {
                    degree: Degree::Whole(d1),
                    log: k1,
                },
                Growth::Poly {
                    degree: Degree::Whole(d2),
                    log: k2,
                },
            ) => Growth::poly(d1 + d2, k1 + k2),
            (growth, unit) | (unit, growth) if unit.is_constant() => growth,
            _ => Growth::Unknown,
        }
    }

    /// Orders known classes by asymptotic growth; `None` if either is unknown.
    pub fn compare(&self, other: &Growth) -> Option<Ordering> {
        fn key(growth: &Growth) -> Option<(u8, f64, u32)> {
            match growth {
                Growth::Poly { degree, log } => Some((0, degree.value(), *log)),
                Growth::Exponential(base) => Some((1, base.value(), 0)),
                Growth::Unknown => None,
            }
        }
        let (a, b) = (key(self)?, key(other)?);
        a.partial_cmp(&b)
    }

    pub fn max(self, other: Growth) -> Growth {
        match self.compare(&other) {
            Some(Ordering::Less) => other,
            Some(_) => self,
            None => Growth::Unknown,
        }
    }
}

const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
const SUBSCRIPTS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];

fn digits(value: u32, table: &[char; 10]) -> String {
    value
        .to_string()
        .bytes()
        .map(|digit| table[usize::from(digit - b'0')])
        .collect()
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Growth::Poly { degree, log } => {
                let mut parts = Vec::new();
                match degree {
                    Degree::Whole(0) => {}
                    Degree::Whole(1) => parts.push("n".to_string()),
                    Degree::Whole(d) => parts.push(format!("n{}", digits(*d, &SUPERSCRIPTS))),
                    Degree::LogOf { base, arg } => {
                        parts.push(format!("n^(log{}{arg})", digits(*base, &SUBSCRIPTS)))
                    }
                }
                match log {
                    0 => {}
                    1 => parts.push("log n".to_string()),
                    k => parts.push(format!("log{} n", digits(*k, &SUPERSCRIPTS))),
                }
                if parts.is_empty() {
                    write!(f, "1")
                } else {
                    write!(f, "{}", parts.join(" "))
                }
            }
            Growth::Exponential(Base::Integer(b)) => write!(f, "{b}ⁿ"),
            Growth::Exponential(Base::Golden) => write!(f, "φⁿ"),
            Growth::Exponential(Base::Real(r)) => write!(f, "{r:.3}ⁿ"),
            Growth::Unknown => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// Tight bound.
    Theta,
    /// Upper bound.
    BigO,
    /// Lower bound.
    Omega,
}

impl Notation {
    pub fn symbol(self) -> &'static str {
        match self {
            Notation::Theta => "Θ",
            Notation::BigO => "O",
            Notation::Omega => "Ω",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub notation: Notation,
    pub growth: Growth,
}

impl Bound {
    pub fn theta(growth: Growth) -> Self {
        Self {
            notation: Notation::Theta,
            growth,
        }
    }

    pub fn big_o(growth: Growth) -> Self {
        Self {
            notation: Notation::BigO,
            growth,
        }
    }

    pub fn omega(growth: Growth) -> Self {
        Self {
            notation: Notation::Omega,
            growth,
        }
    }

    /// Unknown classes are always reported as `Θ(?)`.
    pub fn unknown() -> Self {
        Self::theta(Growth::Unknown)
    }

    /// The (c1, c2, n0) witness statement for this bound.
    pub fn certificate(&self) -> String {
        if self.growth.is_unknown() {
            return "no bound established".to_string();
        }
        let term = |constant: &str| {
            if self.growth.is_constant() {
                constant.to_string()
            } else {
                format!("{constant}·{}", self.growth)
            }
        };
        match self.notation {
            Notation::Theta => format!(
                "{} ≤ T(n) ≤ {} for all n ≥ n0",
                term("c1"),
                term("c2")
            ),
            Notation::BigO => format!("T(n) ≤ {} for all n ≥ n0", term("c2")),
            Notation::Omega => format!("T(n) ≥ {} for all n ≥ n0", term("c1")),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.notation.symbol(), self.growth)
    }
}

impl Serialize for Bound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_canonical_strings() {
        let cases = [
            (Growth::CONSTANT, "1"),
            (Growth::LOG, "log n"),
            (Growth::LINEAR, "n"),
            (Growth::poly(2, 0), "n²"),
            (Growth::poly(1, 1), "n log n"),
            (Growth::poly(2, 1), "n² log n"),
            (Growth::poly(0, 2), "log² n"),
            (Growth::poly(12, 0), "n¹²"),
            (
                Growth::Poly {
                    degree: Degree::LogOf { base: 2, arg: 3 },
                    log: 0,
                },
                "n^(log₂3)",
            ),
            (Growth::Exponential(Base::Integer(2)), "2ⁿ"),
            (Growth::Exponential(Base::Golden), "φⁿ"),
            (Growth::Exponential(Base::Real(1.8393)), "1.839ⁿ"),
            (Growth::Unknown, "?"),
        ];
        for (growth, expected) in cases {
            assert_eq!(growth.to_string(), expected);
        }
    }

    #[test]
    fn bounds_carry_their_notation() {
        assert_eq!(Bound::theta(Growth::poly(1, 1)).to_string(), "Θ(n log n)");
        assert_eq!(Bound::big_o(Growth::poly(2, 0)).to_string(), "O(n²)");
        assert_eq!(Bound::omega(Growth::CONSTANT).to_string(), "Ω(1)");
        assert_eq!(Bound::unknown().to_string(), "Θ(?)");
    }

    #[test]
    fn multiplies_and_orders_classes() {
        assert_eq!(Growth::LINEAR.times(Growth::LOG), Growth::poly(1, 1));
        assert_eq!(Growth::CONSTANT.times(Growth::Exponential(Base::Golden)), Growth::Exponential(Base::Golden));
        assert_eq!(Growth::poly(3, 0).max(Growth::poly(2, 5)), Growth::poly(3, 0));
        assert_eq!(
            Growth::poly(9, 0).max(Growth::Exponential(Base::Integer(2))),
            Growth::Exponential(Base::Integer(2))
        );
        assert_eq!(Growth::LINEAR.compare(&Growth::Unknown), None);
    }

    #[test]
    fn certificate_names_the_witness_constants() {
        assert_eq!(
            Bound::theta(Growth::poly(2, 0)).certificate(),
            "c1·n² ≤ T(n) ≤ c2·n² for all n ≥ n0"
        );
        assert_eq!(
            Bound::theta(Growth::CONSTANT).certificate(),
            "c1 ≤ T(n) ≤ c2 for all n ≥ n0"
        );
        assert_eq!(Bound::unknown().certificate(), "no bound established");
    }

    #[test]
    fn serializes_as_canonical_string() {
        let json = serde_json::to_string(&Bound::theta(Growth::LOG)).expect("serialize");
        assert_eq!(json, "\"Θ(log n)\"");
    }
}

//! Robustness formulas and the three-valued truth domain.

use crate::distance::{DistanceExpression, RelationOperator, check_window};
use crate::error::Result;
use crate::perturbation::Perturbation;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Not};

/// Verdict of the statistical evaluator, ordered `False < Unknown < True`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TruthValue {
    False,
    Unknown,
    True,
}

impl TruthValue {
    /// Conjunction: the minimum of the two values.
    pub fn and(self, other: Self) -> Self {
        self.min(other)
    }

    /// Disjunction: the maximum of the two values.
    pub fn or(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn is_definite(self) -> bool {
        self != Self::Unknown
    }
}

impl Not for TruthValue {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
            Self::True => Self::False,
        }
    }
}

impl From<bool> for TruthValue {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::False => "false",
            Self::Unknown => "unknown",
            Self::True => "true",
        };
        f.write_str(name)
    }
}

/// Formula of the robustness temporal logic.
///
/// Temporal operators range over the steps `[step + from, step + to]`.
#[derive(Debug, Clone)]
pub enum RobustnessFormula {
    True,
    False,
    /// Applying `perturbation` at the current step keeps `distance` between
    /// the nominal and the perturbed sequence in relation `op` with `threshold`.
    Atomic {
        perturbation: Perturbation,
        distance: DistanceExpression,
        op: RelationOperator,
        threshold: f64,
    },
    Negation(Box<RobustnessFormula>),
    Conjunction(Box<RobustnessFormula>, Box<RobustnessFormula>),
    Disjunction(Box<RobustnessFormula>, Box<RobustnessFormula>),
    Implication(Box<RobustnessFormula>, Box<RobustnessFormula>),
    /// `right` holds at some step of the window and `left` at every earlier
    /// step of the window.
    Until {
        left: Box<RobustnessFormula>,
        from: usize,
        to: usize,
        right: Box<RobustnessFormula>,
    },
    Always {
        arg: Box<RobustnessFormula>,
        from: usize,
        to: usize,
    },
    Eventually {
        arg: Box<RobustnessFormula>,
        from: usize,
        to: usize,
    },
}

impl RobustnessFormula {
    pub fn atomic(
        perturbation: Perturbation,
        distance: DistanceExpression,
        op: RelationOperator,
        threshold: f64,
    ) -> Self {
        Self::Atomic {
            perturbation,
            distance,
            op,
            threshold,
        }
    }

    pub fn negation(arg: Self) -> Self {
        Self::Negation(Box::new(arg))
    }

    pub fn conjunction(left: Self, right: Self) -> Self {
        Self::Conjunction(Box::new(left), Box::new(right))
    }

    pub fn disjunction(left: Self, right: Self) -> Self {
        Self::Disjunction(Box::new(left), Box::new(right))
    }

    pub fn implication(left: Self, right: Self) -> Self {
        Self::Implication(Box::new(left), Box::new(right))
    }

    pub fn until(left: Self, from: usize, to: usize, right: Self) -> Result<Self> {
        check_window(from, to)?;
        Ok(Self::Until {
            left: Box::new(left),
            from,
            to,
            right: Box::new(right),
        })
    }

    pub fn always(arg: Self, from: usize, to: usize) -> Result<Self> {
        check_window(from, to)?;
        Ok(Self::Always {
            arg: Box::new(arg),
            from,
            to,
        })
    }

    pub fn eventually(arg: Self, from: usize, to: usize) -> Result<Self> {
        check_window(from, to)?;
        Ok(Self::Eventually {
            arg: Box::new(arg),
            from,
            to,
        })
    }

    /// Number of steps after the evaluation step that the nominal sequence
    /// must reach to evaluate this formula.
    pub fn horizon(&self) -> usize {
        match self {
            Self::True | Self::False => 0,
            Self::Atomic { distance, .. } => distance.horizon(),
            Self::Negation(arg) => arg.horizon(),
            Self::Conjunction(left, right)
            | Self::Disjunction(left, right)
            | Self::Implication(left, right) => left.horizon().max(right.horizon()),
            Self::Until {
                left, to, right, ..
            } => to + left.horizon().max(right.horizon()),
            Self::Always { arg, to, .. } | Self::Eventually { arg, to, .. } => to + arg.horizon(),
        }
    }
}

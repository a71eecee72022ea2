//! Distance expressions between two evolution sequences.
//!
//! Leaves lift a ground distance on penalty values to the sample sets of the
//! two sequences at a given step. Inner nodes combine sub-distances over the
//! same step or over a window of steps `[step + from, step + to]`, bounds
//! included.

use crate::data::DataState;
use crate::error::{Error, Result};
use crate::evolution::EvolutionSequence;
use crate::sample::{GroundDistance, Penalty, absolute_distance};
use crate::stats::ConfidenceInterval;
use crate::system::SystemState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Comparison between a computed distance and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationOperator {
    Lt,
    Leq,
    Eq,
    Neq,
    Geq,
    Gt,
}

impl RelationOperator {
    pub fn test(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Leq => value <= threshold,
            Self::Eq => value == threshold,
            Self::Neq => value != threshold,
            Self::Geq => value >= threshold,
            Self::Gt => value > threshold,
        }
    }

    /// How far `value` is from satisfying the relation; 0 when it does.
    ///
    /// A violated relation always yields a positive excess: a strict relation
    /// violated at its boundary yields `f64::MIN_POSITIVE` and a violated
    /// `Neq` yields 1. NaN operands yield NaN.
    pub fn excess(self, value: f64, threshold: f64) -> f64 {
        if value.is_nan() || threshold.is_nan() {
            return f64::NAN;
        }
        if self.test(value, threshold) {
            return 0.0;
        }
        let excess = match self {
            Self::Lt | Self::Leq => value - threshold,
            Self::Gt | Self::Geq => threshold - value,
            Self::Eq => (value - threshold).abs(),
            Self::Neq => 1.0,
        };
        excess.max(f64::MIN_POSITIVE)
    }

    /// Range of [`RelationOperator::excess`] over the values of `ci`.
    fn excess_interval(self, ci: ConfidenceInterval, threshold: f64) -> ConfidenceInterval {
        match self {
            Self::Lt | Self::Leq | Self::Gt | Self::Geq => {
                let a = self.excess(ci.low, threshold);
                let b = self.excess(ci.high, threshold);
                ConfidenceInterval::new(a.min(b), a.max(b))
            }
            Self::Eq => {
                let far = (ci.low - threshold).abs().max((ci.high - threshold).abs());
                let near = if ci.contains(threshold) {
                    0.0
                } else {
                    (ci.low - threshold).abs().min((ci.high - threshold).abs())
                };
                ConfidenceInterval::new(near, far)
            }
            Self::Neq => {
                if ci.low == threshold && ci.high == threshold {
                    ConfidenceInterval::point(1.0)
                } else if ci.contains(threshold) {
                    ConfidenceInterval::new(0.0, 1.0)
                } else {
                    ConfidenceInterval::point(0.0)
                }
            }
        }
    }
}

impl fmt::Display for RelationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Lt => "<",
            Self::Leq => "<=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Geq => ">=",
            Self::Gt => ">",
        };
        f.write_str(symbol)
    }
}

#[derive(Clone)]
pub enum DistanceExpression {
    /// Lifting of `ground` applied to `penalty`.
    Atomic {
        penalty: Penalty,
        ground: GroundDistance,
    },
    /// Expected increase of `penalty` in the second sequence.
    AtomicLeq(Penalty),
    /// Expected decrease of `penalty` in the second sequence.
    AtomicGeq(Penalty),
    Max(Box<DistanceExpression>, Box<DistanceExpression>),
    Min(Box<DistanceExpression>, Box<DistanceExpression>),
    MaxInterval {
        arg: Box<DistanceExpression>,
        from: usize,
        to: usize,
    },
    MinInterval {
        arg: Box<DistanceExpression>,
        from: usize,
        to: usize,
    },
    Until {
        left: Box<DistanceExpression>,
        from: usize,
        to: usize,
        right: Box<DistanceExpression>,
    },
    Threshold {
        arg: Box<DistanceExpression>,
        op: RelationOperator,
        value: f64,
    },
    /// Weighted sum. Weights are expected, not required, to sum to 1.
    ConvexCombination {
        weights: Vec<f64>,
        args: Vec<DistanceExpression>,
    },
}

impl DistanceExpression {
    pub fn atomic<P, G>(penalty: P, ground: G) -> Self
    where
        P: Fn(&DataState) -> f64 + Send + Sync + 'static,
        G: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self::Atomic {
            penalty: Arc::new(penalty),
            ground: Arc::new(ground),
        }
    }

    /// Lifting of `|a - b|`.
    pub fn absolute<P>(penalty: P) -> Self
    where
        P: Fn(&DataState) -> f64 + Send + Sync + 'static,
    {
        Self::atomic(penalty, absolute_distance)
    }

    pub fn leq<P>(penalty: P) -> Self
    where
        P: Fn(&DataState) -> f64 + Send + Sync + 'static,
    {
        Self::AtomicLeq(Arc::new(penalty))
    }

    pub fn geq<P>(penalty: P) -> Self
    where
        P: Fn(&DataState) -> f64 + Send + Sync + 'static,
    {
        Self::AtomicGeq(Arc::new(penalty))
    }

    pub fn max(left: Self, right: Self) -> Self {
        Self::Max(Box::new(left), Box::new(right))
    }

    pub fn min(left: Self, right: Self) -> Self {
        Self::Min(Box::new(left), Box::new(right))
    }

    pub fn max_interval(arg: Self, from: usize, to: usize) -> Result<Self> {
        check_window(from, to)?;
        Ok(Self::MaxInterval {
            arg: Box::new(arg),
            from,
            to,
        })
    }

    pub fn min_interval(arg: Self, from: usize, to: usize) -> Result<Self> {
        check_window(from, to)?;
        Ok(Self::MinInterval {
            arg: Box::new(arg),
            from,
            to,
        })
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

    pub fn threshold(arg: Self, op: RelationOperator, value: f64) -> Self {
        Self::Threshold {
            arg: Box::new(arg),
            op,
            value,
        }
    }

    pub fn convex_combination(weights: Vec<f64>, args: Vec<Self>) -> Result<Self> {
        if weights.len() != args.len() {
            return Err(Error::InvalidParameter(format!(
                "{} weights given for {} distances",
                weights.len(),
                args.len()
            )));
        }
        if args.is_empty() {
            return Err(Error::InvalidParameter(
                "convex combination of no distances".to_string(),
            ));
        }
        Ok(Self::ConvexCombination { weights, args })
    }

    /// Number of steps after the evaluation step read by this expression.
    pub fn horizon(&self) -> usize {
        match self {
            Self::Atomic { .. } | Self::AtomicLeq(_) | Self::AtomicGeq(_) => 0,
            Self::Max(left, right) | Self::Min(left, right) => left.horizon().max(right.horizon()),
            Self::MaxInterval { arg, to, .. } | Self::MinInterval { arg, to, .. } => {
                to + arg.horizon()
            }
            Self::Until {
                left, to, right, ..
            } => to + left.horizon().max(right.horizon()),
            Self::Threshold { arg, .. } => arg.horizon(),
            Self::ConvexCombination { args, .. } => {
                args.iter().map(Self::horizon).max().unwrap_or(0)
            }
        }
    }

    /// Distance between `seq1` and `seq2` evaluated at `step`.
    pub fn compute<T: SystemState>(
        &self,
        step: usize,
        seq1: &EvolutionSequence<T>,
        seq2: &EvolutionSequence<T>,
    ) -> Result<f64> {
        match self {
            Self::Atomic { penalty, ground } => {
                seq1.get(step)?
                    .distance_with(&**penalty, &**ground, &*seq2.get(step)?)
            }
            Self::AtomicLeq(penalty) => seq1.get(step)?.distance_leq(&**penalty, &*seq2.get(step)?),
            Self::AtomicGeq(penalty) => seq1.get(step)?.distance_geq(&**penalty, &*seq2.get(step)?),
            Self::Max(left, right) => Ok(nan_max(
                left.compute(step, seq1, seq2)?,
                right.compute(step, seq1, seq2)?,
            )),
            Self::Min(left, right) => Ok(nan_min(
                left.compute(step, seq1, seq2)?,
                right.compute(step, seq1, seq2)?,
            )),
            Self::MaxInterval { arg, from, to } => {
                check_window(*from, *to)?;
                let mut result = f64::NEG_INFINITY;
                for t in step + from..=step + to {
                    result = nan_max(result, arg.compute(t, seq1, seq2)?);
                }
                Ok(result)
            }
            Self::MinInterval { arg, from, to } => {
                check_window(*from, *to)?;
                let mut result = f64::INFINITY;
                for t in step + from..=step + to {
                    result = nan_min(result, arg.compute(t, seq1, seq2)?);
                }
                Ok(result)
            }
            Self::Until {
                left,
                from,
                to,
                right,
            } => {
                check_window(*from, *to)?;
                let mut left_max = f64::NEG_INFINITY;
                let mut result = f64::NEG_INFINITY;
                for t in step + from..=step + to {
                    left_max = nan_max(left_max, left.compute(t, seq1, seq2)?);
                    result = nan_max(result, nan_min(right.compute(t, seq1, seq2)?, left_max));
                }
                Ok(result)
            }
            Self::Threshold { arg, op, value } => {
                let distance = arg.compute(step, seq1, seq2)?;
                if distance.is_nan() {
                    return Ok(f64::NAN);
                }
                Ok(op.excess(distance, *value))
            }
            Self::ConvexCombination { weights, args } => {
                let mut result = 0.0;
                for (weight, arg) in weights.iter().zip(args) {
                    result += weight * arg.compute(step, seq1, seq2)?;
                }
                Ok(result)
            }
        }
    }

    /// Bootstrap confidence interval of the distance at `step`.
    ///
    /// Leaves are estimated with `m` bootstrap repetitions and quantile `z`;
    /// inner nodes combine the intervals of their arguments.
    pub fn compute_ci<T, R>(
        &self,
        rng: &mut R,
        step: usize,
        seq1: &EvolutionSequence<T>,
        seq2: &EvolutionSequence<T>,
        m: usize,
        z: f64,
    ) -> Result<ConfidenceInterval>
    where
        T: SystemState,
        R: Rng + ?Sized,
    {
        match self {
            Self::Atomic { penalty, ground } => seq1.get(step)?.bootstrap_distance_with(
                rng,
                &**penalty,
                &**ground,
                &*seq2.get(step)?,
                m,
                z,
            ),
            Self::AtomicLeq(penalty) => {
                seq1.get(step)?
                    .bootstrap_distance_leq(rng, &**penalty, &*seq2.get(step)?, m, z)
            }
            Self::AtomicGeq(penalty) => {
                seq1.get(step)?
                    .bootstrap_distance_geq(rng, &**penalty, &*seq2.get(step)?, m, z)
            }
            Self::Max(left, right) => {
                let left = left.compute_ci(rng, step, seq1, seq2, m, z)?;
                Ok(left.max(right.compute_ci(rng, step, seq1, seq2, m, z)?))
            }
            Self::Min(left, right) => {
                let left = left.compute_ci(rng, step, seq1, seq2, m, z)?;
                Ok(left.min(right.compute_ci(rng, step, seq1, seq2, m, z)?))
            }
            Self::MaxInterval { arg, from, to } => {
                check_window(*from, *to)?;
                let mut result = ConfidenceInterval::point(f64::NEG_INFINITY);
                for t in step + from..=step + to {
                    result = result.max(arg.compute_ci(rng, t, seq1, seq2, m, z)?);
                }
                Ok(result)
            }
            Self::MinInterval { arg, from, to } => {
                check_window(*from, *to)?;
                let mut result = ConfidenceInterval::point(f64::INFINITY);
                for t in step + from..=step + to {
                    result = result.min(arg.compute_ci(rng, t, seq1, seq2, m, z)?);
                }
                Ok(result)
            }
            Self::Until {
                left,
                from,
                to,
                right,
            } => {
                check_window(*from, *to)?;
                let mut left_max = ConfidenceInterval::point(f64::NEG_INFINITY);
                let mut result = ConfidenceInterval::point(f64::NEG_INFINITY);
                for t in step + from..=step + to {
                    left_max = left_max.max(left.compute_ci(rng, t, seq1, seq2, m, z)?);
                    let right = right.compute_ci(rng, t, seq1, seq2, m, z)?;
                    result = result.max(right.min(left_max));
                }
                Ok(result)
            }
            Self::Threshold { arg, op, value } => {
                let ci = arg.compute_ci(rng, step, seq1, seq2, m, z)?;
                if ci.is_nan() {
                    return Ok(ConfidenceInterval::nan());
                }
                Ok(op.excess_interval(ci, *value))
            }
            Self::ConvexCombination { weights, args } => {
                let mut result = ConfidenceInterval::point(0.0);
                for (weight, arg) in weights.iter().zip(args) {
                    let ci = arg.compute_ci(rng, step, seq1, seq2, m, z)?;
                    result = result.add(ci.scale(*weight));
                }
                Ok(result)
            }
        }
    }
}

impl fmt::Debug for DistanceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic { .. } => write!(f, "Atomic"),
            Self::AtomicLeq(_) => write!(f, "AtomicLeq"),
            Self::AtomicGeq(_) => write!(f, "AtomicGeq"),
            Self::Max(l, r) => write!(f, "Max({l:?}, {r:?})"),
            Self::Min(l, r) => write!(f, "Min({l:?}, {r:?})"),
            Self::MaxInterval { arg, from, to } => write!(f, "MaxInterval({arg:?}, {from}, {to})"),
            Self::MinInterval { arg, from, to } => write!(f, "MinInterval({arg:?}, {from}, {to})"),
            Self::Until {
                left,
                from,
                to,
                right,
            } => write!(f, "Until({left:?}, {from}, {to}, {right:?})"),
            Self::Threshold { arg, op, value } => write!(f, "Threshold({arg:?} {op} {value})"),
            Self::ConvexCombination { weights, args } => {
                write!(f, "ConvexCombination({weights:?}, {args:?})")
            }
        }
    }
}

pub(crate) fn check_window(from: usize, to: usize) -> Result<()> {
    if from > to {
        return Err(Error::MalformedWindow { from, to });
    }
    Ok(())
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

//! Evaluators of robustness formulas.
//!
//! [`BooleanSemantics`] compares the exact distances computed on the
//! generated sample sets. [`ThreeValuedSemantics`] replaces each distance
//! with a bootstrap confidence interval and answers
//! [`TruthValue::Unknown`] when the interval straddles the threshold.

use crate::distance::{RelationOperator, check_window};
use crate::error::{Error, Result};
use crate::evolution::EvolutionSequence;
use crate::formula::{RobustnessFormula, TruthValue};
use crate::stats::ConfidenceInterval;
use crate::system::SystemState;
use rand::Rng;

/// Exact evaluation.
#[derive(Debug, Clone, Copy)]
pub struct BooleanSemantics {
    scale: usize,
}

impl BooleanSemantics {
    /// Perturbed sequences hold `scale` times as many samples as the nominal one.
    pub fn new(scale: usize) -> Result<Self> {
        check_scale(scale)?;
        Ok(Self { scale })
    }

    pub fn eval<T: SystemState>(
        &self,
        formula: &RobustnessFormula,
        step: usize,
        seq: &EvolutionSequence<T>,
    ) -> Result<bool> {
        match formula {
            RobustnessFormula::True => Ok(true),
            RobustnessFormula::False => Ok(false),
            RobustnessFormula::Atomic {
                perturbation,
                distance,
                op,
                threshold,
            } => {
                let perturbed = seq.apply(perturbation.clone(), step, self.scale)?;
                let value = distance.compute(step, seq, &perturbed)?;
                log::trace!("step {step}: distance {value} {op} {threshold}");
                Ok(op.test(value, *threshold))
            }
            RobustnessFormula::Negation(arg) => Ok(!self.eval(arg, step, seq)?),
            RobustnessFormula::Conjunction(left, right) => {
                Ok(self.eval(left, step, seq)? && self.eval(right, step, seq)?)
            }
            RobustnessFormula::Disjunction(left, right) => {
                Ok(self.eval(left, step, seq)? || self.eval(right, step, seq)?)
            }
            RobustnessFormula::Implication(left, right) => {
                Ok(!self.eval(left, step, seq)? || self.eval(right, step, seq)?)
            }
            RobustnessFormula::Until {
                left,
                from,
                to,
                right,
            } => {
                check_window(*from, *to)?;
                for t in step + from..=step + to {
                    if self.eval(right, t, seq)? {
                        return Ok(true);
                    }
                    if !self.eval(left, t, seq)? {
                        return Ok(false);
                    }
                }
                Ok(false)
            }
            RobustnessFormula::Always { arg, from, to } => {
                check_window(*from, *to)?;
                for t in step + from..=step + to {
                    if !self.eval(arg, t, seq)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            RobustnessFormula::Eventually { arg, from, to } => {
                check_window(*from, *to)?;
                for t in step + from..=step + to {
                    if self.eval(arg, t, seq)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Statistical evaluation based on bootstrap confidence intervals.
#[derive(Debug, Clone, Copy)]
pub struct ThreeValuedSemantics {
    scale: usize,
    /// Bootstrap repetitions.
    m: usize,
    /// Quantile of the normal distribution bounding the intervals.
    z: f64,
}

impl ThreeValuedSemantics {
    pub fn new(scale: usize, m: usize, z: f64) -> Result<Self> {
        check_scale(scale)?;
        if m < 2 {
            return Err(Error::InvalidParameter(format!(
                "bootstrap needs at least 2 repetitions, got {m}"
            )));
        }
        if !(z.is_finite() && z >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "quantile must be finite and non-negative, got {z}"
            )));
        }
        Ok(Self { scale, m, z })
    }

    pub fn eval<T, R>(
        &self,
        rng: &mut R,
        formula: &RobustnessFormula,
        step: usize,
        seq: &EvolutionSequence<T>,
    ) -> Result<TruthValue>
    where
        T: SystemState,
        R: Rng + ?Sized,
    {
        match formula {
            RobustnessFormula::True => Ok(TruthValue::True),
            RobustnessFormula::False => Ok(TruthValue::False),
            RobustnessFormula::Atomic {
                perturbation,
                distance,
                op,
                threshold,
            } => {
                let perturbed = seq.apply(perturbation.clone(), step, self.scale)?;
                let ci = distance.compute_ci(rng, step, seq, &perturbed, self.m, self.z)?;
                let value = decide(*op, ci, *threshold);
                log::trace!(
                    "step {step}: distance in [{}, {}] {op} {threshold} is {value}",
                    ci.low,
                    ci.high
                );
                Ok(value)
            }
            RobustnessFormula::Negation(arg) => Ok(!self.eval(rng, arg, step, seq)?),
            RobustnessFormula::Conjunction(left, right) => {
                let left = self.eval(rng, left, step, seq)?;
                if left == TruthValue::False {
                    return Ok(left);
                }
                Ok(left.and(self.eval(rng, right, step, seq)?))
            }
            RobustnessFormula::Disjunction(left, right) => {
                let left = self.eval(rng, left, step, seq)?;
                if left == TruthValue::True {
                    return Ok(left);
                }
                Ok(left.or(self.eval(rng, right, step, seq)?))
            }
            RobustnessFormula::Implication(left, right) => {
                let left = !self.eval(rng, left, step, seq)?;
                if left == TruthValue::True {
                    return Ok(left);
                }
                Ok(left.or(self.eval(rng, right, step, seq)?))
            }
            RobustnessFormula::Until {
                left,
                from,
                to,
                right,
            } => {
                check_window(*from, *to)?;
                let mut result = TruthValue::False;
                let mut prefix = TruthValue::True;
                for t in step + from..=step + to {
                    result = result.or(prefix.and(self.eval(rng, right, t, seq)?));
                    if result == TruthValue::True {
                        break;
                    }
                    prefix = prefix.and(self.eval(rng, left, t, seq)?);
                    if prefix == TruthValue::False {
                        break;
                    }
                }
                Ok(result)
            }
            RobustnessFormula::Always { arg, from, to } => {
                check_window(*from, *to)?;
                let mut result = TruthValue::True;
                for t in step + from..=step + to {
                    result = result.and(self.eval(rng, arg, t, seq)?);
                    if result == TruthValue::False {
                        break;
                    }
                }
                Ok(result)
            }
            RobustnessFormula::Eventually { arg, from, to } => {
                check_window(*from, *to)?;
                let mut result = TruthValue::False;
                for t in step + from..=step + to {
                    result = result.or(self.eval(rng, arg, t, seq)?);
                    if result == TruthValue::True {
                        break;
                    }
                }
                Ok(result)
            }
        }
    }
}

fn check_scale(scale: usize) -> Result<()> {
    if scale == 0 {
        return Err(Error::InvalidParameter(
            "scale of perturbed sequences must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Truth of `d op threshold` for every `d` in `ci`.
fn decide(op: RelationOperator, ci: ConfidenceInterval, threshold: f64) -> TruthValue {
    if ci.is_nan() {
        return TruthValue::Unknown;
    }
    match op {
        RelationOperator::Eq | RelationOperator::Neq => {
            let equal = if ci.low == threshold && ci.high == threshold {
                TruthValue::True
            } else if ci.contains(threshold) {
                TruthValue::Unknown
            } else {
                TruthValue::False
            };
            if op == RelationOperator::Eq { equal } else { !equal }
        }
        _ => match (op.test(ci.low, threshold), op.test(ci.high, threshold)) {
            (true, true) => TruthValue::True,
            (false, false) => TruthValue::False,
            _ => TruthValue::Unknown,
        },
    }
}

//! Small statistics toolbox shared by sample sets and evaluators.

use serde::{Deserialize, Serialize};

/// Closed interval estimate of a distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceInterval {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Degenerate interval holding a single value.
    pub fn point(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_nan(&self) -> bool {
        self.low.is_nan() || self.high.is_nan()
    }

    /// Bound-wise maximum. A NaN interval on either side gives a NaN interval.
    pub fn max(self, other: Self) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::nan();
        }
        Self::new(self.low.max(other.low), self.high.max(other.high))
    }

    /// Bound-wise minimum. A NaN interval on either side gives a NaN interval.
    pub fn min(self, other: Self) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::nan();
        }
        Self::new(self.low.min(other.low), self.high.min(other.high))
    }

    /// Interval of an undefined distance.
    pub fn nan() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    /// Interval of `weight * x` for `x` in `self`.
    pub fn scale(self, weight: f64) -> Self {
        let (a, b) = (self.low * weight, self.high * weight);
        Self::new(a.min(b), a.max(b))
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.low + other.low, self.high + other.high)
    }

    /// Interval `[mean - z * sem, mean + z * sem]` clamped to `[0, 1]`.
    pub fn from_replicates(replicates: &[f64], z: f64) -> Self {
        let mean = compute_mean(replicates);
        if mean.is_nan() {
            return Self::nan();
        }
        let sem = compute_var(replicates).sqrt();
        Self::new((mean - z * sem).max(0.0), (mean + z * sem).min(1.0))
    }
}

/// Arithmetic mean, NaN for an empty slice.
pub fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Unbiased sample variance, NaN with fewer than two values.
pub fn compute_var(vals: &[f64]) -> f64 {
    let n_vals = vals.len();
    if n_vals < 2 {
        return f64::NAN;
    }
    let mean = compute_mean(vals);
    vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1) as f64
}

//! Sample sets: the population of a sequence at one time step.
//!
//! All distances between sample sets are computed on the *sorted* outputs of
//! a penalty function. Pairing the `i`-th smallest value of the smaller set
//! with the `k` values starting at `i * k` in the larger set is what turns a
//! ground distance on reals into a transport distance between the two
//! empirical distributions.

use crate::data::DataState;
use crate::error::{Error, Result};
use crate::stats::{ConfidenceInterval, compute_mean};
use crate::system::SystemState;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use std::sync::Arc;

/// Maps a data state to the real value on which distances are measured.
pub type Penalty = Arc<dyn Fn(&DataState) -> f64 + Send + Sync>;

/// Distance between two penalty values.
pub type GroundDistance = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// `|a - b|`
pub fn absolute_distance(a: f64, b: f64) -> f64 {
    (a - b).abs()
}

/// How much `b` exceeds `a`.
pub fn leq_distance(a: f64, b: f64) -> f64 {
    (b - a).max(0.0)
}

/// How much `a` exceeds `b`.
pub fn geq_distance(a: f64, b: f64) -> f64 {
    (a - b).max(0.0)
}

/// Fixed-size population of independent samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet<T> {
    items: Vec<T>,
}

impl<T> SampleSet<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Build a sample set of `size` elements drawn from `generator`.
    pub fn generate<R, F>(rng: &mut R, mut generator: F, size: usize) -> Self
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> T,
    {
        let items = (0..size).map(|_| generator(rng)).collect();
        Self { items }
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Clone> SampleSet<T> {
    /// Every element repeated `k` times, copies adjacent to their source.
    pub fn replica(&self, k: usize) -> Self {
        let mut items = Vec::with_capacity(self.items.len() * k);
        for item in &self.items {
            items.extend(std::iter::repeat_n(item, k).cloned());
        }
        Self { items }
    }
}

impl<T: Send + Sync> SampleSet<T> {
    /// Transform every element independently.
    pub fn apply<F>(&self, transform: F) -> Self
    where
        F: Fn(&T) -> T + Sync,
    {
        Self {
            items: self.items.par_iter().map(|item| transform(item)).collect(),
        }
    }

    /// Transform every element independently, each with its own random stream.
    ///
    /// The streams are seeded sequentially from `rng`, so the result only
    /// depends on the state of `rng` and not on how the work is scheduled.
    pub fn apply_with_rng<R, F>(&self, rng: &mut R, transform: F) -> Self
    where
        R: Rng + ?Sized,
        F: Fn(&mut dyn RngCore, &T) -> T + Sync,
    {
        let rngs = child_rngs(rng, self.items.len());
        let items = rngs
            .into_par_iter()
            .zip(self.items.par_iter())
            .map(|(mut rng, item)| transform(&mut rng, item))
            .collect();
        Self { items }
    }

    /// Like [`SampleSet::apply_with_rng`] with a fallible transform. The
    /// first error aborts the remaining work and is returned.
    pub(crate) fn try_apply_with_rng<R, F>(&self, rng: &mut R, transform: F) -> Result<Self>
    where
        R: Rng + ?Sized,
        F: Fn(&mut dyn RngCore, &T) -> Result<T> + Sync,
    {
        let rngs = child_rngs(rng, self.items.len());
        let items = rngs
            .into_par_iter()
            .zip(self.items.par_iter())
            .map(|(mut rng, item)| transform(&mut rng, item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }
}

impl<T: SystemState> SampleSet<T> {
    /// Penalty values of all elements, sorted in increasing order.
    pub fn eval_penalty<F>(&self, penalty: F) -> Vec<f64>
    where
        F: Fn(&DataState) -> f64 + Sync,
    {
        let mut vals: Vec<f64> = self
            .items
            .par_iter()
            .map(|item| penalty(item.data_state()))
            .collect();
        vals.sort_by(f64::total_cmp);
        vals
    }

    /// Average penalty value. NaN for an empty sample set.
    pub fn mean<F>(&self, penalty: F) -> f64
    where
        F: Fn(&DataState) -> f64 + Sync,
    {
        compute_mean(&self.eval_penalty(penalty))
    }

    /// Lifting of `|a - b|` to the two sample sets.
    pub fn distance<F>(&self, penalty: F, other: &Self) -> Result<f64>
    where
        F: Fn(&DataState) -> f64 + Sync,
    {
        self.distance_with(penalty, absolute_distance, other)
    }

    /// Lifting of `ground` to the two sample sets.
    ///
    /// The size of `other` must be a multiple of the size of `self`.
    pub fn distance_with<F, G>(&self, penalty: F, ground: G, other: &Self) -> Result<f64>
    where
        F: Fn(&DataState) -> f64 + Sync,
        G: Fn(f64, f64) -> f64,
    {
        check_sizes(self.size(), other.size())?;
        let this_vals = self.eval_penalty(&penalty);
        let other_vals = other.eval_penalty(&penalty);
        Ok(lifted_distance(&this_vals, &other_vals, &ground))
    }

    /// Expected amount by which the penalty in `other` exceeds the one in `self`.
    pub fn distance_leq<F>(&self, penalty: F, other: &Self) -> Result<f64>
    where
        F: Fn(&DataState) -> f64 + Sync,
    {
        self.distance_with(penalty, leq_distance, other)
    }

    /// Expected amount by which the penalty in `self` exceeds the one in `other`.
    pub fn distance_geq<F>(&self, penalty: F, other: &Self) -> Result<f64>
    where
        F: Fn(&DataState) -> f64 + Sync,
    {
        self.distance_with(penalty, geq_distance, other)
    }

    /// Bootstrap confidence interval of [`SampleSet::distance`].
    pub fn bootstrap_distance<R, F>(
        &self,
        rng: &mut R,
        penalty: F,
        other: &Self,
        m: usize,
        z: f64,
    ) -> Result<ConfidenceInterval>
    where
        R: Rng + ?Sized,
        F: Fn(&DataState) -> f64 + Sync,
    {
        self.bootstrap_distance_with(rng, penalty, absolute_distance, other, m, z)
    }

    pub fn bootstrap_distance_leq<R, F>(
        &self,
        rng: &mut R,
        penalty: F,
        other: &Self,
        m: usize,
        z: f64,
    ) -> Result<ConfidenceInterval>
    where
        R: Rng + ?Sized,
        F: Fn(&DataState) -> f64 + Sync,
    {
        self.bootstrap_distance_with(rng, penalty, leq_distance, other, m, z)
    }

    pub fn bootstrap_distance_geq<R, F>(
        &self,
        rng: &mut R,
        penalty: F,
        other: &Self,
        m: usize,
        z: f64,
    ) -> Result<ConfidenceInterval>
    where
        R: Rng + ?Sized,
        F: Fn(&DataState) -> f64 + Sync,
    {
        self.bootstrap_distance_with(rng, penalty, geq_distance, other, m, z)
    }

    /// Resample both populations `m` times with replacement, recompute the
    /// lifted distance on each resample and return the normal confidence
    /// interval with quantile `z`, clamped to `[0, 1]`.
    pub fn bootstrap_distance_with<R, F, G>(
        &self,
        rng: &mut R,
        penalty: F,
        ground: G,
        other: &Self,
        m: usize,
        z: f64,
    ) -> Result<ConfidenceInterval>
    where
        R: Rng + ?Sized,
        F: Fn(&DataState) -> f64 + Sync,
        G: Fn(f64, f64) -> f64 + Sync,
    {
        if m < 2 {
            return Err(Error::InvalidParameter(format!(
                "bootstrap needs at least 2 repetitions, got {m}"
            )));
        }
        check_sizes(self.size(), other.size())?;
        if self.is_empty() {
            return Ok(ConfidenceInterval::nan());
        }
        let this_vals = self.eval_penalty(&penalty);
        let other_vals = other.eval_penalty(&penalty);

        let replicates: Vec<f64> = child_rngs(rng, m)
            .into_par_iter()
            .map(|mut rng| {
                let this_resample = resample(&mut rng, &this_vals);
                let other_resample = resample(&mut rng, &other_vals);
                lifted_distance(&this_resample, &other_resample, &ground)
            })
            .collect();

        Ok(ConfidenceInterval::from_replicates(&replicates, z))
    }
}

fn check_sizes(this: usize, other: usize) -> Result<()> {
    let compatible = if this == 0 {
        other == 0
    } else {
        other % this == 0
    };
    if !compatible {
        return Err(Error::SizeMismatch { this, other });
    }
    Ok(())
}

/// Both slices must be sorted and `other.len()` a multiple of `this.len()`.
fn lifted_distance<G>(this: &[f64], other: &[f64], ground: &G) -> f64
where
    G: Fn(f64, f64) -> f64,
{
    if this.is_empty() {
        return f64::NAN;
    }
    let k = other.len() / this.len();
    let sum: f64 = this
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            other[i * k..(i + 1) * k]
                .iter()
                .map(|&b| ground(a, b))
                .sum::<f64>()
        })
        .sum();
    sum / other.len() as f64
}

/// Sorted resample with replacement of a non-empty slice.
fn resample<R: Rng + ?Sized>(rng: &mut R, vals: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = (0..vals.len())
        .map(|_| vals[rng.random_range(0..vals.len())])
        .collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Independent generators seeded sequentially from `rng`.
pub(crate) fn child_rngs<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<ChaCha12Rng> {
    (0..n)
        .map(|_| ChaCha12Rng::seed_from_u64(rng.next_u64()))
        .collect()
}

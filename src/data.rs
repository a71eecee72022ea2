//! Data states: immutable snapshots of the variables of a system.

use serde::{Deserialize, Serialize};

/// A single variable assignment produced by a controller or perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataStateUpdate {
    pub index: usize,
    pub value: f64,
}

impl DataStateUpdate {
    pub fn new(index: usize, value: f64) -> Self {
        Self { index, value }
    }
}

/// Snapshot of a system at a given step.
///
/// Holds an indexed vector of real values together with the step counter.
/// Instances are never modified in place: [`DataState::apply`] and
/// [`DataState::advance`] return new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataState {
    values: Vec<f64>,
    step: usize,
    time_delta: f64,
}

impl DataState {
    /// Create a data state at step 0 with unit time granularity.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            step: 0,
            time_delta: 1.0,
        }
    }

    /// Set the time elapsed between two consecutive steps.
    pub fn with_time_delta(mut self, time_delta: f64) -> Self {
        self.time_delta = time_delta;
        self
    }

    /// Value of variable `index`, or NaN when the index is out of range.
    pub fn get(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(f64::NAN)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn time_delta(&self) -> f64 {
        self.time_delta
    }

    /// Elapsed time since step 0.
    pub fn time(&self) -> f64 {
        self.step as f64 * self.time_delta
    }

    /// Apply a batch of updates, returning the resulting state.
    ///
    /// Updates are applied in order, so a later update of the same index wins.
    /// Updates addressing an index beyond the current length grow the vector,
    /// filling the gap with zeros.
    pub fn apply(&self, updates: &[DataStateUpdate]) -> Self {
        let mut values = self.values.clone();
        for update in updates {
            if update.index >= values.len() {
                values.resize(update.index + 1, 0.0);
            }
            values[update.index] = update.value;
        }
        Self {
            values,
            step: self.step,
            time_delta: self.time_delta,
        }
    }

    /// Same values, one step later.
    pub fn advance(&self) -> Self {
        Self {
            values: self.values.clone(),
            step: self.step + 1,
            time_delta: self.time_delta,
        }
    }
}

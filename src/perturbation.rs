//! Perturbations: schedules of alterations applied to data states while a
//! sequence is generated.
//!
//! A perturbation is a value. [`Perturbation::effect`] tells what to do at
//! the current step and [`Perturbation::step`] returns the perturbation in
//! charge of the next step; the receiver is never modified.

use crate::data::{DataState, DataStateUpdate};
use crate::error::{Error, Result};
use crate::system::DataStateFunction;
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use std::{fmt, sync::Arc};

#[derive(Clone, Default)]
pub enum Perturbation {
    /// No alteration at all.
    #[default]
    None,
    /// Applies `effect` for the next `duration` steps.
    Atomic {
        duration: usize,
        effect: DataStateFunction,
    },
    /// Runs `body` to completion `count` times in a row.
    Iterative {
        count: usize,
        body: Box<Perturbation>,
        current: Box<Perturbation>,
    },
    /// Runs `first` to completion, then `second`.
    Sequential {
        first: Box<Perturbation>,
        second: Box<Perturbation>,
    },
    /// Waits `delay` steps, then runs `body`.
    After { delay: usize, body: Box<Perturbation> },
}

impl Perturbation {
    pub fn atomic<F>(duration: usize, effect: F) -> Self
    where
        F: Fn(&mut dyn RngCore, &DataState) -> DataState + Send + Sync + 'static,
    {
        Self::Atomic {
            duration,
            effect: Arc::new(effect),
        }
    }

    pub fn iterative(count: usize, body: Perturbation) -> Self {
        if count == 0 {
            return Self::None;
        }
        Self::Iterative {
            count,
            current: Box::new(body.clone()),
            body: Box::new(body),
        }
    }

    pub fn sequential(first: Perturbation, second: Perturbation) -> Self {
        Self::Sequential {
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    pub fn after(delay: usize, body: Perturbation) -> Self {
        if delay == 0 {
            return body;
        }
        Self::After {
            delay,
            body: Box::new(body),
        }
    }

    /// Adds `delta` to variable `index` for `duration` steps.
    pub fn offset(duration: usize, index: usize, delta: f64) -> Self {
        Self::atomic(duration, move |_, state| {
            state.apply(&[DataStateUpdate::new(index, state.get(index) + delta)])
        })
    }

    /// Adds zero-mean Gaussian noise of standard deviation `std_dev` to
    /// variable `index` for `duration` steps.
    pub fn gaussian_noise(duration: usize, index: usize, std_dev: f64) -> Result<Self> {
        let noise = Normal::new(0.0, std_dev)
            .map_err(|err| Error::InvalidParameter(format!("invalid noise: {err}")))?;
        Ok(Self::atomic(duration, move |rng, state| {
            let value = state.get(index) + noise.sample(rng);
            state.apply(&[DataStateUpdate::new(index, value)])
        }))
    }

    /// True when no step of this perturbation will ever have an effect again.
    pub fn is_done(&self) -> bool {
        match self {
            Self::None => true,
            Self::Atomic { duration, .. } => *duration == 0,
            Self::Iterative { count, .. } => *count == 0,
            Self::Sequential { first, second } => first.is_done() && second.is_done(),
            Self::After { delay, body } => *delay == 0 && body.is_done(),
        }
    }

    /// Alteration to apply at the current step, if any.
    pub fn effect(&self) -> Option<&DataStateFunction> {
        match self {
            Self::None => None,
            Self::Atomic { duration, effect } => (*duration > 0).then_some(effect),
            Self::Iterative { count, current, .. } => {
                if *count == 0 {
                    None
                } else {
                    current.effect()
                }
            }
            Self::Sequential { first, second } => {
                if first.is_done() {
                    second.effect()
                } else {
                    first.effect()
                }
            }
            Self::After { delay, body } => {
                if *delay > 0 {
                    None
                } else {
                    body.effect()
                }
            }
        }
    }

    /// Perturbation in charge of the next step.
    pub fn step(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Atomic { duration, effect } => Self::Atomic {
                duration: duration.saturating_sub(1),
                effect: Arc::clone(effect),
            },
            Self::Iterative {
                count,
                body,
                current,
            } => {
                let next = current.step();
                if !next.is_done() {
                    return Self::Iterative {
                        count: *count,
                        body: body.clone(),
                        current: Box::new(next),
                    };
                }
                if *count <= 1 {
                    Self::None
                } else {
                    Self::Iterative {
                        count: count - 1,
                        body: body.clone(),
                        current: body.clone(),
                    }
                }
            }
            Self::Sequential { first, second } => {
                if first.is_done() {
                    return second.step();
                }
                let next = first.step();
                if next.is_done() {
                    second.as_ref().clone()
                } else {
                    Self::Sequential {
                        first: Box::new(next),
                        second: second.clone(),
                    }
                }
            }
            Self::After { delay, body } => match delay {
                0 => body.step(),
                1 => body.as_ref().clone(),
                _ => Self::After {
                    delay: delay - 1,
                    body: body.clone(),
                },
            },
        }
    }

    /// Apply the current effect to `state`, or return it unchanged.
    pub fn apply(&self, rng: &mut dyn RngCore, state: &DataState) -> DataState {
        match self.effect() {
            Some(effect) => effect(rng, state),
            None => state.clone(),
        }
    }
}

impl fmt::Debug for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Atomic { duration, .. } => write!(f, "Atomic({duration})"),
            Self::Iterative { count, current, .. } => {
                write!(f, "Iterative({count}, {current:?})")
            }
            Self::Sequential { first, second } => write!(f, "Sequential({first:?}, {second:?})"),
            Self::After { delay, body } => write!(f, "After({delay}, {body:?})"),
        }
    }
}

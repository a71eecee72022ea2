#![allow(dead_code)]

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, Normal};
use robtl::{ControlledSystem, Controller, DataState, DataStateUpdate, EvolutionSequence, SampleSet};

pub type Sys = ControlledSystem;

pub fn rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

pub fn first(state: &DataState) -> f64 {
    state.get(0)
}

/// System that never changes.
pub fn constant(value: f64) -> ControlledSystem {
    ControlledSystem::new(Controller::idle(), |_, state| state.clone(), DataState::new(vec![value]))
}

/// System whose only variable grows by `increment` at each step.
pub fn counter(start: f64, increment: f64) -> ControlledSystem {
    ControlledSystem::new(
        Controller::from_fn(move |_, state| vec![DataStateUpdate::new(0, state.get(0) + increment)]),
        |_, state| state.clone(),
        DataState::new(vec![start]),
    )
}

/// Gaussian random walk confined to `[0, 1]`.
pub fn random_walk(start: f64, std_dev: f64) -> ControlledSystem {
    let noise = Normal::new(0.0, std_dev).unwrap();
    ControlledSystem::new(
        Controller::idle(),
        move |rng, state| {
            let value = (state.get(0) + noise.sample(rng)).clamp(0.0, 1.0);
            state.apply(&[DataStateUpdate::new(0, value)])
        },
        DataState::new(vec![start]),
    )
}

pub fn sample_set(values: &[f64]) -> SampleSet<ControlledSystem> {
    SampleSet::new(values.iter().map(|&value| constant(value)).collect())
}

pub fn counter_sequence(size: usize) -> EvolutionSequence<ControlledSystem> {
    EvolutionSequence::new(rng(7), &counter(0.0, 1.0), size)
}

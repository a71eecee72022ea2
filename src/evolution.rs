//! Evolution sequences: lazily generated, memoized series of sample sets.
//!
//! Step 0 is the initial population. Step `k` is obtained from step `k - 1`
//! by advancing every element once, in parallel. Once generated, a step is
//! cached for the lifetime of the sequence.
//!
//! Growth is serialized by a mutex that owns the random generator, while the
//! cached steps live behind a read-write lock that is only taken for writing
//! to push a fully generated step. Readers of cached steps therefore never
//! wait for a generation in progress.

use crate::error::{Error, Result};
use crate::perturbation::Perturbation;
use crate::sample::SampleSet;
use crate::system::SystemState;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Observer of step generation.
pub trait SequenceMonitor: Send + Sync {
    fn start_step(&self, _step: usize) {}

    fn end_step(&self, _step: usize) {}

    /// Checked between elements while a step is generated. Returning true
    /// aborts the generation; already cached steps are left untouched.
    fn is_cancelled(&self) -> bool {
        false
    }
}

struct Silent;

impl SequenceMonitor for Silent {}

struct Generator {
    rng: ChaCha12Rng,
    /// Seeds the generators of perturbed sequences derived from this one.
    fork_rng: ChaCha12Rng,
    /// Present only in perturbed sequences.
    perturbation: Option<Perturbation>,
}

pub struct EvolutionSequence<T> {
    steps: RwLock<Vec<Arc<SampleSet<T>>>>,
    generator: Mutex<Generator>,
    monitor: Arc<dyn SequenceMonitor>,
}

impl<T: SystemState> EvolutionSequence<T> {
    /// Sequence whose step 0 holds `size` copies of `initial`.
    pub fn new(mut rng: ChaCha12Rng, initial: &T, size: usize) -> Self {
        let first = SampleSet::new(vec![initial.clone(); size]);
        let fork_rng = ChaCha12Rng::seed_from_u64(rng.next_u64());
        Self::from_parts(vec![Arc::new(first)], rng, fork_rng, None)
    }

    /// Sequence whose step 0 holds `size` samples drawn from `generator`.
    pub fn with_generator<F>(mut rng: ChaCha12Rng, generator: F, size: usize) -> Self
    where
        F: FnMut(&mut ChaCha12Rng) -> T,
    {
        let first = SampleSet::generate(&mut rng, generator, size);
        let fork_rng = ChaCha12Rng::seed_from_u64(rng.next_u64());
        Self::from_parts(vec![Arc::new(first)], rng, fork_rng, None)
    }

    /// Replace the monitor observing step generation.
    pub fn with_monitor(mut self, monitor: Arc<dyn SequenceMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    fn from_parts(
        steps: Vec<Arc<SampleSet<T>>>,
        rng: ChaCha12Rng,
        fork_rng: ChaCha12Rng,
        perturbation: Option<Perturbation>,
    ) -> Self {
        Self {
            steps: RwLock::new(steps),
            generator: Mutex::new(Generator {
                rng,
                fork_rng,
                perturbation,
            }),
            monitor: Arc::new(Silent),
        }
    }

    /// Number of steps generated so far.
    pub fn cached_steps(&self) -> usize {
        self.read_steps().len()
    }

    /// Sample set at `step`, generating the missing steps first.
    pub fn get(&self, step: usize) -> Result<Arc<SampleSet<T>>> {
        if let Some(sample_set) = self.cached(step) {
            return Ok(sample_set);
        }

        let mut generator = self.generator.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let (next_step, last) = {
                let steps = self.read_steps();
                if let Some(sample_set) = steps.get(step) {
                    return Ok(Arc::clone(sample_set));
                }
                match steps.last() {
                    Some(last) => (steps.len(), Arc::clone(last)),
                    None => {
                        return Err(Error::InvalidParameter(
                            "sequence has no initial step".to_string(),
                        ));
                    }
                }
            };

            let next = self.generate_next_step(&mut generator, next_step, &last)?;
            self.steps
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Arc::new(next));
        }
    }

    /// Force the generation of every step up to `step`.
    pub fn generate_up_to(&self, step: usize) -> Result<()> {
        self.get(step).map(|_| ())
    }

    /// Independent sequence sharing the history of this one before `at_step`.
    ///
    /// Its step `at_step` is the sample set of this sequence at `at_step`,
    /// replicated `scale` times and altered by the current effect of
    /// `perturbation`. Each following step advances the perturbation once and
    /// applies its effect to the newly generated sample set.
    pub fn apply(&self, perturbation: Perturbation, at_step: usize, scale: usize) -> Result<Self> {
        if scale == 0 {
            return Err(Error::InvalidParameter(
                "scale of a perturbed sequence must be positive".to_string(),
            ));
        }
        let start = self.get(at_step)?;
        let mut steps: Vec<_> = self.read_steps()[..at_step].to_vec();

        let (mut rng, fork_rng) = {
            let mut generator = self.generator.lock().unwrap_or_else(PoisonError::into_inner);
            let rng = ChaCha12Rng::seed_from_u64(generator.fork_rng.next_u64());
            let fork_rng = ChaCha12Rng::seed_from_u64(generator.fork_rng.next_u64());
            (rng, fork_rng)
        };

        let replica = start.replica(scale);
        steps.push(Arc::new(perturb(&mut rng, &perturbation, replica)));
        log::info!("perturbed sequence from step {at_step} with scale {scale}: {perturbation:?}");

        let mut sequence = Self::from_parts(steps, rng, fork_rng, Some(perturbation));
        sequence.monitor = Arc::clone(&self.monitor);
        Ok(sequence)
    }

    fn cached(&self, step: usize) -> Option<Arc<SampleSet<T>>> {
        self.read_steps().get(step).cloned()
    }

    fn read_steps(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<SampleSet<T>>>> {
        self.steps.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_next_step(
        &self,
        generator: &mut Generator,
        step: usize,
        last: &SampleSet<T>,
    ) -> Result<SampleSet<T>> {
        self.monitor.start_step(step);
        if self.monitor.is_cancelled() {
            log::info!("generation of step {step} cancelled before start");
            return Err(Error::Cancelled { step });
        }

        let perturbation = generator.perturbation.as_ref().map(Perturbation::step);

        let next = last
            .try_apply_with_rng(&mut generator.rng, |rng, system| {
                if self.monitor.is_cancelled() {
                    return Err(Error::Cancelled { step });
                }
                system.sample_next(rng)
            })
            .inspect_err(|err| log::info!("generation of step {step} stopped: {err}"))?;

        let next = match &perturbation {
            Some(perturbation) => perturb(&mut generator.rng, perturbation, next),
            None => next,
        };
        generator.perturbation = perturbation;

        log::debug!("generated step {step} with {} samples", next.size());
        self.monitor.end_step(step);
        Ok(next)
    }
}

fn perturb<T: SystemState>(
    rng: &mut ChaCha12Rng,
    perturbation: &Perturbation,
    sample_set: SampleSet<T>,
) -> SampleSet<T> {
    match perturbation.effect() {
        Some(effect) => sample_set.apply_with_rng(rng, |rng, system| {
            system.with_data_state(effect(rng, system.data_state()))
        }),
        None => sample_set,
    }
}

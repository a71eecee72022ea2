//! Systems: the units that are simulated one step at a time.

use crate::controller::Controller;
use crate::data::DataState;
use crate::error::Result;
use rand::RngCore;
use std::{fmt, sync::Arc};

/// Random transformation of a data state, used for environments, feedbacks
/// and perturbation effects.
pub type DataStateFunction = Arc<dyn Fn(&mut dyn RngCore, &DataState) -> DataState + Send + Sync>;

/// A unit of simulation.
///
/// `sample_next` must be a pure function of `self` and of the random values
/// drawn from `rng`.
pub trait SystemState: Clone + Send + Sync {
    fn data_state(&self) -> &DataState;

    /// Advance one step.
    fn sample_next(&self, rng: &mut dyn RngCore) -> Result<Self>;

    /// Same system with its data state replaced.
    fn with_data_state(&self, state: DataState) -> Self;
}

/// A system driven by a controller and evolving in an environment.
///
/// At each step the controller effect is applied first, then the
/// environment function and finally, if present, the feedback function.
#[derive(Clone)]
pub struct ControlledSystem {
    controller: Controller,
    environment: DataStateFunction,
    feedback: Option<DataStateFunction>,
    state: DataState,
}

impl ControlledSystem {
    pub fn new<F>(controller: Controller, environment: F, state: DataState) -> Self
    where
        F: Fn(&mut dyn RngCore, &DataState) -> DataState + Send + Sync + 'static,
    {
        Self {
            controller,
            environment: Arc::new(environment),
            feedback: None,
            state,
        }
    }

    /// Share an already existing environment function.
    pub fn with_environment(
        controller: Controller,
        environment: DataStateFunction,
        state: DataState,
    ) -> Self {
        Self {
            controller,
            environment,
            feedback: None,
            state,
        }
    }

    pub fn with_feedback<F>(mut self, feedback: F) -> Self
    where
        F: Fn(&mut dyn RngCore, &DataState) -> DataState + Send + Sync + 'static,
    {
        self.feedback = Some(Arc::new(feedback));
        self
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl SystemState for ControlledSystem {
    fn data_state(&self) -> &DataState {
        &self.state
    }

    fn sample_next(&self, rng: &mut dyn RngCore) -> Result<Self> {
        let (updates, controller) = self.controller.next(rng, &self.state)?;
        let state = (self.environment)(rng, &self.state.apply(&updates));
        let state = match &self.feedback {
            Some(feedback) => feedback(rng, &state),
            None => state,
        };
        Ok(Self {
            controller,
            environment: Arc::clone(&self.environment),
            feedback: self.feedback.clone(),
            state: state.advance(),
        })
    }

    fn with_data_state(&self, state: DataState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}

impl fmt::Debug for ControlledSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlledSystem")
            .field("controller", &self.controller)
            .field("state", &self.state)
            .field("feedback", &self.feedback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataStateUpdate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn controller_then_environment_then_feedback() {
        let controller = Controller::from_fn(|_, s| vec![DataStateUpdate::new(0, s.get(0) + 1.0)]);
        let system = ControlledSystem::new(
            controller,
            |_, s| s.apply(&[DataStateUpdate::new(0, s.get(0) * 10.0)]),
            DataState::new(vec![1.0]),
        )
        .with_feedback(|_, s| s.apply(&[DataStateUpdate::new(1, s.get(0) - 1.0)]));

        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let next = system.sample_next(&mut rng).unwrap();
        assert_eq!(next.data_state().values(), &[20.0, 19.0]);
        assert_eq!(next.data_state().step(), 1);
        assert_eq!(system.data_state().step(), 0);
    }
}

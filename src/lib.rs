//! Statistical model checking of robustness properties.
//!
//! A system is simulated forward under randomness into an
//! [`EvolutionSequence`] of [`SampleSet`]s. Perturbing that sequence with a
//! [`Perturbation`] yields a second sequence, and [`DistanceExpression`]s
//! measure how far the two drift apart. [`RobustnessFormula`]s assert bounds
//! on those distances over time and are checked either exactly
//! ([`BooleanSemantics`]) or statistically ([`ThreeValuedSemantics`]).

pub mod config;
pub mod controller;
pub mod data;
pub mod distance;
pub mod error;
pub mod evolution;
pub mod formula;
pub mod perturbation;
pub mod registry;
pub mod sample;
pub mod semantics;
pub mod stats;
pub mod system;

pub use config::EvaluationConfig;
pub use controller::{Controller, ControllerId, ControllerRegistry, ControllerTable};
pub use data::{DataState, DataStateUpdate};
pub use distance::{DistanceExpression, RelationOperator};
pub use error::{Error, Result};
pub use evolution::{EvolutionSequence, SequenceMonitor};
pub use formula::{RobustnessFormula, TruthValue};
pub use perturbation::Perturbation;
pub use registry::Registry;
pub use sample::{GroundDistance, Penalty, SampleSet};
pub use semantics::{BooleanSemantics, ThreeValuedSemantics};
pub use stats::ConfidenceInterval;
pub use system::{ControlledSystem, DataStateFunction, SystemState};

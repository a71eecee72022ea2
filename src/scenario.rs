//! Demo scenario: a tank whose level is kept between two bounds by a
//! two-mode controller, perturbed by noise on the level.

use anyhow::{Context, Result};
use rand_distr::{Distribution, Normal};
use robtl::config::check_num;
use robtl::{
    ControlledSystem, ControllerRegistry, DataState, DataStateUpdate, DistanceExpression,
    EvaluationConfig, EvolutionSequence, Perturbation, Registry, RelationOperator,
    RobustnessFormula,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

const LEVEL: usize = 0;
const VALVE: usize = 1;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    pub initial_level: f64,
    /// The controller opens the valve below this level.
    pub low: f64,
    /// The controller closes the valve above this level.
    pub high: f64,
    /// Level upper bound, used to normalize distances to `[0, 1]`.
    pub max_level: f64,
    pub inflow: f64,
    pub outflow: f64,
    /// Standard deviation of the environment noise.
    pub noise: f64,

    pub perturbation_delay: usize,
    pub perturbation_duration: usize,
    pub perturbation_std_dev: f64,

    /// Length of the window of the checked property.
    pub window: usize,
    pub threshold: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    pub scenario: ScenarioConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config
            .evaluation
            .validate()
            .context("failed to validate evaluation config")?;
        config
            .scenario
            .validate()
            .context("failed to validate scenario config")?;

        Ok(config)
    }
}

impl ScenarioConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.max_level, 0.0..1e6).context("invalid maximum level")?;
        check_num(self.initial_level, 0.0..=self.max_level).context("invalid initial level")?;
        check_num(self.low, 0.0..=self.high).context("invalid low level")?;
        check_num(self.high, self.low..=self.max_level).context("invalid high level")?;
        check_num(self.inflow, 0.0..self.max_level).context("invalid inflow")?;
        check_num(self.outflow, 0.0..self.max_level).context("invalid outflow")?;
        check_num(self.noise, 0.0..self.max_level).context("invalid noise")?;
        check_num(self.perturbation_std_dev, 0.0..self.max_level)
            .context("invalid perturbation standard deviation")?;
        check_num(self.threshold, 0.0..=1.0).context("invalid threshold")?;
        Ok(())
    }
}

pub struct Scenario {
    cfg: Config,
    registry: Registry,
}

impl Scenario {
    pub fn new(cfg: Config) -> Result<Self> {
        let sc = &cfg.scenario;
        let max_level = sc.max_level;
        let level = move |state: &DataState| state.get(LEVEL) / max_level;

        let perturbation = Perturbation::after(
            sc.perturbation_delay,
            Perturbation::gaussian_noise(sc.perturbation_duration, LEVEL, sc.perturbation_std_dev)
                .context("failed to build level perturbation")?,
        );
        let window = DistanceExpression::max_interval(DistanceExpression::leq(level), 0, sc.window)
            .context("failed to build distance")?;

        let mut registry = Registry::new();
        registry
            .add_perturbation("level_noise", perturbation)
            .add_distance("level_rise", window);
        let robust = registry
            .atomic_formula("level_noise", "level_rise", RelationOperator::Leq, sc.threshold)
            .context("failed to build formula")?;
        registry.add_formula("robust", robust);

        Ok(Self { cfg, registry })
    }

    pub fn evaluation(&self) -> &EvaluationConfig {
        &self.cfg.evaluation
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn formula(&self) -> Result<&RobustnessFormula> {
        Ok(self.registry.formula("robust")?)
    }

    /// Nominal sequence of the tank.
    pub fn sequence(&self) -> Result<EvolutionSequence<ControlledSystem>> {
        let sc = self.cfg.scenario.clone();

        let mut controllers = ControllerRegistry::new();
        let fill = controllers.declare("fill");
        let drain = controllers.declare("drain");
        let high = sc.high;
        controllers.bind(fill, move |_, state| {
            if state.get(LEVEL) >= high {
                (vec![DataStateUpdate::new(VALVE, 0.0)], drain)
            } else {
                (vec![DataStateUpdate::new(VALVE, 1.0)], fill)
            }
        })?;
        let low = sc.low;
        controllers.bind(drain, move |_, state| {
            if state.get(LEVEL) <= low {
                (vec![DataStateUpdate::new(VALVE, 1.0)], fill)
            } else {
                (vec![DataStateUpdate::new(VALVE, 0.0)], drain)
            }
        })?;
        let controller = controllers.build()?.controller(fill)?;

        let noise = Normal::new(0.0, sc.noise).context("failed to build environment noise")?;
        let environment = move |rng: &mut dyn rand::RngCore, state: &DataState| {
            let flow = sc.inflow * state.get(VALVE) - sc.outflow;
            let level = (state.get(LEVEL) + flow + noise.sample(rng)).clamp(0.0, sc.max_level);
            state.apply(&[DataStateUpdate::new(LEVEL, level)])
        };

        let initial = ControlledSystem::new(
            controller,
            environment,
            DataState::new(vec![self.cfg.scenario.initial_level, 0.0]),
        );
        let ev = &self.cfg.evaluation;
        Ok(EvolutionSequence::new(ev.rng(), &initial, ev.sample_size))
    }
}

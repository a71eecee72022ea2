use crate::semantics::{BooleanSemantics, ThreeValuedSemantics};
use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Evaluation parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`EvaluationConfig::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Number of samples in each nominal sample set.
    pub sample_size: usize,
    /// Replication factor of perturbed sample sets.
    pub scale: usize,
    /// Seed of the random generator driving the simulation.
    pub seed: u64,

    /// Number of bootstrap repetitions.
    pub bootstrap_samples: usize,
    /// Normal quantile of the confidence intervals.
    pub z: f64,

    /// Number of steps generated eagerly before evaluation.
    pub horizon: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            scale: 1,
            seed: 0,
            bootstrap_samples: 50,
            z: 1.96,
            horizon: 0,
        }
    }
}

impl EvaluationConfig {
    /// Load an [`EvaluationConfig`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to deserialize config")?;
        config.validate().context("failed to validate config")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.sample_size, 1..=1_000_000).context("invalid sample size")?;
        check_num(self.scale, 1..=1_000).context("invalid scale")?;
        check_num(self.bootstrap_samples, 2..=100_000)
            .context("invalid number of bootstrap samples")?;
        check_num(self.z, 0.0..10.0).context("invalid quantile")?;
        check_num(self.horizon, 0..=1_000_000).context("invalid horizon")?;
        Ok(())
    }

    pub fn rng(&self) -> ChaCha12Rng {
        ChaCha12Rng::seed_from_u64(self.seed)
    }

    pub fn boolean_semantics(&self) -> Result<BooleanSemantics> {
        Ok(BooleanSemantics::new(self.scale)?)
    }

    pub fn three_valued_semantics(&self) -> Result<ThreeValuedSemantics> {
        Ok(ThreeValuedSemantics::new(
            self.scale,
            self.bootstrap_samples,
            self.z,
        )?)
    }
}

/// Fail unless `num` lies in `range`.
pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

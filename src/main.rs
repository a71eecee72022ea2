mod scenario;

use crate::scenario::{Config, Scenario};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use robtl::DataState;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the nominal sequence and report the average level per step.
    Simulate {
        #[arg(long)]
        steps: usize,
    },

    /// Report the distance between the nominal and perturbed sequences.
    Distance {
        #[arg(long, default_value_t = 0)]
        step: usize,
    },

    /// Check the robustness formula with both semantics.
    Check {
        #[arg(long, default_value_t = 0)]
        step: usize,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let cfg = Config::from_file(&args.config).context("failed to construct cfg")?;
    log::info!("{cfg:#?}");

    let scenario = Scenario::new(cfg).context("failed to construct scenario")?;
    let seq = scenario.sequence().context("failed to construct sequence")?;
    seq.generate_up_to(scenario.evaluation().horizon)
        .context("failed to generate sequence")?;

    match args.command {
        Command::Simulate { steps } => {
            for step in 0..=steps {
                let sample_set = seq.get(step).context("failed to generate step")?;
                let mean = sample_set.mean(|state: &DataState| state.get(0));
                log::info!("step {step:04}: average level {mean:.6}");
            }
        }
        Command::Distance { step } => {
            let registry = scenario.registry();
            let distance = registry.distance("level_rise")?;
            let perturbed = seq
                .apply(registry.perturbation("level_noise"), step, scenario.evaluation().scale)
                .context("failed to perturb sequence")?;
            let value = distance
                .compute(step, &seq, &perturbed)
                .context("failed to compute distance")?;
            log::info!("distance at step {step}: {value:.6}");
        }
        Command::Check { step } => {
            let formula = scenario.formula()?;
            let ev = scenario.evaluation();

            let exact = ev
                .boolean_semantics()?
                .eval(formula, step, &seq)
                .context("failed to evaluate boolean semantics")?;
            log::info!("boolean verdict at step {step}: {exact}");

            let mut rng = ev.rng();
            let statistical = ev
                .three_valued_semantics()?
                .eval(&mut rng, formula, step, &seq)
                .context("failed to evaluate three-valued semantics")?;
            log::info!("three-valued verdict at step {step}: {statistical}");
        }
    }

    Ok(())
}

//! CLI wiring for the matmul-rl toolkit.

use crate::checkpoint::Checkpoint;
use crate::config::{DynamicsConfig, TrainConfig};
use crate::trainer::Trainer;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use matmul_rl_env::{EnvConfig, MatmulEnv};
use matmul_rl_eval::{render_latex, Verifier};
use matmul_rl_factors::{crossover, load_triples, mutate_factor, save_triples, SeedKind, MATRIX_DIM};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "matmul-rl",
    about = "Search for low-rank 4x4 matrix multiplication algorithms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynamicsArg {
    Simulated,
    Verified,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedArg {
    Naive,
    Identity,
}

impl From<SeedArg> for SeedKind {
    fn from(value: SeedArg) -> SeedKind {
        match value {
            SeedArg::Naive => SeedKind::Naive,
            SeedArg::Identity => SeedKind::Identity,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train a policy and write checkpoints to <results-dir>/<run-id>/.
    Train {
        /// JSON config; flags given here override its values.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        max_iterations: Option<usize>,
        #[arg(long)]
        num_workers: Option<usize>,
        #[arg(long)]
        results_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        dynamics: Option<DynamicsArg>,
        /// Starting candidate for verified dynamics.
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Continue from a checkpoint file.
        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Verify a candidate JSON file and print the report.
    Verify {
        file: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print a LaTeX table of a candidate's factors.
    RenderLatex { file: PathBuf },
    /// Write a known-correct seed candidate.
    Seed {
        #[arg(long, value_enum, default_value = "naive")]
        kind: SeedArg,
        #[arg(long)]
        output: PathBuf,
    },
    /// Add Gaussian noise to one factor of one triple.
    Mutate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = matmul_rl_factors::DEFAULT_SIGMA)]
        sigma: f64,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// One-point crossover of two candidates.
    Crossover {
        #[arg(long)]
        first: PathBuf,
        #[arg(long)]
        second: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play random-policy episodes of the simulated environment.
    Rollout {
        #[arg(long, default_value_t = 1)]
        episodes: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 128)]
        max_steps: usize,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match cli.command {
        Command::Train {
            config,
            run_id,
            max_iterations,
            num_workers,
            results_dir,
            dynamics,
            seed_file,
            seed,
            resume,
        } => {
            let mut train_config = match config {
                Some(path) => TrainConfig::load_from_file(path)?,
                None => TrainConfig::default(),
            };
            if let Some(run_id) = run_id {
                train_config.run_id = run_id;
            }
            if let Some(n) = max_iterations {
                train_config.max_iterations = n;
            }
            if let Some(n) = num_workers {
                train_config.num_workers = n;
            }
            if let Some(dir) = results_dir {
                train_config.results_dir = dir;
            }
            if let Some(seed) = seed {
                train_config.seed = seed;
            }
            apply_dynamics_override(&mut train_config, dynamics, seed_file)?;

            let mut trainer = match resume {
                Some(path) => Trainer::resume(train_config, Checkpoint::load(path)?)?,
                None => Trainer::new(train_config)?,
            };
            let summary = trainer.run()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Verify { file, report } => {
            let triples = load_triples(&file)?;
            let verification = Verifier::new(MATRIX_DIM).verify(&triples);
            println!("{}", serde_json::to_string_pretty(&verification)?);
            if let Some(path) = report {
                verification.save(path)?;
            }
            if !verification.passed() {
                bail!(
                    "{} does not verify: {}",
                    file.display(),
                    verification.failure_reason().unwrap_or("unknown")
                );
            }
        }
        Command::RenderLatex { file } => {
            let triples = load_triples(&file)?;
            print!("{}", render_latex(&triples));
        }
        Command::Seed { kind, output } => {
            let triples = SeedKind::from(kind).build(MATRIX_DIM);
            save_triples(&output, &triples)?;
            info!(rank = triples.len(), path = %output.display(), "seed written");
        }
        Command::Mutate {
            input,
            output,
            sigma,
            seed,
        } => {
            let triples = load_triples(&input)?;
            let mut rng = rng_from(seed);
            let mutated = mutate_factor(&triples, sigma, &mut rng)?;
            save_triples(&output, &mutated)?;
            info!(rank = mutated.len(), path = %output.display(), "mutated candidate written");
        }
        Command::Crossover {
            first,
            second,
            output,
            seed,
        } => {
            let first = load_triples(&first)?;
            let second = load_triples(&second)?;
            let mut rng = rng_from(seed);
            let child = crossover(&first, &second, &mut rng)?;
            save_triples(&output, &child)?;
            info!(rank = child.len(), path = %output.display(), "offspring written");
        }
        Command::Rollout {
            episodes,
            seed,
            max_steps,
        } => {
            let config = EnvConfig {
                max_steps,
                seed,
                ..EnvConfig::default()
            };
            let mut env = MatmulEnv::new(config)?;
            for episode in 0..episodes {
                env.reset(None);
                let mut total = 0.0;
                loop {
                    let space = *env.action_space();
                    let action = space.sample(env.rng_mut());
                    let step = env.step(action)?;
                    total += step.reward;
                    env.render();
                    if step.done() {
                        break;
                    }
                }
                println!(
                    "episode={} reward={:.2} best_rank={} terminated={}",
                    episode,
                    total,
                    env.best_rank(),
                    env.current_rank() == env.config().rank_floor
                );
            }
        }
    }
    Ok(())
}

fn apply_dynamics_override(
    config: &mut TrainConfig,
    dynamics: Option<DynamicsArg>,
    seed_file: Option<PathBuf>,
) -> Result<()> {
    let (current_file, seed_kind) = match &config.dynamics {
        DynamicsConfig::Verified {
            seed_file,
            seed_kind,
        } => (seed_file.clone(), *seed_kind),
        DynamicsConfig::Simulated => (None, SeedKind::Naive),
    };
    match (dynamics, seed_file) {
        (Some(DynamicsArg::Simulated), Some(_)) => bail!("--seed-file requires verified dynamics"),
        (Some(DynamicsArg::Simulated), None) => config.dynamics = DynamicsConfig::Simulated,
        (Some(DynamicsArg::Verified), seed_file) | (None, seed_file @ Some(_)) => {
            config.dynamics = DynamicsConfig::Verified {
                seed_file: seed_file.or(current_file),
                seed_kind,
            };
        }
        (None, None) => {}
    }
    Ok(())
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line drills: run, torture, config.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use strata_collide::EngineConfig;
use strata_config::{ConfigService, FsConfigStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scenario::{RunOutcome, Scenario};

/// Top-level command line.
#[derive(Parser)]
#[command(name = "strata-harness")]
#[command(about = "Determinism drills for the Strata collision core")]
pub struct Cli {
    /// Directory holding `engine.json`; defaults apply when absent.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
    /// Drill to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Knobs shared by `run` and `torture`.
#[derive(Args, Debug, Clone, Copy)]
pub struct ScenarioArgs {
    /// Scenario seed
    #[arg(long, default_value_t = Scenario::default().seed)]
    pub seed: u64,
    /// Moving bodies per level
    #[arg(long, default_value_t = Scenario::default().bodies_per_level)]
    pub bodies: usize,
    /// Frames to simulate
    #[arg(long, default_value_t = Scenario::default().frames)]
    pub frames: usize,
}

impl From<ScenarioArgs> for Scenario {
    fn from(args: ScenarioArgs) -> Self {
        Self {
            seed: args.seed,
            bodies_per_level: args.bodies,
            frames: args.frames,
        }
    }
}

/// Available drills.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario once and print its frame digests as JSON
    Run {
        /// Scenario knobs.
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Run a scenario repeatedly, cycling the worker count, and fail on any
    /// digest divergence
    Torture {
        /// Scenario knobs.
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Number of runs
        #[arg(long, default_value = "20")]
        runs: u32,
    },
    /// Print the effective engine config
    Config {
        /// Also write it to `--config-dir`
        #[arg(long)]
        write: bool,
    },
}

fn load_config(dir: Option<&Path>) -> Result<EngineConfig> {
    match dir {
        Some(dir) => {
            let store = FsConfigStore::new(dir)
                .with_context(|| format!("opening config dir {}", dir.display()))?;
            Ok(EngineConfig::load(&ConfigService::new(store), EngineConfig::KEY)?)
        }
        None => {
            let config = EngineConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Repeats `scenario`, giving run `i` `1 + (i - 1) % workers` threads, and
/// compares every run's digests with the first one.
pub fn torture(scenario: &Scenario, config: &EngineConfig, runs: u32) -> Result<RunOutcome> {
    let max_workers = config.jobs.workers.max(1);
    let with_workers = |run: u32| {
        let mut config = *config;
        config.jobs.workers = 1 + (run as usize - 1) % max_workers;
        config
    };
    let baseline = scenario
        .run(&with_workers(1))
        .context("run 1 (baseline) failed")?;
    for run in 2..=runs {
        let current = scenario
            .run(&with_workers(run))
            .with_context(|| format!("run {run} failed"))?;
        if let Some(frame) = baseline.first_divergence(&current) {
            let base = baseline.digests.get(frame).map_or("<missing>", String::as_str);
            let cur = current.digests.get(frame).map_or("<missing>", String::as_str);
            warn!(run, frame, "digest divergence");
            bail!(
                "DIVERGENCE in run {run} ({} workers) at frame {frame}.\nBaseline: {base}\nCurrent:  {cur}",
                current.workers
            );
        }
    }
    info!(runs, "torture complete, all runs identical");
    Ok(baseline)
}

/// Parses the command line, installs logging and runs the chosen drill.
pub fn entrypoint() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();
    let config = load_config(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Run { scenario } => {
            let outcome = Scenario::from(scenario).run(&config)?;
            print_json(&outcome)?;
        }
        Commands::Torture { scenario, runs } => {
            if runs == 0 {
                bail!("--runs must be at least 1");
            }
            let outcome = torture(&Scenario::from(scenario), &config, runs)?;
            let mut out = std::io::stdout().lock();
            writeln!(
                out,
                "torture: {runs} runs identical over {} frames, final {}",
                outcome.digests.len(),
                outcome.final_digest().unwrap_or("<none>")
            )?;
        }
        Commands::Config { write } => {
            if write {
                let Some(dir) = cli.config_dir.as_deref() else {
                    bail!("--write needs --config-dir");
                };
                ConfigService::new(FsConfigStore::new(dir)?).save(EngineConfig::KEY, &config)?;
                info!(dir = %dir.display(), "engine config written");
            }
            print_json(&config)?;
        }
    }
    Ok(())
}

//! Network Cascade Simulator
//!
//! Runs replicates of the tie-adjusting cascade model for one or more source
//! correlations and writes every replicate's tables to the output directory.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cascade_core::config::{NetworkType, RewiringPolicy, SimConfig};
use cascade_core::{batch_jobs, run_batch, JsonDirSink};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "cascade_sim")]
#[command(about = "Information cascades on a self-rewiring social network")]
struct Args {
    /// TOML configuration file (defaults to ./cascade.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of replicates per gamma
    #[arg(long)]
    replicates: Option<u32>,

    /// Id of the first replicate
    #[arg(long)]
    replicate_start: Option<u32>,

    /// Source correlation; repeat to sweep several values
    #[arg(long, allow_hyphen_values = true)]
    gamma: Vec<f64>,

    /// Population size
    #[arg(long)]
    n: Option<usize>,

    /// Mean out-degree of the initial network
    #[arg(long)]
    k: Option<usize>,

    /// Probability that an individual samples its source
    #[arg(long)]
    psi: Option<f64>,

    /// Tie-formation probability for the break-and-make policy
    #[arg(long)]
    p: Option<f64>,

    /// Number of timesteps to simulate
    #[arg(long)]
    timesteps: Option<u64>,

    #[arg(long, value_enum)]
    network_type: Option<NetworkType>,

    #[arg(long, value_enum)]
    rewiring: Option<RewiringPolicy>,

    /// Output directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Worker threads
    #[arg(long)]
    jobs: Option<usize>,
}

impl Args {
    fn apply(self, config: &mut SimConfig) {
        let model = &mut config.model;
        let run = &mut config.run;
        if let Some(v) = self.replicates {
            run.replicates = v;
        }
        if let Some(v) = self.replicate_start {
            run.replicate_start = v;
        }
        if !self.gamma.is_empty() {
            run.gammas = self.gamma;
        }
        if let Some(v) = self.n {
            model.n = v;
        }
        if let Some(v) = self.k {
            model.k = v;
        }
        if let Some(v) = self.psi {
            model.psi = v;
        }
        if let Some(v) = self.p {
            model.p = v;
        }
        if let Some(v) = self.timesteps {
            model.timesteps = v;
        }
        if let Some(v) = self.network_type {
            model.network_type = v;
        }
        if let Some(v) = self.rewiring {
            model.rewiring = v;
        }
        if let Some(v) = self.out {
            run.output_dir = v;
        }
        if let Some(v) = self.jobs {
            run.jobs = v;
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let loaded = match &args.config {
        Some(path) => SimConfig::load(path),
        None => SimConfig::load_or_default(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("could not load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    let jobs = match batch_jobs(&config) {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        replicates = jobs.len(),
        n = config.model.n,
        k = config.model.k,
        psi = config.model.psi,
        timesteps = config.model.timesteps,
        network_type = ?config.model.network_type,
        rewiring = ?config.model.rewiring,
        output = %config.run.output_dir.display(),
        "starting batch"
    );

    let sink = Mutex::new(JsonDirSink::new(config.run.output_dir.clone()));
    let report = match run_batch(&config, &sink) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let sink = sink.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    tracing::info!(
        completed = report.completed,
        failed = report.failed,
        written = sink.replicates_written(),
        run_id = %sink.run_id(),
        output = %sink.root().display(),
        "batch finished"
    );
    if report.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

//! Replicate Batches
//!
//! Runs every `(gamma, replicate)` pair of a configuration on a rayon pool
//! sized by `run.jobs`. Replicates share nothing but the sink.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

use crate::config::{ConfigError, ModelParams, SimConfig};
use crate::output::PersistenceSink;
use crate::simulation::Simulation;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub scheduled: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Every `(replicate, gamma)` pair, gamma-major.
pub fn batch_jobs(config: &SimConfig) -> Result<Vec<(u32, f64)>, ConfigError> {
    config.validate()?;
    let replicates = config
        .run
        .replicate_range()
        .ok_or(ConfigError::InvalidParameter {
            name: "replicates",
            reason: "replicate_start + replicates overflows u32",
        })?;
    Ok(config
        .gammas()
        .into_iter()
        .flat_map(|gamma| replicates.clone().map(move |r| (r, gamma)))
        .collect())
}

/// Runs the batch and hands each replicate to `sink` as it finishes.
///
/// A replicate that fails to start or persist is logged and counted; the rest
/// of the batch still runs.
pub fn run_batch<S: PersistenceSink + Send>(
    config: &SimConfig,
    sink: &Mutex<S>,
) -> Result<BatchReport, BatchError> {
    let jobs = batch_jobs(config)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.run.jobs.min(jobs.len()).max(1))
        .build()?;
    let failures = AtomicUsize::new(0);

    pool.install(|| {
        jobs.par_iter().for_each(|&(replicate, gamma)| {
            let params = ModelParams {
                gamma,
                ..config.model.clone()
            };
            let output = match Simulation::new(replicate, params) {
                Ok(sim) => sim.run(),
                Err(e) => {
                    tracing::error!(replicate, gamma, "could not start replicate: {}", e);
                    failures.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            };
            let persisted = match sink.lock() {
                Ok(mut sink) => sink.persist(&output),
                Err(poisoned) => poisoned.into_inner().persist(&output),
            };
            if let Err(e) = persisted {
                tracing::warn!(replicate, gamma, "could not write output: {}", e);
                failures.fetch_add(1, Ordering::Relaxed);
            }
        });
    });

    let failed = failures.load(Ordering::Relaxed);
    Ok(BatchReport {
        scheduled: jobs.len(),
        completed: jobs.len() - failed,
        failed,
    })
}

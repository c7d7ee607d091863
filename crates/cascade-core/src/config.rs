//! Configuration System
//!
//! Loads model parameters from `cascade.toml` so runs can be tuned without
//! recompiling. Parameter ranges are checked here, before any replicate starts.

use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "cascade.toml";

/// Timesteps recorded at each end of a run
pub const DEFAULT_STATS_WINDOW: u64 = 5000;

/// Trial cascades used for the end-of-run fitness estimate
pub const DEFAULT_FITNESS_TRIALS: u64 = 10_000;

/// Shape of the initial social network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    #[default]
    Random,
    #[serde(alias = "scalefree")]
    #[value(alias = "scalefree")]
    ScaleFree,
}

/// How the network reacts to an incorrect individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RewiringPolicy {
    /// Break a tie to an active neighbor, then form one random tie only if a
    /// tie was broken.
    #[default]
    AdjustTie,
    /// Break as above, then independently form a tie with probability `p`.
    BreakAndMake,
}

/// Parameters of one replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Population size
    pub n: usize,
    /// Mean out-degree of the initial network
    pub k: usize,
    /// Correlation between the two information sources
    pub gamma: f64,
    /// Probability that an individual samples its source directly
    pub psi: f64,
    /// Tie-formation probability, only read by `BreakAndMake`
    pub p: f64,
    pub timesteps: u64,
    pub network_type: NetworkType,
    pub rewiring: RewiringPolicy,
    pub threshold_lower: f64,
    pub threshold_upper: f64,
    pub stats_window: u64,
    pub fitness_trials: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n: 200,
            k: 5,
            gamma: 0.0,
            psi: 0.1,
            p: 0.0,
            timesteps: 100_000,
            network_type: NetworkType::Random,
            rewiring: RewiringPolicy::AdjustTie,
            threshold_lower: 0.0,
            threshold_upper: 1.0,
            stats_window: DEFAULT_STATS_WINDOW,
            fitness_trials: DEFAULT_FITNESS_TRIALS,
        }
    }
}

impl ModelParams {
    /// Rejects parameter values the model is not defined for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n == 0 {
            return Err(ConfigError::invalid("n", "must be positive"));
        }
        if self.k == 0 {
            return Err(ConfigError::invalid("k", "must be positive"));
        }
        if self.k >= self.n {
            return Err(ConfigError::invalid("k", "must be smaller than n"));
        }
        if !(-1.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::invalid("gamma", "must lie in [-1, 1]"));
        }
        if !(self.psi > 0.0 && self.psi <= 1.0) {
            return Err(ConfigError::invalid("psi", "must lie in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.p) {
            return Err(ConfigError::invalid("p", "must lie in [0, 1]"));
        }
        if !(0.0 <= self.threshold_lower
            && self.threshold_lower <= self.threshold_upper
            && self.threshold_upper <= 1.0)
        {
            return Err(ConfigError::invalid(
                "threshold bounds",
                "must satisfy 0 <= lower <= upper <= 1",
            ));
        }
        if self.stats_window == 0 {
            return Err(ConfigError::invalid("stats_window", "must be positive"));
        }
        Ok(())
    }
}

/// Batch settings: which replicates and gammas to run and where output goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub replicate_start: u32,
    pub replicates: u32,
    /// Each gamma is run for every replicate; overrides `model.gamma`
    pub gammas: Vec<f64>,
    pub output_dir: PathBuf,
    /// Worker threads; replicates are independent
    pub jobs: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            replicate_start: 0,
            replicates: 1,
            gammas: Vec::new(),
            output_dir: PathBuf::from("output"),
            jobs: 1,
        }
    }
}

impl RunConfig {
    /// Replicate indices to run, or `None` if the range overflows `u32`.
    pub fn replicate_range(&self) -> Option<Range<u32>> {
        let end = self.replicate_start.checked_add(self.replicates)?;
        Some(self.replicate_start..end)
    }
}

/// Top-level configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub model: ModelParams,
    #[serde(default)]
    pub run: RunConfig,
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from the default path, or fall back to defaults if it is missing
    pub fn load_or_default() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load(DEFAULT_CONFIG_PATH)
        } else {
            tracing::info!("{} not found, using defaults", DEFAULT_CONFIG_PATH);
            Ok(Self::default())
        }
    }

    /// The gammas to sweep; falls back to `model.gamma`
    pub fn gammas(&self) -> Vec<f64> {
        if self.run.gammas.is_empty() {
            vec![self.model.gamma]
        } else {
            self.run.gammas.clone()
        }
    }

    /// Validates the model for every gamma in the sweep
    pub fn validate(&self) -> Result<(), ConfigError> {
        for gamma in self.gammas() {
            ModelParams {
                gamma,
                ..self.model.clone()
            }
            .validate()?;
        }
        if self.run.jobs == 0 {
            return Err(ConfigError::invalid("jobs", "must be positive"));
        }
        if self.run.replicate_range().is_none() {
            return Err(ConfigError::invalid(
                "replicates",
                "replicate_start + replicates overflows u32",
            ));
        }
        Ok(())
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: &'static str) -> Self {
        ConfigError::InvalidParameter { name, reason }
    }
}

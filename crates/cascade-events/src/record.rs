//! Record Types
//!
//! Fixed-schema rows for the tables a replicate produces: windowed cascade
//! statistics, the per-individual behavior tally and the two fitness tables.

use serde::{Deserialize, Serialize};

/// Which of the two correlated information sources an individual attends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    A,
    B,
}

impl SourceType {
    /// One-hot weight vector over both sources.
    pub fn weights(self) -> [f64; 2] {
        match self {
            SourceType::A => [1.0, 0.0],
            SourceType::B => [0.0, 1.0],
        }
    }
}

/// Cascade statistics for a single timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CascadeRecord {
    pub t: u64,
    /// Individuals who sampled a source directly
    pub samplers: u32,
    /// Samplers whose own source exceeded their threshold
    pub samplers_active: u32,
    pub sampler_a: u32,
    pub sampler_b: u32,
    /// Active individuals after the cascade settled
    pub total_active: u32,
    pub active_a: u32,
    pub active_b: u32,
}

/// Behavior counts for one individual over a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BehaviorRecord {
    pub individual: u32,
    pub true_positive: u64,
    pub false_negative: u64,
    pub true_negative: u64,
    pub false_positive: u64,
}

impl BehaviorRecord {
    pub fn total(&self) -> u64 {
        self.true_positive + self.false_negative + self.true_negative + self.false_positive
    }

    /// Fraction of evaluations where realized behavior matched the optimum.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positive + self.true_negative) as f64 / total as f64
    }
}

/// Behavioral fitness of one individual, estimated over trial cascades.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessBehaviorRecord {
    pub individual: u32,
    pub true_positive: u64,
    pub false_negative: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub accuracy: f64,
}

impl From<BehaviorRecord> for FitnessBehaviorRecord {
    fn from(record: BehaviorRecord) -> Self {
        Self {
            individual: record.individual,
            true_positive: record.true_positive,
            false_negative: record.false_negative,
            true_negative: record.true_negative,
            false_positive: record.false_positive,
            accuracy: record.accuracy(),
        }
    }
}

/// Cascade size of one fitness trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FitnessCascadeRecord {
    pub trial: u64,
    pub samplers: u32,
    pub samplers_active: u32,
    pub sampler_a: u32,
    pub sampler_b: u32,
    pub total_active: u32,
    pub active_a: u32,
    pub active_b: u32,
}

impl FitnessCascadeRecord {
    pub fn from_cascade(trial: u64, record: &CascadeRecord) -> Self {
        Self {
            trial,
            samplers: record.samplers,
            samplers_active: record.samplers_active,
            sampler_a: record.sampler_a,
            sampler_b: record.sampler_b,
            total_active: record.total_active,
            active_a: record.active_a,
            active_b: record.active_b,
        }
    }
}

/// Aggregates over the fitness trials.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub trials: u64,
    /// Mean number of active individuals per trial
    pub mean_cascade_size: f64,
    /// Mean cascade size as a fraction of the population
    pub mean_cascade_fraction: f64,
    /// Population mean of per-individual accuracy
    pub mean_accuracy: f64,
}

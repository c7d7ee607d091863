//! Network Cascade Simulation Engine
//!
//! Information cascades over a social network that rewires itself: individuals
//! who are misled by active neighbors cut those ties, and the network
//! reorganizes around the correctness of the behavior it spreads.
//!
//! # Per-timestep pipeline
//!
//! ```text
//! stimulus ──▶ cascade ──▶ stats (windowed) ──▶ behavior ──▶ rewiring
//! ```
//!
//! Every random draw comes from one explicitly passed [`SimRng`], seeded per
//! replicate with [`derive_seed`].

use rand::rngs::SmallRng;
use rand::SeedableRng;

pub mod batch;
pub mod behavior;
pub mod cascade;
pub mod config;
pub mod fitness;
pub mod network;
pub mod output;
pub mod population;
pub mod rewiring;
pub mod simulation;
pub mod stats;
pub mod stimulus;

pub use batch::{batch_jobs, run_batch, BatchError, BatchReport};
pub use behavior::{BehaviorAccumulator, Evaluation, Outcome};
pub use cascade::{propagate, Propagation};
pub use config::{ConfigError, ModelParams, NetworkType, RewiringPolicy, RunConfig, SimConfig};
pub use fitness::{assess_fitness, FitnessAssessment};
pub use network::{seed_social_network, Network, NetworkError};
pub use output::{JsonDirSink, MemorySink, OutputError, PersistenceSink};
pub use population::{assign_type, seed_thresholds, Population, PopulationError};
pub use rewiring::{adjust_tie, break_tie, make_tie, TieAdjustment, TieFormation};
pub use simulation::{ReplicateOutput, Simulation, SimulationError, StepReport};
pub use stats::{cascade_record, StatsWindow};
pub use stimulus::{sample_stimulus, Sampling, Stimulus};

pub use cascade_events::{
    AdjacencySnapshot, BehaviorRecord, CascadeRecord, FitnessBehaviorRecord, FitnessCascadeRecord,
    FitnessSummary, ReplicateKey, SourceType,
};

/// Seeded random stream threaded through every component of a replicate.
pub type SimRng = SmallRng;

/// Multiplier applied to `replicate + 1 + gamma` when deriving a seed.
pub const SEED_SCALE: f64 = 323.0;

/// Seed for a replicate: `trunc((replicate + 1 + gamma) * 323)`.
///
/// Gamma is bounded to `[-1, 1]` so the product is never negative.
pub fn derive_seed(replicate: u32, gamma: f64) -> u64 {
    ((replicate as f64 + 1.0 + gamma) * SEED_SCALE) as u64
}

/// Builds the random stream for a replicate.
pub fn replicate_rng(replicate: u32, gamma: f64) -> SimRng {
    SmallRng::seed_from_u64(derive_seed(replicate, gamma))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_seed() {
        assert_eq!(derive_seed(0, 0.0), 323);
        assert_eq!(derive_seed(1, 0.0), 646);
        assert_eq!(derive_seed(0, -1.0), 0);
        assert_eq!(derive_seed(2, 0.5), 1130);
    }

    #[test]
    fn test_distinct_gammas_get_distinct_seeds() {
        assert_ne!(derive_seed(0, 0.1), derive_seed(0, 0.2));
    }
}

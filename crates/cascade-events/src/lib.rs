//! Shared record types for the network cascade simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! Everything a replicate hands to a persistence sink is defined here so that
//! downstream analysis tools can read the output without linking the engine.

pub mod key;
pub mod record;
pub mod snapshot;

pub use key::{format_gamma, ReplicateKey};

pub use record::{
    BehaviorRecord, CascadeRecord, FitnessBehaviorRecord, FitnessCascadeRecord, FitnessSummary,
    SourceType,
};

pub use snapshot::AdjacencySnapshot;

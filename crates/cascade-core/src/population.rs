//! Population Setup
//!
//! Per-individual thresholds and source types. Both are drawn once per
//! replicate and stay fixed for the rest of the run.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use cascade_events::SourceType;

use crate::SimRng;

/// Errors assembling a population from external vectors.
#[derive(Debug, Error, PartialEq)]
pub enum PopulationError {
    #[error("{thresholds} thresholds but {types} types")]
    LengthMismatch { thresholds: usize, types: usize },
    #[error("threshold {value} of individual {individual} is outside [0, 1]")]
    ThresholdOutOfRange { individual: usize, value: f64 },
}

/// Immutable per-individual attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    thresholds: Vec<f64>,
    types: Vec<SourceType>,
}

impl Population {
    pub fn new(thresholds: Vec<f64>, types: Vec<SourceType>) -> Result<Self, PopulationError> {
        if thresholds.len() != types.len() {
            return Err(PopulationError::LengthMismatch {
                thresholds: thresholds.len(),
                types: types.len(),
            });
        }
        if let Some((individual, &value)) = thresholds
            .iter()
            .enumerate()
            .find(|(_, t)| !(0.0..=1.0).contains(*t))
        {
            return Err(PopulationError::ThresholdOutOfRange { individual, value });
        }
        Ok(Self { thresholds, types })
    }

    /// Draws thresholds then types, in that order.
    pub fn seed(n: usize, lower: f64, upper: f64, rng: &mut SimRng) -> Self {
        let thresholds = seed_thresholds(n, lower, upper, rng);
        let types = assign_type(n, rng);
        Self { thresholds, types }
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn types(&self) -> &[SourceType] {
        &self.types
    }

    pub fn threshold(&self, individual: usize) -> f64 {
        self.thresholds[individual]
    }

    pub fn source_type(&self, individual: usize) -> SourceType {
        self.types[individual]
    }
}

/// Uniform thresholds in `[lower, upper]`.
pub fn seed_thresholds(n: usize, lower: f64, upper: f64, rng: &mut SimRng) -> Vec<f64> {
    (0..n).map(|_| lower + (upper - lower) * rng.gen::<f64>()).collect()
}

/// Splits the population evenly between the two sources (A gets the odd one
/// out) and shuffles the assignment.
pub fn assign_type(n: usize, rng: &mut SimRng) -> Vec<SourceType> {
    let a_count = n.div_ceil(2);
    let mut types: Vec<SourceType> = (0..n)
        .map(|i| if i < a_count { SourceType::A } else { SourceType::B })
        .collect();
    types.shuffle(rng);
    types
}

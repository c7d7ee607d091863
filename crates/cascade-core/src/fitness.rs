//! Fitness Assessment
//!
//! Estimates how well the final network serves its members by running trial
//! cascades on it with rewiring switched off.

use cascade_events::{FitnessBehaviorRecord, FitnessCascadeRecord, FitnessSummary};

use crate::behavior::BehaviorAccumulator;
use crate::cascade::propagate;
use crate::network::Network;
use crate::population::Population;
use crate::stats::cascade_record;
use crate::stimulus::sample_stimulus;
use crate::SimRng;

/// The two fitness tables plus their aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessAssessment {
    pub behavior: Vec<FitnessBehaviorRecord>,
    pub cascades: Vec<FitnessCascadeRecord>,
    pub summary: FitnessSummary,
}

/// Runs `trial_count` independent sample, propagate and evaluate trials.
/// The network is only read.
pub fn assess_fitness(
    gamma: f64,
    psi: f64,
    trial_count: u64,
    network: &Network,
    population: &Population,
    rng: &mut SimRng,
) -> FitnessAssessment {
    let n = population.len();
    let mut accumulator = BehaviorAccumulator::new(n);
    let mut cascades = Vec::with_capacity(trial_count as usize);
    let mut active_total = 0u64;

    for trial in 0..trial_count {
        let sampling = sample_stimulus(gamma, psi, population, rng);
        let propagation = propagate(network, sampling.states, population.thresholds());
        let record = cascade_record(
            trial,
            &sampling.samplers,
            &sampling.active_samplers,
            &propagation.states,
            population,
        );
        active_total += record.total_active as u64;
        cascades.push(FitnessCascadeRecord::from_cascade(trial, &record));
        accumulator.evaluate(&propagation.states, population, &sampling.stimulus);
    }

    let behavior: Vec<FitnessBehaviorRecord> = accumulator
        .records()
        .into_iter()
        .map(FitnessBehaviorRecord::from)
        .collect();

    let mean_cascade_size = if trial_count > 0 {
        active_total as f64 / trial_count as f64
    } else {
        0.0
    };
    let mean_accuracy = if behavior.is_empty() {
        0.0
    } else {
        behavior.iter().map(|r| r.accuracy).sum::<f64>() / behavior.len() as f64
    };

    FitnessAssessment {
        behavior,
        cascades,
        summary: FitnessSummary {
            trials: trial_count,
            mean_cascade_size,
            mean_cascade_fraction: if n > 0 { mean_cascade_size / n as f64 } else { 0.0 },
            mean_accuracy,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkType;
    use crate::network::seed_social_network;
    use rand::SeedableRng;

    #[test]
    fn test_fitness_tables_have_expected_shape() {
        let mut rng = SimRng::seed_from_u64(12);
        let population = Population::seed(30, 0.0, 1.0, &mut rng);
        let network = seed_social_network(30, 4, NetworkType::Random, &mut rng);
        let before = network.clone();

        let assessment = assess_fitness(0.3, 0.2, 200, &network, &population, &mut rng);

        assert_eq!(network, before);
        assert_eq!(assessment.behavior.len(), 30);
        assert_eq!(assessment.cascades.len(), 200);
        assert!(assessment.behavior.iter().all(|r| {
            r.true_positive + r.false_negative + r.true_negative + r.false_positive == 200
        }));
        assert_eq!(assessment.cascades[17].trial, 17);
        let summary = assessment.summary;
        assert_eq!(summary.trials, 200);
        assert!(summary.mean_cascade_size <= 30.0);
        assert!((0.0..=1.0).contains(&summary.mean_accuracy));
        assert!((summary.mean_cascade_fraction - summary.mean_cascade_size / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_trials() {
        let mut rng = SimRng::seed_from_u64(1);
        let population = Population::seed(5, 0.0, 1.0, &mut rng);
        let network = Network::empty(5);
        let assessment = assess_fitness(0.0, 0.5, 0, &network, &population, &mut rng);
        assert!(assessment.cascades.is_empty());
        assert_eq!(assessment.summary.mean_cascade_size, 0.0);
        assert!(assessment.behavior.iter().all(|r| r.accuracy == 0.0));
    }
}

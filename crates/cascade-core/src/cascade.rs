//! Cascade Propagator
//!
//! Spreads activation from the samplers through the network. An inactive
//! individual activates once the fraction of the individuals it observes that
//! are active is strictly greater than its threshold. Activation is never
//! undone, so the fixed point does not depend on scan order.

use crate::network::Network;

/// Final state of a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
    pub states: Vec<bool>,
    /// Passes that activated at least one individual
    pub rounds: usize,
}

impl Propagation {
    pub fn active_count(&self) -> usize {
        self.states.iter().filter(|&&s| s).count()
    }
}

/// Fraction of `individual`'s neighbors that are active, `None` without ties.
pub fn active_neighbor_fraction(network: &Network, states: &[bool], individual: usize) -> Option<f64> {
    let degree = network.out_degree(individual);
    if degree == 0 {
        return None;
    }
    let active = network.neighbors(individual).filter(|&j| states[j]).count();
    Some(active as f64 / degree as f64)
}

/// Runs synchronous passes until one adds no activations, at most `n` passes.
pub fn propagate(network: &Network, mut states: Vec<bool>, thresholds: &[f64]) -> Propagation {
    let n = network.size();
    let mut rounds = 0;

    for _ in 0..n {
        let newly_active: Vec<usize> = (0..n)
            .filter(|&i| !states[i])
            .filter(|&i| {
                active_neighbor_fraction(network, &states, i)
                    .is_some_and(|fraction| fraction > thresholds[i])
            })
            .collect();

        if newly_active.is_empty() {
            break;
        }
        for i in newly_active {
            states[i] = true;
        }
        rounds += 1;
    }

    Propagation { states, rounds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkType;
    use crate::network::seed_social_network;
    use crate::SimRng;
    use rand::{Rng, SeedableRng};

    /// 0 observes 1, 1 observes 2, ... so activity flows from the tail back.
    fn chain(n: usize) -> Network {
        let mut network = Network::empty(n);
        for i in 0..n - 1 {
            network.add_tie(i, i + 1);
        }
        network
    }

    #[test]
    fn test_chain_cascades_to_fixed_point() {
        let network = chain(5);
        let mut states = vec![false; 5];
        states[4] = true;
        let result = propagate(&network, states, &[0.5; 5]);
        assert_eq!(result.states, vec![true; 5]);
        assert_eq!(result.rounds, 4);
    }

    #[test]
    fn test_threshold_must_be_exceeded() {
        let network = chain(2);
        let result = propagate(&network, vec![false, true], &[1.0, 0.0]);
        assert_eq!(result.states, vec![false, true]);
        assert_eq!(result.rounds, 0);
    }

    #[test]
    fn test_isolated_individuals_stay_inactive() {
        let network = Network::empty(3);
        let result = propagate(&network, vec![true, false, false], &[0.0; 3]);
        assert_eq!(result.states, vec![true, false, false]);
    }

    #[test]
    fn test_all_inactive_input_is_tolerated() {
        let mut rng = SimRng::seed_from_u64(4);
        let network = seed_social_network(20, 3, NetworkType::Random, &mut rng);
        let result = propagate(&network, vec![false; 20], &[0.0; 20]);
        assert_eq!(result.active_count(), 0);
    }

    #[test]
    fn test_propagation_is_monotone_and_idempotent() {
        let mut rng = SimRng::seed_from_u64(21);
        for _ in 0..20 {
            let network = seed_social_network(40, 4, NetworkType::Random, &mut rng);
            let thresholds: Vec<f64> = (0..40).map(|_| rng.gen()).collect();
            let initial: Vec<bool> = (0..40).map(|_| rng.gen_bool(0.15)).collect();

            let first = propagate(&network, initial.clone(), &thresholds);
            for (before, after) in initial.iter().zip(first.states.iter()) {
                assert!(!before || *after, "activation was undone");
            }

            let second = propagate(&network, first.states.clone(), &thresholds);
            assert_eq!(second.states, first.states);
            assert_eq!(second.rounds, 0);
        }
    }

    #[test]
    fn test_fraction_uses_observed_neighbors() {
        let network = Network::from_rows(&[vec![0, 1, 1], vec![0, 0, 0], vec![0, 0, 0]]).unwrap();
        let states = vec![false, true, false];
        assert_eq!(active_neighbor_fraction(&network, &states, 0), Some(0.5));
        assert_eq!(active_neighbor_fraction(&network, &states, 1), None);
    }
}

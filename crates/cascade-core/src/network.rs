//! Network Store
//!
//! Directed adjacency matrix mutated in place across timesteps, plus the
//! seeding routines that build the initial topology.
//!
//! Direction convention: a tie `i -> j` means `i` observes `j`. The neighbors
//! of `i` are the individuals it observes, and those are the only individuals
//! whose activity `i` can perceive during a cascade.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use cascade_events::AdjacencySnapshot;

use crate::config::NetworkType;
use crate::SimRng;

/// Errors building a network from external data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("adjacency row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("self-loop on individual {0}")]
    SelfLoop(usize),
}

/// Dense directed network over `n` individuals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    size: usize,
    ties: Vec<bool>,
}

impl Network {
    /// A network with no ties.
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            ties: vec![false; size * size],
        }
    }

    /// Builds a network from dense rows, rejecting ragged input and self-loops.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, NetworkError> {
        let size = rows.len();
        let mut network = Self::empty(size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(NetworkError::NotSquare {
                    row: i,
                    len: row.len(),
                    expected: size,
                });
            }
            for (j, &value) in row.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                if i == j {
                    return Err(NetworkError::SelfLoop(i));
                }
                network.ties[i * size + j] = true;
            }
        }
        Ok(network)
    }

    pub fn from_snapshot(snapshot: &AdjacencySnapshot) -> Result<Self, NetworkError> {
        Self::from_rows(&snapshot.rows)
    }

    /// Number of individuals.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn has_tie(&self, from: usize, to: usize) -> bool {
        self.ties[from * self.size + to]
    }

    /// Adds `from -> to`. Returns false for self-loops and existing ties.
    pub fn add_tie(&mut self, from: usize, to: usize) -> bool {
        if from == to || self.has_tie(from, to) {
            return false;
        }
        self.ties[from * self.size + to] = true;
        true
    }

    /// Removes `from -> to`. Returns false if there was no such tie.
    pub fn remove_tie(&mut self, from: usize, to: usize) -> bool {
        if !self.has_tie(from, to) {
            return false;
        }
        self.ties[from * self.size + to] = false;
        true
    }

    fn row(&self, individual: usize) -> &[bool] {
        let start = individual * self.size;
        &self.ties[start..start + self.size]
    }

    /// Individuals that `individual` observes, in index order.
    pub fn neighbors(&self, individual: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(individual)
            .iter()
            .enumerate()
            .filter(|(_, &tied)| tied)
            .map(|(j, _)| j)
    }

    /// Individuals `individual` could form a new tie to (untied, not itself).
    pub fn non_neighbors(&self, individual: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(individual)
            .iter()
            .enumerate()
            .filter(move |(j, &tied)| !tied && *j != individual)
            .map(|(j, _)| j)
    }

    pub fn out_degree(&self, individual: usize) -> usize {
        self.row(individual).iter().filter(|&&tied| tied).count()
    }

    pub fn in_degree(&self, individual: usize) -> usize {
        (0..self.size).filter(|&i| self.has_tie(i, individual)).count()
    }

    pub fn out_degrees(&self) -> Vec<usize> {
        (0..self.size).map(|i| self.out_degree(i)).collect()
    }

    pub fn tie_count(&self) -> usize {
        self.ties.iter().filter(|&&tied| tied).count()
    }

    pub fn mean_out_degree(&self) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        self.tie_count() as f64 / self.size as f64
    }

    pub fn has_self_loop(&self) -> bool {
        (0..self.size).any(|i| self.has_tie(i, i))
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.size)
            .map(|i| self.row(i).iter().map(|&tied| tied as u8).collect())
            .collect()
    }

    pub fn snapshot(&self) -> AdjacencySnapshot {
        AdjacencySnapshot {
            size: self.size,
            rows: self.to_rows(),
        }
    }
}

/// Builds the initial network with mean out-degree `k`.
pub fn seed_social_network(
    n: usize,
    k: usize,
    network_type: NetworkType,
    rng: &mut SimRng,
) -> Network {
    match network_type {
        NetworkType::Random => seed_random_network(n, k, rng),
        NetworkType::ScaleFree => seed_scale_free_network(n, k, rng),
    }
}

/// Directed Erdős–Rényi graph: every ordered pair is tied with `k / (n - 1)`.
fn seed_random_network(n: usize, k: usize, rng: &mut SimRng) -> Network {
    let mut network = Network::empty(n);
    if n < 2 {
        return network;
    }
    let tie_prob = (k as f64 / (n - 1) as f64).min(1.0);
    for i in 0..n {
        for j in 0..n {
            if i != j && rng.gen::<f64>() < tie_prob {
                network.add_tie(i, j);
            }
        }
    }
    network
}

/// Directed preferential attachment: a complete core of `k + 1` individuals,
/// then each newcomer observes `k` earlier individuals picked with weight
/// `in_degree + 1`.
fn seed_scale_free_network(n: usize, k: usize, rng: &mut SimRng) -> Network {
    let mut network = Network::empty(n);
    let core = (k + 1).min(n);
    for i in 0..core {
        for j in 0..core {
            network.add_tie(i, j);
        }
    }

    let mut in_degrees: Vec<usize> = (0..n).map(|i| network.in_degree(i)).collect();
    for newcomer in core..n {
        let mut candidates: Vec<usize> = (0..newcomer).collect();
        for _ in 0..k.min(newcomer) {
            let chosen = match candidates.choose_weighted(rng, |&c| in_degrees[c] as f64 + 1.0) {
                Ok(&c) => c,
                Err(_) => break,
            };
            network.add_tie(newcomer, chosen);
            in_degrees[chosen] += 1;
            candidates.retain(|&c| c != chosen);
        }
    }
    network
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn line(n: usize) -> Network {
        let mut network = Network::empty(n);
        for i in 0..n - 1 {
            network.add_tie(i, i + 1);
        }
        network
    }

    #[test]
    fn test_add_and_remove_ties() {
        let mut network = Network::empty(4);
        assert!(network.add_tie(0, 1));
        assert!(!network.add_tie(0, 1));
        assert!(!network.add_tie(2, 2));
        assert!(network.has_tie(0, 1));
        assert!(!network.has_tie(1, 0));
        assert!(network.remove_tie(0, 1));
        assert!(!network.remove_tie(0, 1));
        assert_eq!(network.tie_count(), 0);
    }

    #[test]
    fn test_neighbors_follow_row_direction() {
        let network = line(4);
        assert_eq!(network.neighbors(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(network.out_degree(3), 0);
        assert_eq!(network.in_degree(3), 1);
        assert_eq!(network.non_neighbors(1).collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_from_rows_validates() {
        assert_eq!(
            Network::from_rows(&[vec![0, 1], vec![0]]),
            Err(NetworkError::NotSquare {
                row: 1,
                len: 1,
                expected: 2
            })
        );
        assert_eq!(
            Network::from_rows(&[vec![1, 0], vec![0, 0]]),
            Err(NetworkError::SelfLoop(0))
        );
        let network = Network::from_rows(&[vec![0, 1], vec![1, 0]]).unwrap();
        assert_eq!(network.to_rows(), vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_snapshot_matches_rows() {
        let network = line(3);
        let snapshot = network.snapshot();
        assert_eq!(snapshot.size, 3);
        assert_eq!(snapshot.tie_count(), 2);
        assert_eq!(Network::from_snapshot(&snapshot).unwrap(), network);
    }

    #[test]
    fn test_random_network_has_no_self_loops() {
        let mut rng = SimRng::seed_from_u64(7);
        let network = seed_social_network(100, 6, NetworkType::Random, &mut rng);
        assert!(!network.has_self_loop());
        let mean = network.mean_out_degree();
        assert!(mean > 4.0 && mean < 8.0, "mean out-degree {}", mean);
    }

    #[test]
    fn test_scale_free_out_degree_is_k() {
        let mut rng = SimRng::seed_from_u64(11);
        let network = seed_social_network(60, 3, NetworkType::ScaleFree, &mut rng);
        assert!(!network.has_self_loop());
        assert!(network.out_degrees().iter().all(|&d| d == 3));
        // Early individuals accumulate attention
        let early: usize = (0..4).map(|i| network.in_degree(i)).sum();
        let late: usize = (56..60).map(|i| network.in_degree(i)).sum();
        assert!(early > late);
    }
}

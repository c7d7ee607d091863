//! Adjacency Snapshots
//!
//! Serializable copy of a network at one point in a run.

use serde::{Deserialize, Serialize};

/// Dense adjacency matrix, `rows[i][j] == 1` when `i` observes `j`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencySnapshot {
    pub size: usize,
    pub rows: Vec<Vec<u8>>,
}

impl AdjacencySnapshot {
    pub fn tie_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|&&v| v != 0).count())
            .sum()
    }

    /// Ties present in `self` but not in `other`, as `(from, to)` pairs.
    pub fn ties_missing_from(&self, other: &AdjacencySnapshot) -> Vec<(usize, usize)> {
        let mut missing = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                let theirs = other.rows.get(i).and_then(|r| r.get(j)).copied().unwrap_or(0);
                if v != 0 && theirs == 0 {
                    missing.push((i, j));
                }
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_diff() {
        let before = AdjacencySnapshot {
            size: 3,
            rows: vec![vec![0, 1, 0], vec![0, 0, 1], vec![1, 0, 0]],
        };
        let after = AdjacencySnapshot {
            size: 3,
            rows: vec![vec![0, 0, 1], vec![0, 0, 1], vec![1, 0, 0]],
        };
        assert_eq!(before.tie_count(), 3);
        assert_eq!(before.ties_missing_from(&after), vec![(0, 1)]);
        assert_eq!(after.ties_missing_from(&before), vec![(0, 2)]);
    }
}

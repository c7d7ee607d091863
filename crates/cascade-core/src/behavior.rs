//! Behavior Evaluator
//!
//! Compares realized behavior with what each individual should have done had
//! it sampled its own source, and keeps a running tally per individual.

use cascade_events::BehaviorRecord;

use crate::population::Population;
use crate::stimulus::Stimulus;

/// Cross-tabulation of realized state against the optimal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Active and should have been
    TruePositive,
    /// Inactive but should have been active
    FalseNegative,
    /// Inactive and should have been
    TrueNegative,
    /// Active but should not have been
    FalsePositive,
}

impl Outcome {
    pub fn classify(active: bool, correct_behavior: bool) -> Self {
        match (active, correct_behavior) {
            (true, true) => Outcome::TruePositive,
            (false, true) => Outcome::FalseNegative,
            (false, false) => Outcome::TrueNegative,
            (true, false) => Outcome::FalsePositive,
        }
    }

    /// Whether the realized state matched the optimal one.
    pub fn is_correct(self) -> bool {
        matches!(self, Outcome::TruePositive | Outcome::TrueNegative)
    }
}

/// Population-wide tally of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutcomeCounts {
    pub true_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
    pub false_positive: usize,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::TruePositive => self.true_positive += 1,
            Outcome::FalseNegative => self.false_negative += 1,
            Outcome::TrueNegative => self.true_negative += 1,
            Outcome::FalsePositive => self.false_positive += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_negative + self.true_negative + self.false_positive
    }
}

/// Output of a single evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// `(type . stimulus) > threshold` per individual
    pub correct_behavior: Vec<bool>,
    pub counts: OutcomeCounts,
}

/// Running per-individual outcome counts for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorAccumulator {
    true_positive: Vec<u64>,
    false_negative: Vec<u64>,
    true_negative: Vec<u64>,
    false_positive: Vec<u64>,
    evaluations: u64,
}

impl BehaviorAccumulator {
    pub fn new(n: usize) -> Self {
        Self {
            true_positive: vec![0; n],
            false_negative: vec![0; n],
            true_negative: vec![0; n],
            false_positive: vec![0; n],
            evaluations: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.true_positive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.true_positive.is_empty()
    }

    /// Number of timesteps (or trials) evaluated so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Classifies every individual and increments exactly one counter each.
    pub fn evaluate(&mut self, states: &[bool], population: &Population, stimulus: &Stimulus) -> Evaluation {
        let mut correct_behavior = Vec::with_capacity(states.len());
        let mut counts = OutcomeCounts::default();

        for (individual, &active) in states.iter().enumerate() {
            let perceived = stimulus.perceived_by(population.source_type(individual));
            let should_act = perceived > population.threshold(individual);
            let outcome = Outcome::classify(active, should_act);

            let counter = match outcome {
                Outcome::TruePositive => &mut self.true_positive,
                Outcome::FalseNegative => &mut self.false_negative,
                Outcome::TrueNegative => &mut self.true_negative,
                Outcome::FalsePositive => &mut self.false_positive,
            };
            counter[individual] += 1;
            counts.record(outcome);
            correct_behavior.push(should_act);
        }

        self.evaluations += 1;
        Evaluation {
            correct_behavior,
            counts,
        }
    }

    pub fn record(&self, individual: usize) -> BehaviorRecord {
        BehaviorRecord {
            individual: individual as u32,
            true_positive: self.true_positive[individual],
            false_negative: self.false_negative[individual],
            true_negative: self.true_negative[individual],
            false_positive: self.false_positive[individual],
        }
    }

    /// One row per individual, in index order.
    pub fn records(&self) -> Vec<BehaviorRecord> {
        (0..self.len()).map(|i| self.record(i)).collect()
    }
}

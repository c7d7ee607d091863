//! Stimulus Sampler
//!
//! Draws the two correlated information sources for a timestep and decides
//! which individuals sample their source directly.

use rand::Rng;
use std::f64::consts::PI;

use cascade_events::SourceType;

use crate::population::Population;
use crate::SimRng;

/// Values of both information sources for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stimulus {
    pub values: [f64; 2],
}

impl Stimulus {
    pub fn new(a: f64, b: f64) -> Self {
        Self { values: [a, b] }
    }

    /// Standard bivariate normal draw with correlation `gamma`.
    pub fn draw(gamma: f64, rng: &mut SimRng) -> Self {
        let z1 = standard_normal(rng);
        let z2 = standard_normal(rng);
        let b = gamma * z1 + (1.0 - gamma * gamma).max(0.0).sqrt() * z2;
        Self::new(z1, b)
    }

    /// Type-weighted stimulus, i.e. the value of the individual's own source.
    pub fn perceived_by(&self, source: SourceType) -> f64 {
        source
            .weights()
            .iter()
            .zip(self.values.iter())
            .map(|(w, v)| w * v)
            .sum()
    }
}

/// Box-Muller transform.
fn standard_normal(rng: &mut SimRng) -> f64 {
    // gen::<f64>() is in [0, 1); flip it so ln() never sees zero
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Result of the sampling phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampling {
    pub stimulus: Stimulus,
    /// Behavioral state before the cascade; only active samplers are set
    pub states: Vec<bool>,
    pub samplers: Vec<usize>,
    pub active_samplers: Vec<usize>,
}

/// Each individual samples with probability `psi` and, if it does, becomes
/// active when its own source exceeds its threshold.
pub fn sample_stimulus(gamma: f64, psi: f64, population: &Population, rng: &mut SimRng) -> Sampling {
    let stimulus = Stimulus::draw(gamma, rng);
    let n = population.len();
    let mut states = vec![false; n];
    let mut samplers = Vec::new();
    let mut active_samplers = Vec::new();

    for individual in 0..n {
        if rng.gen::<f64>() >= psi {
            continue;
        }
        samplers.push(individual);
        let perceived = stimulus.perceived_by(population.source_type(individual));
        if perceived > population.threshold(individual) {
            states[individual] = true;
            active_samplers.push(individual);
        }
    }

    Sampling {
        stimulus,
        states,
        samplers,
        active_samplers,
    }
}

//! Simulation Driver
//!
//! One replicate: seeds the population and network from the replicate's own
//! random stream, runs the per-timestep loop, then assesses fitness on the
//! final network.
//!
//! Each timestep runs strictly in this order:
//! sample -> propagate -> record stats (windowed) -> evaluate -> rewire.

use thiserror::Error;

use cascade_events::{
    AdjacencySnapshot, BehaviorRecord, CascadeRecord, FitnessBehaviorRecord, FitnessCascadeRecord,
    FitnessSummary, ReplicateKey, SourceType,
};

use crate::behavior::{BehaviorAccumulator, OutcomeCounts};
use crate::cascade::propagate;
use crate::config::{ConfigError, ModelParams};
use crate::fitness::assess_fitness;
use crate::network::{seed_social_network, Network};
use crate::population::Population;
use crate::rewiring::{rewire, Rewiring};
use crate::stats::{cascade_record, CascadeStats, StatsWindow};
use crate::stimulus::sample_stimulus;
use crate::{derive_seed, replicate_rng, SimRng};

/// Errors setting up a replicate.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("network has {network} individuals but population has {population}")]
    SizeMismatch { network: usize, population: usize },
    #[error("parameters give n = {n} but population has {population}")]
    PopulationMismatch { n: usize, population: usize },
}

/// What happened in one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub t: u64,
    pub samplers: usize,
    pub active_samplers: usize,
    pub total_active: usize,
    /// Cascade passes that activated someone
    pub rounds: usize,
    pub outcomes: OutcomeCounts,
    pub rewiring: Rewiring,
    /// Whether the cascade was added to the statistics table
    pub recorded: bool,
}

/// Everything a replicate hands to the persistence sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateOutput {
    pub key: ReplicateKey,
    pub params: ModelParams,
    pub seed: u64,
    pub initial_network: AdjacencySnapshot,
    pub final_network: AdjacencySnapshot,
    pub thresholds: Vec<f64>,
    pub types: Vec<SourceType>,
    pub cascades: Vec<CascadeRecord>,
    pub behavior: Vec<BehaviorRecord>,
    pub fitness_behavior: Vec<FitnessBehaviorRecord>,
    pub fitness_cascades: Vec<FitnessCascadeRecord>,
    pub fitness_summary: FitnessSummary,
    pub ties_broken: u64,
    pub ties_formed: u64,
}

/// State of one running replicate.
#[derive(Debug, Clone)]
pub struct Simulation {
    key: ReplicateKey,
    params: ModelParams,
    seed: u64,
    rng: SimRng,
    population: Population,
    initial_network: Network,
    network: Network,
    behavior: BehaviorAccumulator,
    stats: CascadeStats,
    timestep: u64,
    ties_broken: u64,
    ties_formed: u64,
}

impl Simulation {
    /// Validates `params` and seeds thresholds, types and network, in that
    /// order, from the stream derived from `(replicate, gamma)`.
    pub fn new(replicate: u32, params: ModelParams) -> Result<Self, SimulationError> {
        params.validate()?;
        let mut rng = replicate_rng(replicate, params.gamma);
        let population =
            Population::seed(params.n, params.threshold_lower, params.threshold_upper, &mut rng);
        let network = seed_social_network(params.n, params.k, params.network_type, &mut rng);
        Self::from_parts(replicate, params, population, network, rng)
    }

    /// Starts a replicate from externally supplied population and network.
    pub fn from_parts(
        replicate: u32,
        params: ModelParams,
        population: Population,
        network: Network,
        rng: SimRng,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        if params.n != population.len() {
            return Err(SimulationError::PopulationMismatch {
                n: params.n,
                population: population.len(),
            });
        }
        if network.size() != population.len() {
            return Err(SimulationError::SizeMismatch {
                network: network.size(),
                population: population.len(),
            });
        }
        let window = StatsWindow::new(params.stats_window, params.timesteps);
        Ok(Self {
            key: ReplicateKey::new(replicate, params.gamma),
            seed: derive_seed(replicate, params.gamma),
            behavior: BehaviorAccumulator::new(population.len()),
            stats: CascadeStats::new(window),
            initial_network: network.clone(),
            network,
            population,
            params,
            rng,
            timestep: 0,
            ties_broken: 0,
            ties_formed: 0,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn initial_network(&self) -> &Network {
        &self.initial_network
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn behavior(&self) -> &BehaviorAccumulator {
        &self.behavior
    }

    pub fn cascades(&self) -> &[CascadeRecord] {
        self.stats.records()
    }

    /// Timesteps completed so far.
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn is_finished(&self) -> bool {
        self.timestep >= self.params.timesteps
    }

    /// Advances one timestep.
    pub fn step(&mut self) -> StepReport {
        let t = self.timestep;
        let sampling = sample_stimulus(self.params.gamma, self.params.psi, &self.population, &mut self.rng);
        let propagation = propagate(&self.network, sampling.states, self.population.thresholds());

        let recorded = self.stats.should_record(t);
        if recorded {
            self.stats.push(cascade_record(
                t,
                &sampling.samplers,
                &sampling.active_samplers,
                &propagation.states,
                &self.population,
            ));
        }

        let evaluation = self
            .behavior
            .evaluate(&propagation.states, &self.population, &sampling.stimulus);

        let rewiring = rewire(
            self.params.rewiring,
            self.params.p,
            &mut self.network,
            &propagation.states,
            &evaluation.correct_behavior,
            &mut self.rng,
        );
        if rewiring.adjustment.broke_tie() {
            self.ties_broken += 1;
        }
        if rewiring.tie_formed() {
            self.ties_formed += 1;
        }

        self.timestep += 1;
        StepReport {
            t,
            samplers: sampling.samplers.len(),
            active_samplers: sampling.active_samplers.len(),
            total_active: propagation.active_count(),
            rounds: propagation.rounds,
            outcomes: evaluation.counts,
            rewiring,
            recorded,
        }
    }

    /// Runs the remaining timesteps, then assesses fitness.
    pub fn run(mut self) -> ReplicateOutput {
        tracing::info!(
            replicate = self.key.replicate,
            gamma = self.key.gamma,
            seed = self.seed,
            n = self.params.n,
            timesteps = self.params.timesteps,
            "starting replicate"
        );
        let progress_interval = (self.params.timesteps / 10).max(1);

        while !self.is_finished() {
            let report = self.step();
            if report.t > 0 && report.t % progress_interval == 0 {
                tracing::debug!(
                    replicate = self.key.replicate,
                    t = report.t,
                    ties = self.network.tie_count(),
                    ties_broken = self.ties_broken,
                    "progress"
                );
            }
        }

        self.finish()
    }

    /// Assesses fitness on the current network and packages the output.
    pub fn finish(mut self) -> ReplicateOutput {
        let fitness = assess_fitness(
            self.params.gamma,
            self.params.psi,
            self.params.fitness_trials,
            &self.network,
            &self.population,
            &mut self.rng,
        );

        tracing::info!(
            replicate = self.key.replicate,
            gamma = self.key.gamma,
            ties_broken = self.ties_broken,
            ties_formed = self.ties_formed,
            mean_cascade_size = fitness.summary.mean_cascade_size,
            mean_accuracy = fitness.summary.mean_accuracy,
            "replicate complete"
        );

        ReplicateOutput {
            key: self.key,
            seed: self.seed,
            initial_network: self.initial_network.snapshot(),
            final_network: self.network.snapshot(),
            thresholds: self.population.thresholds().to_vec(),
            types: self.population.types().to_vec(),
            cascades: self.stats.into_records(),
            behavior: self.behavior.records(),
            fitness_behavior: fitness.behavior,
            fitness_cascades: fitness.cascades,
            fitness_summary: fitness.summary,
            ties_broken: self.ties_broken,
            ties_formed: self.ties_formed,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn small_params() -> ModelParams {
        ModelParams {
            n: 12,
            k: 3,
            psi: 0.5,
            timesteps: 40,
            stats_window: 10,
            fitness_trials: 25,
            ..ModelParams::default()
        }
    }

    #[test]
    fn test_rejects_invalid_params_before_running() {
        let params = ModelParams {
            psi: 0.0,
            ..small_params()
        };
        assert!(matches!(
            Simulation::new(0, params),
            Err(SimulationError::Config(ConfigError::InvalidParameter { name: "psi", .. }))
        ));
    }

    #[test]
    fn test_from_parts_checks_sizes() {
        let mut rng = SimRng::seed_from_u64(0);
        let population = Population::seed(12, 0.0, 1.0, &mut rng);
        let result = Simulation::from_parts(0, small_params(), population, Network::empty(5), rng);
        assert!(matches!(
            result,
            Err(SimulationError::SizeMismatch {
                network: 5,
                population: 12
            })
        ));
    }

    #[test]
    fn test_from_parts_checks_params_size() {
        let mut rng = SimRng::seed_from_u64(0);
        let population = Population::seed(4, 0.0, 1.0, &mut rng);
        let ring = Network::from_rows(&[
            vec![0, 1, 0, 0],
            vec![0, 0, 1, 0],
            vec![0, 0, 0, 1],
            vec![1, 0, 0, 0],
        ])
        .unwrap();
        let params = ModelParams {
            n: 200,
            k: 5,
            ..small_params()
        };
        let result = Simulation::from_parts(0, params, population, ring, rng);
        assert!(matches!(
            result,
            Err(SimulationError::PopulationMismatch {
                n: 200,
                population: 4
            })
        ));
    }

    #[test]
    fn test_quiet_timesteps_are_recorded_as_zero_rows() {
        let params = ModelParams {
            psi: 1e-12,
            ..small_params()
        };
        let output = Simulation::new(0, params).unwrap().run();
        assert_eq!(output.cascades.len(), 20);
        assert!(output.cascades.iter().all(|r| r.samplers == 0 && r.total_active == 0));
        assert_eq!(output.ties_broken, 0);
    }

    #[test]
    fn test_run_produces_complete_output() {
        let output = Simulation::new(3, small_params()).unwrap().run();
        assert_eq!(output.key.replicate, 3);
        assert_eq!(output.seed, derive_seed(3, 0.0));
        assert_eq!(output.thresholds.len(), 12);
        assert_eq!(output.types.len(), 12);
        assert_eq!(output.behavior.len(), 12);
        assert!(output.behavior.iter().all(|r| r.total() == 40));
        assert_eq!(output.fitness_behavior.len(), 12);
        assert_eq!(output.fitness_cascades.len(), 25);
        // first 10 and last 10 of 40
        let ts: Vec<u64> = output.cascades.iter().map(|r| r.t).collect();
        assert_eq!(ts, (0..10).chain(30..40).collect::<Vec<_>>());
        assert!(output.ties_formed <= output.ties_broken);
        assert_eq!(
            output.final_network.tie_count() as u64,
            output.initial_network.tie_count() as u64 + output.ties_formed - output.ties_broken
        );
    }

    #[test]
    fn test_step_advances_and_reports() {
        let mut sim = Simulation::new(0, small_params()).unwrap();
        let report = sim.step();
        assert_eq!(report.t, 0);
        assert!(report.recorded);
        assert_eq!(report.outcomes.total(), 12);
        assert!(report.total_active >= report.active_samplers);
        assert_eq!(sim.timestep(), 1);
        assert_eq!(sim.cascades().len(), 1);
        assert_eq!(sim.behavior().evaluations(), 1);
    }
}

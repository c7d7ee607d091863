//! Cascade Statistics
//!
//! Per-timestep cascade sizes, collected only for the first and last
//! `window` timesteps of a run to bound memory while keeping both the
//! transient and the steady state.

use cascade_events::{CascadeRecord, SourceType};

use crate::population::Population;

/// Decides which timesteps are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub window: u64,
    pub timesteps: u64,
}

impl StatsWindow {
    pub fn new(window: u64, timesteps: u64) -> Self {
        Self { window, timesteps }
    }

    pub fn contains(&self, t: u64) -> bool {
        t < self.window || t >= self.timesteps.saturating_sub(self.window)
    }

    /// Number of timesteps that will be recorded over the whole run.
    pub fn recorded_count(&self) -> u64 {
        self.timesteps.min(self.window.saturating_mul(2))
    }
}

fn count_of_type(
    individuals: impl Iterator<Item = usize>,
    population: &Population,
    source: SourceType,
) -> u32 {
    individuals.filter(|&i| population.source_type(i) == source).count() as u32
}

/// Builds the record for one cascade.
pub fn cascade_record(
    t: u64,
    samplers: &[usize],
    active_samplers: &[usize],
    states: &[bool],
    population: &Population,
) -> CascadeRecord {
    let actives = || (0..states.len()).filter(|&i| states[i]);

    CascadeRecord {
        t,
        samplers: samplers.len() as u32,
        samplers_active: active_samplers.len() as u32,
        sampler_a: count_of_type(samplers.iter().copied(), population, SourceType::A),
        sampler_b: count_of_type(samplers.iter().copied(), population, SourceType::B),
        total_active: actives().count() as u32,
        active_a: count_of_type(actives(), population, SourceType::A),
        active_b: count_of_type(actives(), population, SourceType::B),
    }
}

/// Ordered table of windowed cascade records.
#[derive(Debug, Clone)]
pub struct CascadeStats {
    window: StatsWindow,
    records: Vec<CascadeRecord>,
}

impl CascadeStats {
    pub fn new(window: StatsWindow) -> Self {
        Self {
            window,
            records: Vec::with_capacity(window.recorded_count() as usize),
        }
    }

    pub fn should_record(&self, t: u64) -> bool {
        self.window.contains(t)
    }

    pub fn push(&mut self, record: CascadeRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[CascadeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CascadeRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_covers_both_ends() {
        let window = StatsWindow::new(5, 20);
        let recorded: Vec<u64> = (0..20).filter(|&t| window.contains(t)).collect();
        assert_eq!(recorded, vec![0, 1, 2, 3, 4, 15, 16, 17, 18, 19]);
        assert_eq!(window.recorded_count(), 10);
    }

    #[test]
    fn test_short_run_records_everything() {
        let window = StatsWindow::new(5000, 30);
        assert!((0..30).all(|t| window.contains(t)));
        assert_eq!(window.recorded_count(), 30);
    }

    #[test]
    fn test_stats_follow_window() {
        let mut stats = CascadeStats::new(StatsWindow::new(2, 6));
        for t in 0..6 {
            if stats.should_record(t) {
                stats.push(CascadeRecord { t, ..CascadeRecord::default() });
            }
        }
        let ts: Vec<u64> = stats.records().iter().map(|r| r.t).collect();
        assert_eq!(ts, vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_quiet_timestep_gives_zero_row() {
        let population = Population::new(vec![0.5; 3], vec![SourceType::A; 3]).unwrap();
        let record = cascade_record(7, &[], &[], &[false; 3], &population);
        assert_eq!(record, CascadeRecord { t: 7, ..CascadeRecord::default() });
    }

    #[test]
    fn test_cascade_record_counts_by_type() {
        let population = Population::new(
            vec![0.5; 5],
            vec![SourceType::A, SourceType::B, SourceType::A, SourceType::B, SourceType::A],
        )
        .unwrap();
        let states = [true, true, false, false, true];
        let record = cascade_record(3, &[0, 1, 3], &[0, 1], &states, &population);
        assert_eq!(
            record,
            CascadeRecord {
                t: 3,
                samplers: 3,
                samplers_active: 2,
                sampler_a: 1,
                sampler_b: 2,
                total_active: 3,
                active_a: 2,
                active_b: 1,
            }
        );
    }
}

//! Persistence Sink
//!
//! Receives the finished tables of a replicate. The directory sink mirrors the
//! layout analysis scripts expect:
//!
//! ```text
//! <root>/cascade_data/gamma0.5/cascade_rep03.json
//! <root>/social_network_data/gamma0.5/sn_final_rep03.json
//! <root>/social_network_data/gamma0.5/sn_initial_rep03.json
//! <root>/thresh_data/gamma0.5/thresh_rep03.json
//! <root>/type_data/gamma0.5/type_rep03.json
//! <root>/behavior_data/gamma0.5/behavior_rep03.json
//! <root>/fitness_data/gamma0.5/fitness_cascades_rep03.json
//! <root>/fitness_data/gamma0.5/fitness_behavior_rep03.json
//! <root>/summary_data/gamma0.5/summary_rep03.json
//! ```

use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use cascade_events::{FitnessSummary, ReplicateKey};

use crate::config::ModelParams;
use crate::simulation::ReplicateOutput;

/// Errors that can occur during output operations.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for finished replicates.
pub trait PersistenceSink {
    fn persist(&mut self, output: &ReplicateOutput) -> Result<(), OutputError>;
}

/// Metadata written next to the tables of each replicate.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicateSummary<'a> {
    pub run_id: Uuid,
    pub key: ReplicateKey,
    pub seed: u64,
    pub params: &'a ModelParams,
    pub initial_ties: usize,
    pub final_ties: usize,
    pub ties_broken: u64,
    pub ties_formed: u64,
    pub fitness: FitnessSummary,
}

/// Writes one JSON file per table under a root directory.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    root: PathBuf,
    run_id: Uuid,
    replicates_written: u64,
}

impl JsonDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            run_id: Uuid::new_v4(),
            replicates_written: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identifier shared by every replicate this sink writes.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn replicates_written(&self) -> u64 {
        self.replicates_written
    }

    /// Path of a table file, e.g. `fitness_data/gamma0.0/fitness_behavior_rep01.json`.
    pub fn table_path(&self, table_dir: &str, file_stem: &str, key: &ReplicateKey) -> PathBuf {
        self.root
            .join(table_dir)
            .join(key.gamma_label())
            .join(format!("{}_rep{}.json", file_stem, key.replicate_label()))
    }

    fn write_table<T: Serialize + ?Sized>(
        &self,
        table_dir: &str,
        file_stem: &str,
        key: &ReplicateKey,
        value: &T,
    ) -> Result<(), OutputError> {
        let path = self.table_path(table_dir, file_stem, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }
}

impl PersistenceSink for JsonDirSink {
    fn persist(&mut self, output: &ReplicateOutput) -> Result<(), OutputError> {
        let key = &output.key;
        self.write_table("cascade_data", "cascade", key, &output.cascades)?;
        self.write_table("social_network_data", "sn_final", key, &output.final_network)?;
        self.write_table("social_network_data", "sn_initial", key, &output.initial_network)?;
        self.write_table("thresh_data", "thresh", key, &output.thresholds)?;
        self.write_table("type_data", "type", key, &output.types)?;
        self.write_table("behavior_data", "behavior", key, &output.behavior)?;
        self.write_table("fitness_data", "fitness_cascades", key, &output.fitness_cascades)?;
        self.write_table("fitness_data", "fitness_behavior", key, &output.fitness_behavior)?;

        let summary = ReplicateSummary {
            run_id: self.run_id,
            key: output.key,
            seed: output.seed,
            params: &output.params,
            initial_ties: output.initial_network.tie_count(),
            final_ties: output.final_network.tie_count(),
            ties_broken: output.ties_broken,
            ties_formed: output.ties_formed,
            fitness: output.fitness_summary,
        };
        self.write_table("summary_data", "summary", key, &summary)?;

        self.replicates_written += 1;
        tracing::debug!(
            replicate = key.replicate,
            gamma = key.gamma,
            root = %self.root.display(),
            "persisted replicate"
        );
        Ok(())
    }
}

/// Keeps outputs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub outputs: Vec<ReplicateOutput>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ReplicateKey) -> Option<&ReplicateOutput> {
        self.outputs.iter().find(|o| o.key == *key)
    }
}

impl PersistenceSink for MemorySink {
    fn persist(&mut self, output: &ReplicateOutput) -> Result<(), OutputError> {
        self.outputs.push(output.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;
    use cascade_events::{AdjacencySnapshot, BehaviorRecord, CascadeRecord, SourceType};
    use tempfile::tempdir;

    fn tiny_output(replicate: u32, gamma: f64) -> ReplicateOutput {
        let params = ModelParams {
            n: 6,
            k: 2,
            gamma,
            psi: 0.5,
            timesteps: 8,
            stats_window: 2,
            fitness_trials: 5,
            ..ModelParams::default()
        };
        Simulation::new(replicate, params).unwrap().run()
    }

    #[test]
    fn test_table_path_layout() {
        let sink = JsonDirSink::new("/data/out");
        let key = ReplicateKey::new(4, 0.5);
        assert_eq!(
            sink.table_path("fitness_data", "fitness_behavior", &key),
            PathBuf::from("/data/out/fitness_data/gamma0.5/fitness_behavior_rep04.json")
        );
    }

    #[test]
    fn test_json_sink_writes_all_tables() {
        let dir = tempdir().unwrap();
        let mut sink = JsonDirSink::new(dir.path());
        let output = tiny_output(1, 0.0);
        sink.persist(&output).unwrap();
        assert_eq!(sink.replicates_written(), 1);

        let key = output.key;
        let expected = [
            ("cascade_data", "cascade"),
            ("social_network_data", "sn_final"),
            ("social_network_data", "sn_initial"),
            ("thresh_data", "thresh"),
            ("type_data", "type"),
            ("behavior_data", "behavior"),
            ("fitness_data", "fitness_cascades"),
            ("fitness_data", "fitness_behavior"),
            ("summary_data", "summary"),
        ];
        for (table_dir, stem) in expected {
            let path = sink.table_path(table_dir, stem, &key);
            assert!(path.exists(), "missing {}", path.display());
        }

        let read = |stem: &str, table_dir: &str| {
            fs::read_to_string(sink.table_path(table_dir, stem, &key)).unwrap()
        };
        let network: AdjacencySnapshot = serde_json::from_str(&read("sn_final", "social_network_data")).unwrap();
        assert_eq!(network, output.final_network);
        let cascades: Vec<CascadeRecord> = serde_json::from_str(&read("cascade", "cascade_data")).unwrap();
        assert_eq!(cascades, output.cascades);
        let behavior: Vec<BehaviorRecord> = serde_json::from_str(&read("behavior", "behavior_data")).unwrap();
        assert_eq!(behavior, output.behavior);
        let types: Vec<SourceType> = serde_json::from_str(&read("type", "type_data")).unwrap();
        assert_eq!(types, output.types);

        let summary: serde_json::Value = serde_json::from_str(&read("summary", "summary_data")).unwrap();
        assert_eq!(summary["run_id"], sink.run_id().to_string());
        assert_eq!(summary["seed"], output.seed);
    }

    #[test]
    fn test_memory_sink_keeps_outputs() {
        let mut sink = MemorySink::new();
        sink.persist(&tiny_output(0, 0.0)).unwrap();
        sink.persist(&tiny_output(0, 0.5)).unwrap();
        assert_eq!(sink.outputs.len(), 2);
        assert!(sink.get(&ReplicateKey::new(0, 0.5)).is_some());
        assert!(sink.get(&ReplicateKey::new(1, 0.5)).is_none());
    }
}

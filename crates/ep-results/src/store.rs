//! In-memory run cache.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{RunId, RunManifest, TimeSeries};
use crate::{ResultsError, ResultsResult};

/// A finished run: manifest plus its immutable time series.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub manifest: RunManifest,
    pub series: Arc<TimeSeries>,
}

/// Run cache keyed by run id. Lives only as long as its owner.
#[derive(Debug, Default, Clone)]
pub struct RunStore {
    runs: HashMap<RunId, Arc<RunRecord>>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.runs.contains_key(run_id)
    }

    /// Store a record, replacing any earlier run with the same id.
    pub fn save_run(&mut self, record: RunRecord) -> Arc<RunRecord> {
        let record = Arc::new(record);
        self.runs
            .insert(record.manifest.run_id.clone(), Arc::clone(&record));
        record
    }

    pub fn get(&self, run_id: &str) -> Option<Arc<RunRecord>> {
        self.runs.get(run_id).cloned()
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<&RunManifest> {
        self.runs
            .get(run_id)
            .map(|r| &r.manifest)
            .ok_or_else(|| ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    pub fn load_timeseries(&self, run_id: &str) -> ResultsResult<Arc<TimeSeries>> {
        self.runs
            .get(run_id)
            .map(|r| Arc::clone(&r.series))
            .ok_or_else(|| ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    /// Manifests for a model, oldest first.
    pub fn list_runs(&self, model: &str) -> Vec<&RunManifest> {
        let mut runs: Vec<&RunManifest> = self
            .runs
            .values()
            .map(|r| &r.manifest)
            .filter(|m| m.model == model)
            .collect();
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.run_id.cmp(&b.run_id)));
        runs
    }

    pub fn delete_run(&mut self, run_id: &str) -> bool {
        self.runs.remove(run_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }
}

//! ep-results: time series, run manifests, metrics and the in-memory run cache.

pub mod hash;
pub mod metrics;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use metrics::{
    EpidemicMetrics, Peak, compute_metrics, conservation_drift, effective_reproduction, peak,
};
pub use store::{RunRecord, RunStore};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Unknown compartment '{name}' in time series")]
    UnknownCompartment { name: String },

    #[error("Sample {index} has {actual} values, expected {expected}")]
    SampleWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Sample times must strictly increase (sample {index} at t={time})")]
    NonMonotonicTime { index: usize, time: f64 },

    #[error("Time {time} outside series span [{start}, {end}]")]
    TimeOutOfRange { time: f64, start: f64, end: f64 },

    #[error("Time series is empty")]
    EmptySeries,
}

//! Shared application service layer for the epidemic lab.
//!
//! This crate provides a unified interface for frontends, centralizing run
//! configuration, the simulation session, parallel runs and result queries.

pub mod config;
pub mod error;
pub mod parallel;
pub mod progress;
pub mod query;
pub mod session;

// Re-export key types for convenience
pub use config::{RunConfig, SolverConfig};
pub use error::{AppError, AppResult};
pub use parallel::run_parallel;
pub use progress::{IntegrationProgress, RunProgressEvent, RunStage};
pub use query::{
    ModelSummary, ParameterSummary, RunSummary, extract_series, list_compartments, list_models,
    model_graph, summarize,
};
pub use session::{RunOutput, SOLVER_VERSION, SessionState, SimulationSession};

pub use ep_graph::{EdgeDescription, GraphDescription};
pub use ep_models::{ModelRegistry, Scenario, find_scenario, scenarios};
pub use ep_sim::IntegratorType;

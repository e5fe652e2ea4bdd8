//! Error types for the ep-app service layer.

use std::path::PathBuf;

use ep_models::ModelError;
use ep_sim::SimError;

/// Application error type that wraps errors from the backend crates
/// and provides a unified error interface for frontends.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("Unknown model kind '{kind}' (known: {known})")]
    UnknownModelKind { kind: String, known: String },

    #[error("Model error: {0}")]
    Model(ModelError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read configuration file {path}: {message}")]
    ConfigRead { path: PathBuf, message: String },

    #[error("Session is not configured")]
    NotConfigured,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for ep-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// The run was stopped by the caller rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Simulation(SimError::Cancelled { .. }))
    }
}

// Conversions from backend error types
impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownModelKind { kind, known } => {
                AppError::UnknownModelKind { kind, known }
            }
            other => AppError::Model(other),
        }
    }
}

impl From<ep_results::ResultsError> for AppError {
    fn from(err: ep_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

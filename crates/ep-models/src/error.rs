//! Error types for model definition and instantiation.

use std::fmt;

use ep_graph::GraphError;
use thiserror::Error;

/// What is wrong with a set of initial conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialConditionIssue {
    Negative { compartment: String, value: f64 },
    NonFinite { compartment: String, value: f64 },
    TotalMismatch { expected: f64, actual: f64 },
}

impl fmt::Display for InitialConditionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { compartment, value } => {
                write!(f, "compartment '{compartment}' has negative value {value}")
            }
            Self::NonFinite { compartment, value } => {
                write!(f, "compartment '{compartment}' has non-finite value {value}")
            }
            Self::TotalMismatch { expected, actual } => {
                write!(f, "initial values sum to {actual}, declared total is {expected}")
            }
        }
    }
}

/// Errors that can occur while defining or instantiating a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Unknown model kind '{kind}' (known: {known})")]
    UnknownModelKind { kind: String, known: String },

    #[error("Model {model} has no parameter '{name}'")]
    UnknownParameter { model: String, name: String },

    #[error("Model {model} declares parameter '{name}' without a value or default")]
    MissingParameter { model: String, name: String },

    #[error("Parameter '{name}' must be finite and non-negative, got {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("Model {model} has no compartment '{name}'")]
    UnknownCompartment { model: String, name: String },

    #[error("Initial condition mismatch: {0}")]
    InitialConditionMismatch(InitialConditionIssue),
}

pub type ModelResult<T> = Result<T, ModelError>;

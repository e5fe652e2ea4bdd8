//! Error types for assembly and integration.

use thiserror::Error;

/// Errors encountered while evaluating or integrating a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Non-finite {what} for '{label}' at t={t}: {value}")]
    NonFiniteState {
        what: &'static str,
        label: String,
        t: f64,
        value: f64,
    },

    #[error("Flow {flow} produced negative rate {rate} from a non-negative state")]
    NegativeFlowRate { flow: String, rate: f64 },

    #[error(
        "Numerical instability at t={t}: compartment '{compartment}' reached {value} \
         (tolerance {tolerance}); reduce the step size"
    )]
    NumericalInstability {
        compartment: String,
        t: f64,
        value: f64,
        tolerance: f64,
    },

    #[error("Step limit of {max_steps} reached at t={t}")]
    StepLimitExceeded { max_steps: usize, t: f64 },

    #[error("Step size underflow at t={t} (h={h})")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("Run cancelled at t={t}")]
    Cancelled { t: f64 },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Integration produced non-physical or non-finite values.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteState { .. }
                | Self::NegativeFlowRate { .. }
                | Self::NumericalInstability { .. }
                | Self::StepSizeUnderflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instability_message_names_compartment() {
        let err = SimError::NumericalInstability {
            compartment: "S".into(),
            t: 3.5,
            value: -2.0,
            tolerance: 1e-9,
        };
        let msg = err.to_string();
        assert!(msg.contains("'S'"));
        assert!(msg.contains("t=3.5"));
        assert!(err.is_numerical());
        assert!(!SimError::Cancelled { t: 0.0 }.is_numerical());
    }
}

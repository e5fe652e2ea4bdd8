//! Flow-rate expressions.
//!
//! Rates are a closed set of shapes rather than arbitrary callables, so the
//! assembler stays checkable and the graph stays serializable.

use ep_core::{CompartmentId, ParamId, Real};
use serde::{Deserialize, Serialize};

/// Rate declared on a builder, referring to parameters and compartments by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rate {
    /// `rate * source * infectious / N`, with N the sum of all compartments.
    MassAction { rate: String, infectious: String },
    /// `rate * source`.
    Linear { rate: String },
    /// `rate`, independent of state.
    Constant { rate: String },
}

impl Rate {
    pub fn mass_action(rate: impl Into<String>, infectious: impl Into<String>) -> Self {
        Self::MassAction {
            rate: rate.into(),
            infectious: infectious.into(),
        }
    }

    pub fn linear(rate: impl Into<String>) -> Self {
        Self::Linear { rate: rate.into() }
    }

    pub fn constant(rate: impl Into<String>) -> Self {
        Self::Constant { rate: rate.into() }
    }

    /// Name of the parameter scaling this rate.
    pub fn parameter(&self) -> &str {
        match self {
            Self::MassAction { rate, .. } | Self::Linear { rate } | Self::Constant { rate } => rate,
        }
    }
}

/// Rate expression resolved against a built graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateExpr {
    MassAction {
        rate: ParamId,
        infectious: CompartmentId,
    },
    Linear {
        rate: ParamId,
    },
    Constant {
        rate: ParamId,
    },
}

impl RateExpr {
    /// Parameter scaling this rate.
    pub fn parameter(&self) -> ParamId {
        match *self {
            Self::MassAction { rate, .. } | Self::Linear { rate } | Self::Constant { rate } => rate,
        }
    }

    /// Short shape name for display.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::MassAction { .. } => "mass_action",
            Self::Linear { .. } => "linear",
            Self::Constant { .. } => "constant",
        }
    }

    /// Instantaneous flow magnitude.
    ///
    /// `state` and `params` must be laid out in graph order; `total` is the
    /// current population `N`. A mass-action flow in an empty population is 0.
    pub fn evaluate(&self, source: Real, state: &[Real], params: &[Real], total: Real) -> Real {
        match *self {
            Self::MassAction { rate, infectious } => {
                if total == 0.0 {
                    0.0
                } else {
                    params[rate.slot()] * source * state[infectious.slot()] / total
                }
            }
            Self::Linear { rate } => params[rate.slot()] * source,
            Self::Constant { rate } => params[rate.slot()],
        }
    }
}

//! Classic SIR model.

use ep_core::Real;
use ep_graph::{GraphBuilder, Rate};

use crate::common::{declare_layout, ratio};
use crate::params::{InitialConditions, ParameterInfo, ParameterSet};
use crate::traits::CompartmentalModel;

const COMPARTMENTS: &[&str] = &["S", "I", "R"];

const PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "beta",
        description: "Infection rate: transmissions per infectious contact per unit time.",
        default: 0.5,
    },
    ParameterInfo {
        name: "gamma",
        description: "Recovery rate: 1 / infectious period.",
        default: 0.1,
    },
];

/// Susceptible → Infectious → Recovered.
///
/// Flows: S→I at `beta·S·I/N`, I→R at `gamma·I`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sir;

impl CompartmentalModel for Sir {
    fn name(&self) -> &str {
        "SIR"
    }

    fn description(&self) -> &str {
        "The classic SIR model describes the flow of individuals from Susceptible (S) \
         to Infectious (I) and then to Recovered (R)."
    }

    fn compartments(&self) -> &[&'static str] {
        COMPARTMENTS
    }

    fn parameters(&self) -> &[ParameterInfo] {
        PARAMETERS
    }

    fn default_initial_conditions(&self) -> InitialConditions {
        InitialConditions::new()
            .with("S", 0.99)
            .with("I", 0.01)
            .with("R", 0.0)
    }

    fn declare(&self, builder: &mut GraphBuilder) {
        declare_layout(builder, COMPARTMENTS, PARAMETERS);
        builder.declare_flow("S", "I", Rate::mass_action("beta", "I"));
        builder.declare_flow("I", "R", Rate::linear("gamma"));
    }

    fn basic_reproduction_number(&self, params: &ParameterSet) -> Option<Real> {
        ratio(params.get("beta")?, params.get("gamma")?)
    }
}

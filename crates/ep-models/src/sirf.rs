//! SIR-F: SIR with an isolated/severe branch.

use ep_core::Real;
use ep_graph::{GraphBuilder, Rate};

use crate::common::{declare_layout, ratio};
use crate::params::{InitialConditions, ParameterInfo, ParameterSet};
use crate::traits::CompartmentalModel;

const COMPARTMENTS: &[&str] = &["S", "I", "R", "F", "D"];

const PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "beta",
        description: "Infection rate.",
        default: 0.4,
    },
    ParameterInfo {
        name: "gamma_i",
        description: "Recovery rate from Infectious (I).",
        default: 0.1,
    },
    ParameterInfo {
        name: "alpha",
        description: "Progression rate from I to isolated/severe (F).",
        default: 0.05,
    },
    ParameterInfo {
        name: "gamma_f",
        description: "Recovery rate from F.",
        default: 0.05,
    },
    ParameterInfo {
        name: "mu",
        description: "Mortality rate from F.",
        default: 0.02,
    },
];

/// F holds isolated or severe cases that no longer transmit.
///
/// Flows: S→I at `beta·S·I/N`, I→R at `gamma_i·I`, I→F at `alpha·I`,
/// F→R at `gamma_f·F`, F→D at `mu·F`. Unlike SIR-D the fatal branch passes
/// through an intermediate compartment that can still recover.
#[derive(Debug, Clone, Copy, Default)]
pub struct SirF;

impl CompartmentalModel for SirF {
    fn name(&self) -> &str {
        "SIR-F"
    }

    fn description(&self) -> &str {
        "SIR-F adds a compartment F for isolated or severe cases reached from I. \
         F cases either recover (F->R) or die (F->D)."
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
            .with("F", 0.0)
            .with("D", 0.0)
    }

    fn declare(&self, builder: &mut GraphBuilder) {
        declare_layout(builder, COMPARTMENTS, PARAMETERS);
        builder.declare_flow("S", "I", Rate::mass_action("beta", "I"));
        builder.declare_flow("I", "R", Rate::linear("gamma_i"));
        builder.declare_flow("I", "F", Rate::linear("alpha"));
        builder.declare_flow("F", "R", Rate::linear("gamma_f"));
        builder.declare_flow("F", "D", Rate::linear("mu"));
    }

    fn basic_reproduction_number(&self, params: &ParameterSet) -> Option<Real> {
        // F does not transmit, so only the outflow from I matters.
        ratio(
            params.get("beta")?,
            params.get("gamma_i")? + params.get("alpha")?,
        )
    }
}

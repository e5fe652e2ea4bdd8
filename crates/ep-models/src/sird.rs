//! SIR-D: SIR with a deceased compartment.

use ep_core::Real;
use ep_graph::{GraphBuilder, Rate};

use crate::common::{declare_layout, ratio};
use crate::params::{InitialConditions, ParameterInfo, ParameterSet};
use crate::traits::CompartmentalModel;

const COMPARTMENTS: &[&str] = &["S", "I", "R", "D"];

const PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "beta",
        description: "Infection rate.",
        default: 0.5,
    },
    ParameterInfo {
        name: "gamma",
        description: "Recovery rate.",
        default: 0.1,
    },
    ParameterInfo {
        name: "alpha",
        description: "Fatality rate: rate of death from infection.",
        default: 0.05,
    },
];

/// Removed split into Recovered and Deceased.
///
/// Flows: S→I at `beta·S·I/N`, I→R at `gamma·I`, I→D at `alpha·I`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SirD;

impl CompartmentalModel for SirD {
    fn name(&self) -> &str {
        "SIR-D"
    }

    fn description(&self) -> &str {
        "The SIR-D model extends SIR by separating the removed individuals into \
         Recovered (R) and Deceased (D)."
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
            .with("D", 0.0)
    }

    fn declare(&self, builder: &mut GraphBuilder) {
        declare_layout(builder, COMPARTMENTS, PARAMETERS);
        builder.declare_flow("S", "I", Rate::mass_action("beta", "I"));
        builder.declare_flow("I", "R", Rate::linear("gamma"));
        builder.declare_flow("I", "D", Rate::linear("alpha"));
    }

    fn basic_reproduction_number(&self, params: &ParameterSet) -> Option<Real> {
        ratio(
            params.get("beta")?,
            params.get("gamma")? + params.get("alpha")?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r0_accounts_for_fatality() {
        let p = ParameterSet::new()
            .with("beta", 0.5)
            .with("gamma", 0.1)
            .with("alpha", 0.1);
        assert!((SirD.basic_reproduction_number(&p).unwrap() - 2.5).abs() < 1e-12);
    }
}

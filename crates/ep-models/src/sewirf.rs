//! SEWIR-F: exposure, waning immunity and fatalities.

use ep_core::Real;
use ep_graph::{GraphBuilder, Rate};

use crate::common::{declare_layout, ratio};
use crate::params::{InitialConditions, ParameterInfo, ParameterSet};
use crate::traits::CompartmentalModel;

const COMPARTMENTS: &[&str] = &["S", "E", "W", "I", "R", "F"];

const PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "beta",
        description: "Infection rate (S -> E).",
        default: 0.5,
    },
    ParameterInfo {
        name: "sigma",
        description: "Progression E -> I (1 / incubation period).",
        default: 0.2,
    },
    ParameterInfo {
        name: "gamma",
        description: "Recovery rate from I.",
        default: 0.1,
    },
    ParameterInfo {
        name: "alpha",
        description: "Fatality rate from I.",
        default: 0.05,
    },
    ParameterInfo {
        name: "omega",
        description: "Waning immunity rate R -> W (1 / immunity duration).",
        default: 0.001,
    },
    ParameterInfo {
        name: "rho",
        description: "Rate of return to susceptibility W -> S.",
        default: 0.1,
    },
];

/// Flows: S→E at `beta·S·I/N`, E→I at `sigma·E`, I→R at `gamma·I`,
/// I→F at `alpha·I`, R→W at `omega·R`, W→S at `rho·W`.
///
/// The only model with a cycle (S→E→I→R→W→S).
#[derive(Debug, Clone, Copy, Default)]
pub struct SewirF;

impl CompartmentalModel for SewirF {
    fn name(&self) -> &str {
        "SEWIR-F"
    }

    fn description(&self) -> &str {
        "SEWIR-F adds a latent Exposed (E) stage, Fatalities (F), and waning \
         immunity: recovered individuals pass through W back to S."
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
            .with("E", 0.0)
            .with("W", 0.0)
            .with("I", 0.01)
            .with("R", 0.0)
            .with("F", 0.0)
    }

    fn declare(&self, builder: &mut GraphBuilder) {
        declare_layout(builder, COMPARTMENTS, PARAMETERS);
        builder.declare_flow("S", "E", Rate::mass_action("beta", "I"));
        builder.declare_flow("E", "I", Rate::linear("sigma"));
        builder.declare_flow("I", "R", Rate::linear("gamma"));
        builder.declare_flow("I", "F", Rate::linear("alpha"));
        builder.declare_flow("R", "W", Rate::linear("omega"));
        builder.declare_flow("W", "S", Rate::linear("rho"));
    }

    fn basic_reproduction_number(&self, params: &ParameterSet) -> Option<Real> {
        // Everyone leaving E enters I, so the latent stage does not change R0.
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
    fn r0_ignores_latent_stage() {
        let p = ParameterSet::new()
            .with("beta", 0.6)
            .with("sigma", 0.2)
            .with("gamma", 0.1)
            .with("alpha", 0.1)
            .with("omega", 0.01)
            .with("rho", 0.1);
        assert!((SewirF.basic_reproduction_number(&p).unwrap() - 3.0).abs() < 1e-12);
    }
}

//! Helpers shared by the built-in model definitions.

use ep_core::Real;
use ep_graph::GraphBuilder;

use crate::params::ParameterInfo;

/// Declare every compartment (initial value 0) and every parameter, in order.
pub fn declare_layout(
    builder: &mut GraphBuilder,
    compartments: &[&'static str],
    parameters: &[ParameterInfo],
) {
    for name in compartments {
        builder.declare_compartment(*name, 0.0);
    }
    for param in parameters {
        builder.declare_parameter(param.name);
    }
}

/// `numerator / denominator`, or `None` when the denominator is not positive.
pub fn ratio(numerator: Real, denominator: Real) -> Option<Real> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

//! State checks applied after every accepted step.

use crate::error::{SimError, SimResult};
use crate::model::OdeSystem;
use crate::sim::NegativityPolicy;

/// First entry that is non-finite or below `-threshold`.
pub(crate) fn first_violation(x: &[f64], threshold: f64) -> Option<usize> {
    x.iter().position(|v| !v.is_finite() || *v < -threshold)
}

/// Enforce finiteness and the non-negativity policy on `x` in place.
///
/// Returns the number of entries clamped to zero.
pub(crate) fn enforce<S: OdeSystem + ?Sized>(
    system: &S,
    policy: &NegativityPolicy,
    threshold: f64,
    t: f64,
    x: &mut [f64],
) -> SimResult<usize> {
    let mut clamped = 0;
    for (i, v) in x.iter_mut().enumerate() {
        if !v.is_finite() {
            return Err(SimError::NonFiniteState {
                what: "state",
                label: system.state_label(i),
                t,
                value: *v,
            });
        }
        if *v < -threshold {
            return Err(SimError::NumericalInstability {
                compartment: system.state_label(i),
                t,
                value: *v,
                tolerance: threshold,
            });
        }
        if *v < 0.0 && policy.clamp {
            *v = 0.0;
            clamped += 1;
        }
    }
    Ok(clamped)
}

//! OdeSystem trait for pluggable right-hand sides.

use crate::error::SimResult;

/// A system `dx/dt = f(t, x)` over a flat state vector.
///
/// Implementations must be pure: the same `(t, x)` always yields the same
/// derivative, so step-doubling and error estimation see consistent values
/// and independent runs can share a system across threads.
pub trait OdeSystem {
    /// Length of the state vector.
    fn dimension(&self) -> usize;

    /// Write `f(t, x)` into `out` (both of length `dimension()`).
    fn rhs(&self, t: f64, x: &[f64], out: &mut [f64]) -> SimResult<()>;

    /// Human-readable name of state entry `i`, for error messages.
    fn state_label(&self, i: usize) -> String {
        format!("x[{i}]")
    }
}

//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::OdeSystem;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance the state by one step of size `dt`.
    fn step<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        x: &[f64],
        dt: f64,
    ) -> SimResult<Vec<f64>>;
}

/// `x + h * k`, elementwise.
pub(crate) fn axpy(x: &[f64], k: &[f64], h: f64) -> Vec<f64> {
    x.iter().zip(k).map(|(xi, ki)| xi + h * ki).collect()
}

pub(crate) fn eval<S: OdeSystem + ?Sized>(system: &S, t: f64, x: &[f64]) -> SimResult<Vec<f64>> {
    let mut out = vec![0.0; system.dimension()];
    system.rhs(t, x, &mut out)?;
    Ok(out)
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        x: &[f64],
        dt: f64,
    ) -> SimResult<Vec<f64>> {
        let k1 = eval(system, t, x)?;
        let k2 = eval(system, t + 0.5 * dt, &axpy(x, &k1, 0.5 * dt))?;
        let k3 = eval(system, t + 0.5 * dt, &axpy(x, &k2, 0.5 * dt))?;
        let k4 = eval(system, t + dt, &axpy(x, &k3, dt))?;

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        Ok((0..x.len())
            .map(|i| x[i] + dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
            .collect())
    }
}

/// Forward Euler (explicit, 1st order).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        x: &[f64],
        dt: f64,
    ) -> SimResult<Vec<f64>> {
        let xdot = eval(system, t, x)?;
        Ok(axpy(x, &xdot, dt))
    }
}

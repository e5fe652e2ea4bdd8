//! Adaptive Runge–Kutta–Fehlberg 4(5) stepper.
//!
//! One call to [`Rkf45::attempt`] computes a trial step and an error estimate;
//! the simulation loop decides whether to accept it, so the non-negativity
//! policy can reject a step that the error norm alone would accept.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::integrator::eval;
use crate::model::OdeSystem;

/// Tolerances and step bounds for the adaptive method.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveOptions {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Initial step. `0.0` picks `span * 1e-3`.
    pub h_init: f64,
    /// Smallest step before giving up.
    pub h_min: f64,
    /// Largest step.
    pub h_max: f64,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            h_init: 0.0,
            h_min: 1e-10,
            h_max: f64::INFINITY,
        }
    }
}

impl AdaptiveOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "rtol must be finite and positive",
            });
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "atol must be finite and positive",
            });
        }
        if !self.h_min.is_finite() || self.h_min <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "h_min must be finite and positive",
            });
        }
        if self.h_init < 0.0 || self.h_init.is_nan() {
            return Err(SimError::InvalidArg {
                what: "h_init must be non-negative",
            });
        }
        if self.h_max.is_nan() || self.h_max < self.h_min {
            return Err(SimError::InvalidArg {
                what: "h_max must be at least h_min",
            });
        }
        Ok(())
    }

    pub(crate) fn initial_step(&self, span: f64) -> f64 {
        let h = if self.h_init > 0.0 {
            self.h_init
        } else {
            span * 1e-3
        };
        h.max(self.h_min).min(self.h_max).min(span)
    }
}

/// Result of a single trial step.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Fifth-order state at `t + h`.
    pub state: Vec<f64>,
    /// Weighted RMS error; `<= 1.0` means within tolerance.
    pub error_norm: f64,
    /// Step size the controller proposes next.
    pub suggested_h: f64,
}

impl StepOutcome {
    pub fn within_tolerance(&self) -> bool {
        self.error_norm <= 1.0
    }
}

// Fehlberg coefficients
const A21: f64 = 1.0 / 4.0;
const A31: f64 = 3.0 / 32.0;
const A32: f64 = 9.0 / 32.0;
const A41: f64 = 1932.0 / 2197.0;
const A42: f64 = -7200.0 / 2197.0;
const A43: f64 = 7296.0 / 2197.0;
const A51: f64 = 439.0 / 216.0;
const A52: f64 = -8.0;
const A53: f64 = 3680.0 / 513.0;
const A54: f64 = -845.0 / 4104.0;
const A61: f64 = -8.0 / 27.0;
const A62: f64 = 2.0;
const A63: f64 = -3544.0 / 2565.0;
const A64: f64 = 1859.0 / 4104.0;
const A65: f64 = -11.0 / 40.0;

// 5th-order weights (advancing solution)
const B1: f64 = 16.0 / 135.0;
const B3: f64 = 6656.0 / 12825.0;
const B4: f64 = 28561.0 / 56430.0;
const B5: f64 = -9.0 / 50.0;
const B6: f64 = 2.0 / 55.0;

// 5th minus 4th order weights
const E1: f64 = 1.0 / 360.0;
const E3: f64 = -128.0 / 4275.0;
const E4: f64 = -2197.0 / 75240.0;
const E5: f64 = 1.0 / 50.0;
const E6: f64 = 2.0 / 55.0;

const SAFETY: f64 = 0.9;
const MAX_GROWTH: f64 = 5.0;
const MIN_SHRINK: f64 = 0.2;

/// `x + h * sum(a_j * k_j)`
fn combine(x: &[f64], h: f64, coeffs: &[(f64, &Vec<f64>)]) -> Vec<f64> {
    (0..x.len())
        .map(|i| x[i] + h * coeffs.iter().map(|(a, k)| a * k[i]).sum::<f64>())
        .collect()
}

/// Runge–Kutta–Fehlberg 4(5) with local extrapolation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rkf45 {
    pub options: AdaptiveOptions,
}

impl Rkf45 {
    pub fn new(options: AdaptiveOptions) -> Self {
        Self { options }
    }

    /// Compute one trial step of size `h` from `(t, x)`.
    pub fn attempt<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        x: &[f64],
        h: f64,
    ) -> SimResult<StepOutcome> {
        let n = x.len();

        let k1 = eval(system, t, x)?;
        let x2 = combine(x, h, &[(A21, &k1)]);
        let k2 = eval(system, t + h / 4.0, &x2)?;
        let x3 = combine(x, h, &[(A31, &k1), (A32, &k2)]);
        let k3 = eval(system, t + 3.0 * h / 8.0, &x3)?;
        let x4 = combine(x, h, &[(A41, &k1), (A42, &k2), (A43, &k3)]);
        let k4 = eval(system, t + 12.0 * h / 13.0, &x4)?;
        let x5 = combine(x, h, &[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)]);
        let k5 = eval(system, t + h, &x5)?;
        let x6 = combine(
            x,
            h,
            &[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
        );
        let k6 = eval(system, t + h / 2.0, &x6)?;

        let state = combine(
            x,
            h,
            &[(B1, &k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
        );

        let mut sum = 0.0;
        for i in 0..n {
            let ei = h * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i]);
            let sc = self.options.atol + self.options.rtol * x[i].abs().max(state[i].abs());
            sum += (ei / sc) * (ei / sc);
        }
        let error_norm = if n == 0 { 0.0 } else { (sum / n as f64).sqrt() };

        let factor = if error_norm == 0.0 {
            MAX_GROWTH
        } else {
            (SAFETY * error_norm.powf(-0.2)).clamp(MIN_SHRINK, MAX_GROWTH)
        };

        Ok(StepOutcome {
            state,
            error_norm,
            suggested_h: (h * factor).min(self.options.h_max),
        })
    }
}

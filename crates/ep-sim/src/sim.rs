//! Simulation runner and result recording.

use std::cell::Cell;
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use ep_core::Tolerances;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::adaptive::{AdaptiveOptions, Rkf45};
use crate::error::{SimError, SimResult};
use crate::guard;
use crate::integrator::{ForwardEuler, Integrator, RK4, eval};
use crate::model::OdeSystem;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (default, 4 rhs calls per step).
    #[default]
    #[serde(rename = "rk4")]
    RK4,
    /// Forward Euler (1st-order, 1 rhs call per step).
    #[serde(rename = "euler", alias = "forward_euler")]
    ForwardEuler,
    /// Adaptive Runge–Kutta–Fehlberg 4(5).
    #[serde(rename = "rkf45", alias = "adaptive")]
    Rkf45,
}

impl IntegratorType {
    pub const ALL: [IntegratorType; 3] = [Self::RK4, Self::ForwardEuler, Self::Rkf45];

    pub fn name(self) -> &'static str {
        match self {
            Self::RK4 => "rk4",
            Self::ForwardEuler => "euler",
            Self::Rkf45 => "rkf45",
        }
    }

    pub fn is_adaptive(self) -> bool {
        matches!(self, Self::Rkf45)
    }
}

impl fmt::Display for IntegratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegratorType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rk4" => Ok(Self::RK4),
            "euler" | "forward_euler" => Ok(Self::ForwardEuler),
            "rkf45" | "adaptive" => Ok(Self::Rkf45),
            _ => Err(SimError::InvalidArg {
                what: "unknown integrator (expected rk4, euler or rkf45)",
            }),
        }
    }
}

/// How slightly negative compartment values are treated.
///
/// Values in `[-tol, 0)` are discretization noise and are clamped to zero
/// when `clamp` is set; anything below `-tol` is a failed run. The threshold
/// scales with the initial mass: `tol = abs + rel * sum(|x0|)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativityPolicy {
    pub tolerance: Tolerances,
    pub clamp: bool,
}

impl Default for NegativityPolicy {
    fn default() -> Self {
        Self {
            tolerance: Tolerances {
                abs: 1e-9,
                rel: 1e-9,
            },
            clamp: true,
        }
    }
}

impl NegativityPolicy {
    pub fn threshold(&self, x0: &[f64]) -> f64 {
        self.tolerance.band(x0.iter().map(|v| v.abs()).sum())
    }
}

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Start of the time span
    pub t_start: f64,
    /// End of the time span
    pub t_end: f64,
    /// Fixed time step (ignored by the adaptive method)
    pub dt: f64,
    /// Integrator type (default: RK4)
    pub integrator: IntegratorType,
    /// Tolerances and step bounds for the adaptive method
    pub adaptive: AdaptiveOptions,
    /// Maximum number of accepted steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    pub negativity: NegativityPolicy,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            t_end: 100.0,
            dt: 0.1,
            integrator: IntegratorType::default(),
            adaptive: AdaptiveOptions::default(),
            max_steps: 1_000_000,
            record_every: 1,
            negativity: NegativityPolicy::default(),
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !self.t_start.is_finite() || !self.t_end.is_finite() {
            return Err(SimError::InvalidArg {
                what: "time span must be finite",
            });
        }
        if self.t_end < self.t_start {
            return Err(SimError::InvalidArg {
                what: "t_end must not precede t_start",
            });
        }
        if !self.integrator.is_adaptive() && (!self.dt.is_finite() || self.dt <= 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be finite and positive",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        if self.integrator.is_adaptive() {
            self.adaptive.validate()?;
        }
        Ok(())
    }
}

/// Counters collected during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    /// Accepted steps
    pub steps: usize,
    /// Steps rejected by the adaptive controller
    pub rejected_steps: usize,
    /// Right-hand side evaluations
    pub rhs_calls: usize,
    /// State entries clamped to zero by the negativity policy
    pub clamped: usize,
}

/// Record of simulation results.
#[derive(Clone, Debug, PartialEq)]
pub struct SimRecord {
    /// Sample times, strictly increasing
    pub t: Vec<f64>,
    /// State snapshots, one per sample time
    pub x: Vec<Vec<f64>>,
    pub stats: SimStats,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn final_state(&self) -> Option<&[f64]> {
        self.x.last().map(Vec::as_slice)
    }

    fn push(&mut self, t: f64, x: &[f64]) {
        self.t.push(t);
        self.x.push(x.to_vec());
    }
}

/// Progress snapshot passed to the callback after every accepted step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimProgress {
    pub t: f64,
    pub t_start: f64,
    pub t_end: f64,
    pub steps: usize,
}

impl SimProgress {
    /// Fraction of the time span covered, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        let span = self.t_end - self.t_start;
        if span <= 0.0 {
            1.0
        } else {
            ((self.t - self.t_start) / span).clamp(0.0, 1.0)
        }
    }
}

/// Counts rhs evaluations without touching the wrapped system.
struct Counting<'a, S: ?Sized> {
    inner: &'a S,
    calls: Cell<usize>,
}

impl<S: OdeSystem + ?Sized> OdeSystem for Counting<'_, S> {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn rhs(&self, t: f64, x: &[f64], out: &mut [f64]) -> SimResult<()> {
        self.calls.set(self.calls.get() + 1);
        self.inner.rhs(t, x, out)
    }

    fn state_label(&self, i: usize) -> String {
        self.inner.state_label(i)
    }
}

/// Run a simulation over `[t_start, t_end]` from `x0`.
pub fn run_sim<S: OdeSystem + ?Sized>(
    system: &S,
    x0: &[f64],
    opts: &SimOptions,
) -> SimResult<SimRecord> {
    run_sim_with_progress(system, x0, opts, |_| ControlFlow::Continue(()))
}

/// Run a simulation, reporting progress after every accepted step.
///
/// Returning `ControlFlow::Break(())` from `progress` stops the run with
/// [`SimError::Cancelled`]; the state is never left half-stepped.
pub fn run_sim_with_progress<S, F>(
    system: &S,
    x0: &[f64],
    opts: &SimOptions,
    mut progress: F,
) -> SimResult<SimRecord>
where
    S: OdeSystem + ?Sized,
    F: FnMut(&SimProgress) -> ControlFlow<()>,
{
    opts.validate()?;
    if x0.len() != system.dimension() {
        return Err(SimError::DimensionMismatch {
            what: "initial state",
            expected: system.dimension(),
            actual: x0.len(),
        });
    }

    let counting = Counting {
        inner: system,
        calls: Cell::new(0),
    };
    let threshold = opts.negativity.threshold(x0);

    let mut x = x0.to_vec();
    let mut stats = SimStats::default();
    stats.clamped += guard::enforce(&counting, &opts.negativity, threshold, opts.t_start, &mut x)?;

    let mut record = SimRecord {
        t: Vec::new(),
        x: Vec::new(),
        stats,
    };
    record.push(opts.t_start, &x);

    debug!(
        integrator = %opts.integrator,
        t_start = opts.t_start,
        t_end = opts.t_end,
        dim = x.len(),
        "simulation started"
    );

    let mut report = |t: f64, steps: usize| -> SimResult<()> {
        let snapshot = SimProgress {
            t,
            t_start: opts.t_start,
            t_end: opts.t_end,
            steps,
        };
        match progress(&snapshot) {
            ControlFlow::Continue(()) => Ok(()),
            ControlFlow::Break(()) => {
                debug!(t, steps, "simulation cancelled");
                Err(SimError::Cancelled { t })
            }
        }
    };

    if opts.integrator.is_adaptive() {
        run_adaptive(&counting, x, opts, threshold, &mut record, &mut report)?;
    } else {
        run_fixed(&counting, x, opts, threshold, &mut record, &mut report)?;
    }

    record.stats.rhs_calls = counting.calls.get();
    debug!(
        steps = record.stats.steps,
        rejected = record.stats.rejected_steps,
        rhs_calls = record.stats.rhs_calls,
        samples = record.len(),
        "simulation finished"
    );
    Ok(record)
}

/// Number of fixed steps covering `span`; a near-integer ratio is rounded
/// so the last step is not a sliver.
fn fixed_step_count(span: f64, dt: f64) -> usize {
    if span <= 0.0 {
        return 0;
    }
    let ratio = span / dt;
    let rounded = ratio.round();
    let n = if (ratio - rounded).abs() <= 1e-9 * ratio.max(1.0) {
        rounded
    } else {
        ratio.ceil()
    };
    (n as usize).max(1)
}

fn run_fixed<S, R>(
    system: &S,
    mut x: Vec<f64>,
    opts: &SimOptions,
    threshold: f64,
    record: &mut SimRecord,
    report: &mut R,
) -> SimResult<()>
where
    S: OdeSystem + ?Sized,
    R: FnMut(f64, usize) -> SimResult<()>,
{
    let n = fixed_step_count(opts.t_end - opts.t_start, opts.dt);
    if n > opts.max_steps {
        return Err(SimError::StepLimitExceeded {
            max_steps: opts.max_steps,
            t: opts.t_start,
        });
    }

    let mut t = opts.t_start;
    for step in 1..=n {
        // Times are computed from the step index so they never drift past t_end.
        let t_next = if step == n {
            opts.t_end
        } else {
            opts.t_start + step as f64 * opts.dt
        };
        let h = t_next - t;

        x = match opts.integrator {
            IntegratorType::ForwardEuler => ForwardEuler.step(system, t, &x, h)?,
            IntegratorType::RK4 | IntegratorType::Rkf45 => RK4.step(system, t, &x, h)?,
        };
        record.stats.clamped += guard::enforce(system, &opts.negativity, threshold, t_next, &mut x)?;
        t = t_next;
        record.stats.steps = step;

        if step % opts.record_every == 0 || step == n {
            record.push(t, &x);
        }
        report(t, step)?;
    }
    Ok(())
}

fn run_adaptive<S, R>(
    system: &S,
    mut x: Vec<f64>,
    opts: &SimOptions,
    threshold: f64,
    record: &mut SimRecord,
    report: &mut R,
) -> SimResult<()>
where
    S: OdeSystem + ?Sized,
    R: FnMut(f64, usize) -> SimResult<()>,
{
    let rkf = Rkf45::new(opts.adaptive);
    let span = opts.t_end - opts.t_start;
    if span <= 0.0 {
        return Ok(());
    }

    let mut t = opts.t_start;
    let mut h = opts.adaptive.initial_step(span);

    while t < opts.t_end {
        if record.stats.steps >= opts.max_steps {
            return Err(SimError::StepLimitExceeded {
                max_steps: opts.max_steps,
                t,
            });
        }

        let remaining = opts.t_end - t;
        let last = h >= remaining * (1.0 - 1e-12);
        if last {
            h = remaining;
        }

        let outcome = rkf.attempt(system, t, &x, h)?;
        let negative = guard::first_violation(&outcome.state, threshold);
        if let Some(i) = negative {
            // An empty compartment that is still being drained cannot be
            // fixed by a smaller step.
            if x[i] <= 0.0 && eval(system, t, &x)?[i] < 0.0 {
                let mut state = outcome.state;
                guard::enforce(system, &opts.negativity, threshold, t + h, &mut state)?;
                return Err(SimError::StepSizeUnderflow { t, h });
            }
        }
        if !outcome.within_tolerance() || negative.is_some() {
            record.stats.rejected_steps += 1;
            let next = if negative.is_some() {
                h * 0.5
            } else {
                outcome.suggested_h
            };
            trace!(t, h, next, error_norm = outcome.error_norm, "step rejected");
            if next < opts.adaptive.h_min {
                if negative.is_some() {
                    // Surface the offending compartment rather than a bare underflow.
                    let mut state = outcome.state;
                    guard::enforce(system, &opts.negativity, threshold, t + h, &mut state)?;
                }
                return Err(SimError::StepSizeUnderflow { t, h: next });
            }
            h = next;
            continue;
        }

        let t_next = if last { opts.t_end } else { t + h };
        x = outcome.state;
        record.stats.clamped += guard::enforce(system, &opts.negativity, threshold, t_next, &mut x)?;
        t = t_next;
        record.stats.steps += 1;
        let steps = record.stats.steps;

        if steps % opts.record_every == 0 || last {
            record.push(t, &x);
        }
        report(t, steps)?;
        h = outcome.suggested_h.max(opts.adaptive.h_min);
    }
    Ok(())
}

//! Numerical core for compartmental models.
//!
//! Provides:
//! - ODE assembler: compartment graph → pure derivative function
//! - `OdeSystem` trait for pluggable right-hand sides
//! - Fixed-step RK4 and forward Euler integrators
//! - Adaptive Runge–Kutta–Fehlberg 4(5) integrator
//! - Simulation runner with non-negativity policy, decimation and
//!   cooperative cancellation between steps

pub mod adaptive;
pub mod assembler;
pub mod error;
pub mod integrator;
pub mod model;
pub mod sim;

// Internal modules
mod guard;

// Re-exports for public API
pub use adaptive::{AdaptiveOptions, Rkf45, StepOutcome};
pub use assembler::{BoundSystem, DerivativeFn, assemble};
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::OdeSystem;
pub use sim::{
    IntegratorType, NegativityPolicy, SimOptions, SimProgress, SimRecord, SimStats,
    run_sim, run_sim_with_progress,
};

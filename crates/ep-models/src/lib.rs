//! ep-models: compartmental epidemic model library.
//!
//! Provides factories for the built-in models:
//! - SIR (susceptible, infectious, recovered)
//! - SIR-D (adds deceased)
//! - SIR-F (adds an isolated/severe branch with its own recovery and death flows)
//! - SEWIR-F (adds exposure, waning immunity and fatalities)
//!
//! Every model implements `CompartmentalModel`; `instantiate` turns a model
//! plus parameter values and initial conditions into a validated
//! `ModelInstance` (compartment graph + parameter binding).
//!
//! # Example
//!
//! ```
//! use ep_models::{CompartmentalModel, InitialConditions, ParameterSet, Sir};
//!
//! let params = ParameterSet::new().with("beta", 0.3).with("gamma", 0.1);
//! let initial = InitialConditions::new()
//!     .with("S", 990.0)
//!     .with("I", 10.0)
//!     .with("R", 0.0);
//!
//! let instance = Sir.instantiate(&params, &initial, Some(1000.0)).unwrap();
//! assert_eq!(instance.graph().dimension(), 3);
//! let r0 = instance.r0().unwrap();
//! assert!((r0 - 3.0).abs() < 1e-12);
//! ```

pub mod common;
pub mod error;
pub mod instance;
pub mod kind;
pub mod params;
pub mod registry;
pub mod scenarios;
pub mod sewirf;
pub mod sir;
pub mod sird;
pub mod sirf;
pub mod traits;

// Re-exports
pub use error::{InitialConditionIssue, ModelError, ModelResult};
pub use instance::ModelInstance;
pub use kind::ModelKind;
pub use params::{InitialConditions, ParameterInfo, ParameterSet};
pub use registry::{ModelRegistry, RegistryBuilder};
pub use scenarios::{Scenario, find_scenario, scenarios};
pub use sewirf::SewirF;
pub use sir::Sir;
pub use sird::SirD;
pub use sirf::SirF;
pub use traits::CompartmentalModel;

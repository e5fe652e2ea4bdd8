//! Core trait for compartmental model definitions.

use std::fmt;

use ep_core::Real;
use ep_graph::GraphBuilder;

use crate::error::ModelResult;
use crate::instance::{self, ModelInstance};
use crate::params::{InitialConditions, ParameterInfo, ParameterSet};

/// A compartmental ODE model: topology, rate expressions and metadata.
///
/// Implementations only describe structure. Binding values, checking initial
/// conditions and validating the graph happen in the provided `instantiate`.
pub trait CompartmentalModel: Send + Sync + fmt::Debug {
    /// Display name, also the registry key (e.g. `"SIR-D"`).
    fn name(&self) -> &str;

    /// One-paragraph description of the model.
    fn description(&self) -> &str;

    /// Compartment names in state-vector order.
    fn compartments(&self) -> &[&'static str];

    /// Parameters with descriptions and defaults.
    fn parameters(&self) -> &[ParameterInfo];

    /// Default initial conditions (population fractions).
    fn default_initial_conditions(&self) -> InitialConditions;

    /// Declare compartments (initial value 0), parameters and flows.
    fn declare(&self, builder: &mut GraphBuilder);

    /// Basic reproduction number, `None` when undefined for these values.
    fn basic_reproduction_number(&self, params: &ParameterSet) -> Option<Real>;

    /// Compartments that must keep a constant sum. Defaults to all of them.
    fn conserved_group(&self) -> Option<Vec<&str>> {
        Some(self.compartments().to_vec())
    }

    /// Default value of every parameter.
    fn default_parameters(&self) -> ParameterSet {
        self.parameters()
            .iter()
            .map(|p| (p.name, p.default))
            .collect()
    }

    /// Bind values and produce a validated instance.
    ///
    /// Parameters omitted from `params` take their defaults; compartments
    /// omitted from `initial` start at 0. When `population` is given, the
    /// initial values of the conserved group must sum to it.
    fn instantiate(
        &self,
        params: &ParameterSet,
        initial: &InitialConditions,
        population: Option<Real>,
    ) -> ModelResult<ModelInstance> {
        instance::instantiate(self, params, initial, population)
    }
}

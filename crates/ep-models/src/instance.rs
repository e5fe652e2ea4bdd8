//! Binding a model definition to concrete values.

use ep_core::{Real, Tolerances, ensure_finite, ensure_non_negative, nearly_equal};
use ep_graph::{CompartmentGraph, GraphBuilder, GraphDescription};
use tracing::debug;

use crate::error::{InitialConditionIssue, ModelError, ModelResult};
use crate::params::{InitialConditions, ParameterSet};
use crate::traits::CompartmentalModel;

/// Tolerance for the conserved-total check on initial conditions.
pub const INITIAL_TOTAL_TOLERANCE: Tolerances = Tolerances {
    abs: 1e-9,
    rel: 1e-9,
};

/// A validated compartment graph plus its parameter binding.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    model: String,
    graph: CompartmentGraph,
    parameter_set: ParameterSet,
    params: Vec<Real>,
    r0: Option<Real>,
}

impl ModelInstance {
    /// Name of the model this instance was built from.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn graph(&self) -> &CompartmentGraph {
        &self.graph
    }

    /// Parameter values in graph order (the binding the assembler consumes).
    pub fn params(&self) -> &[Real] {
        &self.params
    }

    /// Resolved parameter values by name, defaults included.
    pub fn parameter_set(&self) -> &ParameterSet {
        &self.parameter_set
    }

    /// Initial state vector in graph order.
    pub fn initial_state(&self) -> Vec<Real> {
        self.graph.initial_state()
    }

    pub fn r0(&self) -> Option<Real> {
        self.r0
    }

    pub fn describe(&self) -> GraphDescription {
        self.graph.describe()
    }
}

pub(crate) fn instantiate<M: CompartmentalModel + ?Sized>(
    model: &M,
    params: &ParameterSet,
    initial: &InitialConditions,
    population: Option<Real>,
) -> ModelResult<ModelInstance> {
    let resolved = resolve_parameters(model, params)?;
    check_initial_values(model, initial)?;

    let mut builder = GraphBuilder::new();
    model.declare(&mut builder);

    let names: Vec<String> = builder.compartment_names().map(str::to_string).collect();
    for (i, name) in names.iter().enumerate() {
        let value = initial.get(name).unwrap_or(0.0);
        builder.set_initial_value(ep_core::CompartmentId::from_index(i as u32), value);
    }

    if let Some(group) = model.conserved_group() {
        let actual: Real = group.iter().filter_map(|c| initial.get(c)).sum();
        let total = match population {
            Some(expected) => {
                if !nearly_equal(expected, actual, INITIAL_TOTAL_TOLERANCE) {
                    return Err(ModelError::InitialConditionMismatch(
                        InitialConditionIssue::TotalMismatch { expected, actual },
                    ));
                }
                expected
            }
            None => actual,
        };
        builder.conserve_total(group, total);
    }

    let graph = builder.build()?;

    let mut binding = Vec::with_capacity(graph.parameters().len());
    for param in graph.parameters() {
        let value = resolved
            .get(&param.name)
            .ok_or_else(|| ModelError::MissingParameter {
                model: model.name().to_string(),
                name: param.name.clone(),
            })?;
        binding.push(value);
    }

    let r0 = model.basic_reproduction_number(&resolved);
    debug!(
        model = model.name(),
        compartments = graph.dimension(),
        flows = graph.flows().len(),
        ?r0,
        "model instantiated"
    );

    Ok(ModelInstance {
        model: model.name().to_string(),
        graph,
        parameter_set: resolved,
        params: binding,
        r0,
    })
}

/// Merge supplied values over defaults, rejecting unknown or invalid entries.
fn resolve_parameters<M: CompartmentalModel + ?Sized>(
    model: &M,
    params: &ParameterSet,
) -> ModelResult<ParameterSet> {
    for (name, _) in params.iter() {
        if !model.parameters().iter().any(|p| p.name == name) {
            return Err(ModelError::UnknownParameter {
                model: model.name().to_string(),
                name: name.to_string(),
            });
        }
    }

    let mut resolved = ParameterSet::new();
    for info in model.parameters() {
        let value = params.get(info.name).unwrap_or(info.default);
        ensure_non_negative(value, "parameter").map_err(|_| ModelError::InvalidParameter {
            name: info.name.to_string(),
            value,
        })?;
        resolved.insert(info.name, value);
    }
    Ok(resolved)
}

fn check_initial_values<M: CompartmentalModel + ?Sized>(
    model: &M,
    initial: &InitialConditions,
) -> ModelResult<()> {
    for (name, value) in initial.iter() {
        if !model.compartments().iter().any(|c| *c == name) {
            return Err(ModelError::UnknownCompartment {
                model: model.name().to_string(),
                name: name.to_string(),
            });
        }
        ensure_finite(value, "initial value").map_err(|_| {
            ModelError::InitialConditionMismatch(InitialConditionIssue::NonFinite {
                compartment: name.to_string(),
                value,
            })
        })?;
        if value < 0.0 {
            return Err(ModelError::InitialConditionMismatch(
                InitialConditionIssue::Negative {
                    compartment: name.to_string(),
                    value,
                },
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sir::Sir;

    fn sir_initial() -> InitialConditions {
        InitialConditions::new()
            .with("S", 990.0)
            .with("I", 10.0)
            .with("R", 0.0)
    }

    #[test]
    fn defaults_fill_missing_parameters() {
        let inst = Sir
            .instantiate(&ParameterSet::new().with("beta", 0.3), &sir_initial(), None)
            .unwrap();
        assert_eq!(inst.parameter_set().get("gamma"), Some(0.1));
        assert_eq!(inst.params(), &[0.3, 0.1]);
    }

    #[test]
    fn population_defaults_to_initial_sum() {
        let inst = Sir
            .instantiate(&ParameterSet::new(), &sir_initial(), None)
            .unwrap();
        let conserved = inst.graph().conserved().unwrap();
        assert_eq!(conserved.total, 1000.0);
        assert_eq!(conserved.members.len(), 3);
    }

    #[test]
    fn total_mismatch_is_rejected() {
        let err = Sir
            .instantiate(&ParameterSet::new(), &sir_initial(), Some(1200.0))
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::InitialConditionMismatch(InitialConditionIssue::TotalMismatch { .. })
        ));
    }

    #[test]
    fn total_within_tolerance_is_accepted() {
        assert!(
            Sir.instantiate(&ParameterSet::new(), &sir_initial(), Some(1000.0 + 1e-8))
                .is_ok()
        );
    }

    #[test]
    fn negative_initial_value_is_rejected() {
        let initial = sir_initial().with("R", -1.0);
        let err = Sir
            .instantiate(&ParameterSet::new(), &initial, None)
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::InitialConditionMismatch(InitialConditionIssue::Negative {
                compartment: "R".into(),
                value: -1.0
            })
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = Sir
            .instantiate(&ParameterSet::new().with("mu", 0.1), &sir_initial(), None)
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownParameter { .. }));

        let err = Sir
            .instantiate(&ParameterSet::new(), &sir_initial().with("D", 1.0), None)
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownCompartment { .. }));
    }

    #[test]
    fn invalid_parameter_is_rejected() {
        for bad in [-0.1, f64::NAN, f64::INFINITY] {
            let err = Sir
                .instantiate(&ParameterSet::new().with("gamma", bad), &sir_initial(), None)
                .unwrap_err();
            assert!(matches!(err, ModelError::InvalidParameter { .. }));
        }
    }
}

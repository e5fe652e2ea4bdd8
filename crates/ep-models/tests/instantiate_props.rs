//! Property tests: initial conditions that add up to the population always validate.

use ep_models::{
    CompartmentalModel, InitialConditionIssue, InitialConditions, ModelError, ModelKind,
    ModelRegistry, ParameterSet,
};
use proptest::prelude::*;

/// Split `population` across `names` in proportion to `weights`.
fn split(names: &[&str], weights: &[f64], population: f64) -> InitialConditions {
    let total: f64 = weights[..names.len()].iter().sum();
    names
        .iter()
        .zip(weights)
        .map(|(name, w)| (*name, w / total * population))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matching_population_always_validates(
        kind in prop::sample::select(ModelKind::ALL.to_vec()),
        weights in prop::collection::vec(0.0f64..1.0, 6),
        bias in 0.01f64..1.0,
        population in 1.0f64..1e8,
    ) {
        let registry = ModelRegistry::builtin();
        let model = registry.get_kind(kind).unwrap();
        let mut weights = weights;
        weights[0] += bias;
        let initial = split(model.compartments(), &weights, population);

        let inst = model
            .instantiate(&ParameterSet::new(), &initial, Some(population))
            .unwrap();
        let total: f64 = inst.initial_state().iter().sum();
        prop_assert!((total - population).abs() <= 1e-9 * population);
        prop_assert!(inst.initial_state().iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn population_off_by_a_percent_is_rejected(
        kind in prop::sample::select(ModelKind::ALL.to_vec()),
        weights in prop::collection::vec(0.01f64..1.0, 6),
        population in 1.0f64..1e8,
    ) {
        let registry = ModelRegistry::builtin();
        let model = registry.get_kind(kind).unwrap();
        prop_assume!(model.conserved_group().is_some());
        let initial = split(model.compartments(), &weights, population);

        let err = model
            .instantiate(&ParameterSet::new(), &initial, Some(population * 1.01))
            .unwrap_err();
        let is_total_mismatch = matches!(
            err,
            ModelError::InitialConditionMismatch(InitialConditionIssue::TotalMismatch { .. })
        );
        prop_assert!(is_total_mismatch, "{err:?}");
    }
}

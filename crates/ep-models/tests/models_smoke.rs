//! Smoke tests for the built-in model definitions.

use std::collections::BTreeSet;

use ep_models::{
    CompartmentalModel, InitialConditionIssue, InitialConditions, ModelError, ModelKind,
    ModelRegistry, ParameterSet, SewirF, Sir, SirD, SirF,
};

fn names(model: &dyn CompartmentalModel) -> BTreeSet<String> {
    let inst = model
        .instantiate(
            &ParameterSet::new(),
            &model.default_initial_conditions(),
            Some(1.0),
        )
        .unwrap();
    inst.graph()
        .compartments()
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn compartment_sets_match_model_definitions() {
    assert_eq!(names(&Sir), set(&["S", "I", "R"]));
    assert_eq!(names(&SirD), set(&["S", "I", "R", "D"]));
    assert_eq!(names(&SirF), set(&["S", "I", "R", "F", "D"]));
    assert_eq!(names(&SewirF), set(&["S", "E", "W", "I", "R", "F"]));
}

#[test]
fn every_builtin_validates_with_defaults() {
    let registry = ModelRegistry::builtin();
    for model in registry.iter() {
        let inst = model
            .instantiate(
                &model.default_parameters(),
                &model.default_initial_conditions(),
                None,
            )
            .unwrap_or_else(|e| panic!("{} failed: {e}", model.name()));

        // every declared parameter drives at least one flow
        let graph = inst.graph();
        for param in graph.parameters() {
            assert!(
                graph.flows().iter().any(|f| f.rate.parameter() == param.id),
                "{}: parameter {} unused",
                model.name(),
                param.name
            );
        }
        assert_eq!(inst.params().len(), model.parameters().len());
        assert_eq!(graph.dimension(), model.compartments().len());
        assert!(inst.r0().is_some());
    }
}

#[test]
fn graph_order_follows_model_order() {
    for kind in ModelKind::ALL {
        let model = ModelRegistry::builtin().get_kind(kind).unwrap();
        let inst = model
            .instantiate(
                &ParameterSet::new(),
                &model.default_initial_conditions(),
                None,
            )
            .unwrap();
        let layout = inst.graph().layout();
        let order: Vec<&str> = layout.names().iter().map(String::as_str).collect();
        assert_eq!(order, model.compartments());
    }
}

#[test]
fn sirf_isolation_branch_is_distinct_from_sird_fatality() {
    // SIR-F's F is an intermediate compartment (isolated/severe cases that can
    // still recover), whereas SIR-D's D is a pure sink reached directly from I.
    let sird = SirD
        .instantiate(&ParameterSet::new(), &SirD.default_initial_conditions(), None)
        .unwrap();
    let sirf = SirF
        .instantiate(&ParameterSet::new(), &SirF.default_initial_conditions(), None)
        .unwrap();

    let d = sird.graph().compartment_id("D").unwrap();
    assert_eq!(sird.graph().outflows(d).count(), 0);

    let f = sirf.graph().compartment_id("F").unwrap();
    let targets: Vec<&str> = sirf
        .graph()
        .outflows(f)
        .map(|fl| sirf.graph().compartment(fl.target).unwrap().name.as_str())
        .collect();
    assert_eq!(targets, vec!["R", "D"]);
    assert_ne!(sird.graph().flows().len(), sirf.graph().flows().len());
}

#[test]
fn sewirf_waning_cycle_returns_to_susceptible() {
    let inst = SewirF
        .instantiate(&ParameterSet::new(), &SewirF.default_initial_conditions(), None)
        .unwrap();
    let desc = inst.describe();
    let edges: Vec<(&str, &str, &str)> = desc.edge_tuples().collect();
    assert!(edges.contains(&("R", "W", "omega")));
    assert!(edges.contains(&("W", "S", "rho")));
    assert!(edges.contains(&("S", "E", "beta")));
}

#[test]
fn r0_values_for_all_models() {
    let cases: [(&dyn CompartmentalModel, ParameterSet, f64); 4] = [
        (
            &Sir,
            ParameterSet::new().with("beta", 0.5).with("gamma", 0.1),
            5.0,
        ),
        (
            &SirD,
            ParameterSet::new()
                .with("beta", 0.5)
                .with("gamma", 0.1)
                .with("alpha", 0.1),
            2.5,
        ),
        (
            &SirF,
            ParameterSet::new()
                .with("beta", 0.4)
                .with("gamma_i", 0.1)
                .with("alpha", 0.1),
            2.0,
        ),
        (
            &SewirF,
            ParameterSet::new()
                .with("beta", 0.6)
                .with("gamma", 0.1)
                .with("alpha", 0.1),
            3.0,
        ),
    ];
    for (model, params, expected) in cases {
        let inst = model
            .instantiate(&params, &model.default_initial_conditions(), None)
            .unwrap();
        assert!(
            (inst.r0().unwrap() - expected).abs() < 1e-12,
            "{}",
            model.name()
        );
    }
}

#[test]
fn head_count_initial_conditions_check_population() {
    let initial = InitialConditions::new()
        .with("S", 990.0)
        .with("I", 10.0)
        .with("R", 0.0);
    assert!(Sir.instantiate(&ParameterSet::new(), &initial, Some(1000.0)).is_ok());

    let err = Sir
        .instantiate(&ParameterSet::new(), &initial, Some(1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::InitialConditionMismatch(InitialConditionIssue::TotalMismatch { .. })
    ));
}

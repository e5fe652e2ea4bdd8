//! End-to-end integration of the built-in models.

use ep_models::{CompartmentalModel, InitialConditions, ModelInstance, ParameterSet, SewirF, Sir};
use ep_graph::{GraphBuilder, Rate};
use ep_sim::{IntegratorType, SimError, SimOptions, SimRecord, assemble, run_sim};

fn sir_instance(beta: f64, gamma: f64) -> ModelInstance {
    let params = ParameterSet::new().with("beta", beta).with("gamma", gamma);
    let initial = InitialConditions::new()
        .with("S", 990.0)
        .with("I", 10.0)
        .with("R", 0.0);
    Sir.instantiate(&params, &initial, None)
        .expect("SIR instance should build")
}

fn integrate(instance: &ModelInstance, opts: &SimOptions) -> SimRecord {
    let derivative = assemble(instance.graph());
    let system = derivative.bind(instance.params()).expect("params bind");
    run_sim(&system, &instance.initial_state(), opts).expect("simulation should succeed")
}

fn sir_options(integrator: IntegratorType) -> SimOptions {
    SimOptions {
        t_start: 0.0,
        t_end: 100.0,
        dt: 0.1,
        integrator,
        ..SimOptions::default()
    }
}

#[test]
fn sir_epidemic_peaks_then_decays() {
    let inst = sir_instance(0.3, 0.1);
    let rec = integrate(&inst, &sir_options(IntegratorType::RK4));

    assert_eq!(rec.t.first(), Some(&0.0));
    assert_eq!(rec.t.last(), Some(&100.0));
    assert!(rec.t.windows(2).all(|w| w[1] > w[0]));

    let infected: Vec<f64> = rec.x.iter().map(|x| x[1]).collect();
    let (peak_idx, peak) = infected
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::MIN), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });
    assert!(peak > 10.0, "infection should grow, peak {peak}");
    assert!(peak_idx > 0 && peak_idx < infected.len() - 1);
    assert!(*infected.last().unwrap() < peak);

    for x in &rec.x {
        let total: f64 = x.iter().sum();
        assert!((total - 1000.0).abs() < 1e-6, "total drifted to {total}");
        assert!(x.iter().all(|v| *v >= 0.0));
    }
}

#[test]
fn zero_transmission_keeps_susceptibles_constant() {
    let inst = sir_instance(0.0, 0.1);
    let rec = integrate(&inst, &sir_options(IntegratorType::RK4));

    for w in rec.x.windows(2) {
        assert_eq!(w[1][0], 990.0);
        assert!(w[1][1] <= w[0][1]);
    }
}

#[test]
fn all_rates_zero_leaves_sewirf_unchanged() {
    let params: ParameterSet = SewirF
        .parameters()
        .iter()
        .map(|p| (p.name, 0.0))
        .collect();
    let initial = SewirF.default_initial_conditions().scaled(1000.0);
    let inst = SewirF
        .instantiate(&params, &initial, None)
        .expect("SEWIR-F instance");
    let x0 = inst.initial_state();

    for integrator in IntegratorType::ALL {
        let rec = integrate(&inst, &sir_options(integrator));
        assert_eq!(rec.final_state(), Some(x0.as_slice()));
    }
}

#[test]
fn identical_inputs_give_identical_series() {
    let inst = sir_instance(0.3, 0.1);
    for integrator in IntegratorType::ALL {
        let a = integrate(&inst, &sir_options(integrator));
        let b = integrate(&inst, &sir_options(integrator));
        assert_eq!(a, b);
    }
}

#[test]
fn methods_agree_on_final_size() {
    let inst = sir_instance(0.3, 0.1);
    let rk4 = integrate(&inst, &sir_options(IntegratorType::RK4));
    let rkf = integrate(&inst, &sir_options(IntegratorType::Rkf45));
    let r_rk4 = rk4.final_state().unwrap()[2];
    let r_rkf = rkf.final_state().unwrap()[2];
    assert!(
        (r_rk4 - r_rkf).abs() < 1e-3 * r_rk4,
        "rk4 {r_rk4} vs rkf45 {r_rkf}"
    );
}

#[test]
fn sewirf_conserves_population() {
    let inst = SewirF
        .instantiate(
            &SewirF.default_parameters(),
            &SewirF.default_initial_conditions().scaled(1_000_000.0),
            None,
        )
        .expect("SEWIR-F instance");
    let rec = integrate(&inst, &sir_options(IntegratorType::RK4));
    for x in &rec.x {
        let total: f64 = x.iter().sum();
        assert!((total - 1_000_000.0).abs() < 1e-3);
    }
}

#[test]
fn constant_drain_fails_the_same_way_for_every_method() {
    let mut builder = GraphBuilder::new();
    builder.declare_compartment("S", 1.0);
    builder.declare_compartment("R", 0.0);
    builder.declare_parameter("k");
    builder.declare_flow("S", "R", Rate::constant("k"));
    let graph = builder.build().unwrap();

    let derivative = assemble(&graph);
    let params = [1.0];
    let system = derivative.bind(&params).unwrap();
    for integrator in IntegratorType::ALL {
        let opts = SimOptions {
            t_end: 5.0,
            dt: 0.1,
            integrator,
            max_steps: 100_000,
            ..SimOptions::default()
        };
        let err = run_sim(&system, &graph.initial_state(), &opts).unwrap_err();
        assert!(
            matches!(err, SimError::NumericalInstability { ref compartment, t, .. }
                if compartment == "S" && t < 1.2),
            "{integrator}: {err:?}"
        );
    }
}

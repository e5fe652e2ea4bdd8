//! Property tests: run identity and parallel execution.

use std::sync::Arc;

use ep_app::{ModelRegistry, RunConfig, SimulationSession, run_parallel};
use proptest::prelude::*;

fn registry() -> Arc<ModelRegistry> {
    Arc::new(ModelRegistry::builtin())
}

fn run_id(registry: &Arc<ModelRegistry>, config: RunConfig) -> String {
    let mut session = SimulationSession::new(Arc::clone(registry));
    session.configure(config).unwrap();
    session.run_id().unwrap().to_string()
}

fn model_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["SIR", "SIR-D", "SIR-F", "SEWIR-F"])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn identical_configs_share_a_run_id(
        model in model_name(),
        beta in 0.0f64..2.0,
        t_end in 1.0f64..200.0,
    ) {
        let registry = registry();
        let config = RunConfig::new(model, t_end).with_parameter("beta", beta);
        let a = run_id(&registry, config.clone());
        let b = run_id(&registry, config.clone());
        prop_assert_eq!(&a, &b);

        let other = run_id(&registry, config.with_parameter("beta", beta + 0.5));
        prop_assert_ne!(a, other);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn parallel_runs_match_sequential_runs(
        models in prop::collection::vec(model_name(), 1..5),
        beta in 0.05f64..1.0,
        t_end in 1.0f64..30.0,
    ) {
        let registry = registry();
        let configs: Vec<RunConfig> = models
            .iter()
            .enumerate()
            .map(|(i, model)| {
                RunConfig::new(*model, t_end).with_parameter("beta", beta + 0.1 * i as f64)
            })
            .collect();

        let parallel = run_parallel(&registry, configs.clone());
        prop_assert_eq!(parallel.len(), configs.len());
        for (config, result) in configs.into_iter().zip(parallel) {
            let mut session = SimulationSession::new(Arc::clone(&registry));
            session.configure(config).unwrap();
            let sequential = session.run().unwrap();
            let parallel = result.unwrap();
            prop_assert_eq!(parallel.run_id(), sequential.run_id());
            prop_assert_eq!(&parallel.series, &sequential.series);
        }
    }
}

//! Query helpers for models and finished runs.

use ep_graph::GraphDescription;
use ep_models::{InitialConditions, ModelRegistry, ParameterSet};
use ep_results::{EpidemicMetrics, compute_metrics};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::session::RunOutput;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub model: String,
    pub method: String,
    pub time_range: (f64, f64),
    pub sample_count: usize,
    pub r0: Option<f64>,
    pub metrics: EpidemicMetrics,
}

/// Get a run summary; metrics assume the `S`/`I` naming every built-in uses.
pub fn summarize(output: &RunOutput) -> RunSummary {
    let series = &output.series;
    let t_min = series.first_sample().map(|s| s.time).unwrap_or(0.0);
    let t_max = series.final_sample().map(|s| s.time).unwrap_or(0.0);

    RunSummary {
        run_id: output.manifest.run_id.clone(),
        model: output.manifest.model.clone(),
        method: output.manifest.method.clone(),
        time_range: (t_min, t_max),
        sample_count: series.len(),
        r0: output.r0,
        metrics: compute_metrics(series, output.r0, "S", "I"),
    }
}

/// Extract `(time, value)` pairs for one compartment.
pub fn extract_series(output: &RunOutput, compartment: &str) -> AppResult<Vec<(f64, f64)>> {
    output.series.pairs(compartment).map_err(|_| {
        AppError::InvalidInput(format!(
            "Unknown compartment '{}' (available: {})",
            compartment,
            output.series.compartments().join(", ")
        ))
    })
}

/// List all compartment names in a run, in state order.
pub fn list_compartments(output: &RunOutput) -> Vec<String> {
    output.series.compartments().to_vec()
}

/// Display row for one model parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub name: String,
    pub description: String,
    pub default: f64,
}

/// Display summary of a registered model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub description: String,
    pub compartments: Vec<String>,
    pub parameters: Vec<ParameterSummary>,
    pub default_r0: Option<f64>,
}

/// Summaries of every registered model, in registration order.
pub fn list_models(registry: &ModelRegistry) -> Vec<ModelSummary> {
    registry
        .iter()
        .map(|model| {
            let defaults = model.default_parameters();
            ModelSummary {
                name: model.name().to_string(),
                description: model.description().to_string(),
                compartments: model.compartments().iter().map(|c| c.to_string()).collect(),
                parameters: model
                    .parameters()
                    .iter()
                    .map(|p| ParameterSummary {
                        name: p.name.to_string(),
                        description: p.description.to_string(),
                        default: p.default,
                    })
                    .collect(),
                default_r0: model.basic_reproduction_number(&defaults),
            }
        })
        .collect()
}

/// Graph of a model instantiated with its defaults.
pub fn model_graph(registry: &ModelRegistry, name: &str) -> AppResult<GraphDescription> {
    let model = registry.get(name)?;
    let initial: InitialConditions = model.default_initial_conditions();
    let instance = model.instantiate(&ParameterSet::new(), &initial, None)?;
    Ok(instance.describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::session::SimulationSession;
    use std::sync::Arc;

    fn output() -> Arc<RunOutput> {
        let mut session = SimulationSession::new(Arc::new(ModelRegistry::builtin()));
        session
            .configure(
                RunConfig::new("SIR", 100.0)
                    .with_parameter("beta", 0.3)
                    .with_parameter("gamma", 0.1)
                    .with_initial("S", 990.0)
                    .with_initial("I", 10.0),
            )
            .unwrap();
        session.run().unwrap()
    }

    #[test]
    fn summary_reports_epidemic_shape() {
        let out = output();
        let summary = summarize(&out);
        assert_eq!(summary.model, "SIR");
        assert_eq!(summary.time_range, (0.0, 100.0));
        assert_eq!(summary.sample_count, 1001);
        let peak = summary.metrics.peak_infectious.unwrap();
        assert!(peak.time > 0.0 && peak.time < 100.0);
        assert!(summary.metrics.final_size.unwrap() > 0.0);
        assert!(summary.metrics.conservation_drift < 1e-9);
    }

    #[test]
    fn series_extraction() {
        let out = output();
        let s = extract_series(&out, "S").unwrap();
        assert_eq!(s.len(), 1001);
        assert_eq!(s[0], (0.0, 990.0));
        assert!(matches!(
            extract_series(&out, "Q"),
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(list_compartments(&out), ["S", "I", "R"]);
    }

    #[test]
    fn model_listing_and_graphs() {
        let registry = ModelRegistry::builtin();
        let models = list_models(&registry);
        assert_eq!(models.len(), 4);
        assert_eq!(models[0].name, "SIR");
        assert!(models.iter().all(|m| !m.parameters.is_empty()));

        let graph = model_graph(&registry, "sewir-f").unwrap();
        assert_eq!(graph.compartments.len(), 6);
        assert!(matches!(
            model_graph(&registry, "SIRX"),
            Err(AppError::UnknownModelKind { .. })
        ));
    }
}

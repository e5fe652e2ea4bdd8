//! Run configuration: what to simulate and how.
//!
//! A configuration names a model kind, parameter overrides, initial
//! conditions, an optional declared population total, a time span and solver
//! settings. It can be written by hand in YAML or JSON:
//!
//! ```yaml
//! model: SIR
//! parameters: { beta: 0.3, gamma: 0.1 }
//! initial_conditions: { S: 990, I: 10, R: 0 }
//! t_end: 100
//! solver: { method: rk4, dt: 0.1 }
//! ```

use std::fs;
use std::path::Path;

use ep_models::{InitialConditions, ParameterSet, Scenario};
use ep_results::StepSpec;
use ep_sim::{AdaptiveOptions, IntegratorType, SimOptions};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Solver settings. Omitted fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub method: IntegratorType,
    /// Fixed step; also the initial step of the adaptive method.
    pub dt: f64,
    pub rtol: f64,
    pub atol: f64,
    pub h_max: Option<f64>,
    pub record_every: usize,
    pub max_steps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let adaptive = AdaptiveOptions::default();
        Self {
            method: IntegratorType::RK4,
            dt: 0.1,
            rtol: adaptive.rtol,
            atol: adaptive.atol,
            h_max: None,
            record_every: 1,
            max_steps: 1_000_000,
        }
    }
}

impl SolverConfig {
    pub fn step_spec(&self) -> StepSpec {
        if self.method.is_adaptive() {
            StepSpec::Adaptive {
                rtol: self.rtol,
                atol: self.atol,
            }
        } else {
            StepSpec::Fixed { dt: self.dt }
        }
    }
}

/// A complete request for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Model kind (`SIR`, `SIR-D`, `SIR-F`, `SEWIR-F`).
    pub model: String,
    /// Parameter overrides; unspecified parameters take model defaults.
    #[serde(default)]
    pub parameters: ParameterSet,
    /// Initial compartment values. When empty, the model's default
    /// fractions are scaled by `population` (or used as-is).
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    /// Declared conserved total the initial values must sum to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<f64>,
    #[serde(default)]
    pub t_start: f64,
    pub t_end: f64,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl RunConfig {
    pub fn new(model: impl Into<String>, t_end: f64) -> Self {
        Self {
            model: model.into(),
            parameters: ParameterSet::new(),
            initial_conditions: InitialConditions::new(),
            population: None,
            t_start: 0.0,
            t_end,
            solver: SolverConfig::default(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name, value);
        self
    }

    pub fn with_initial(mut self, name: impl Into<String>, value: f64) -> Self {
        self.initial_conditions.insert(name, value);
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Head-count configuration for a preset scenario.
    pub fn from_scenario(scenario: &Scenario, t_end: f64) -> Self {
        Self {
            model: scenario.model.name().to_string(),
            parameters: scenario.parameters.clone(),
            initial_conditions: scenario.initial_conditions.scaled(scenario.population),
            population: Some(scenario.population),
            t_start: 0.0,
            t_end,
            solver: SolverConfig::default(),
        }
    }

    pub fn to_yaml_string(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Integration options for this configuration.
    pub fn sim_options(&self) -> SimOptions {
        let defaults = AdaptiveOptions::default();
        SimOptions {
            t_start: self.t_start,
            t_end: self.t_end,
            dt: self.solver.dt,
            integrator: self.solver.method,
            adaptive: AdaptiveOptions {
                rtol: self.solver.rtol,
                atol: self.solver.atol,
                h_init: self.solver.dt.max(0.0),
                h_max: self.solver.h_max.unwrap_or(defaults.h_max),
                ..defaults
            },
            max_steps: self.solver.max_steps,
            record_every: self.solver.record_every,
            ..SimOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_with_defaults() {
        let cfg = RunConfig::from_yaml_str(
            "model: SIR\nparameters: { beta: 0.3 }\ninitial_conditions: { S: 990, I: 10 }\nt_end: 50\n",
        )
        .unwrap();
        assert_eq!(cfg.model, "SIR");
        assert_eq!(cfg.parameters.get("beta"), Some(0.3));
        assert_eq!(cfg.initial_conditions.get("I"), Some(10.0));
        assert_eq!(cfg.t_start, 0.0);
        assert_eq!(cfg.solver, SolverConfig::default());
    }

    #[test]
    fn json_solver_settings() {
        let cfg = RunConfig::from_json_str(
            r#"{"model":"SEWIR-F","t_end":10,"solver":{"method":"rkf45","rtol":1e-8}}"#,
        )
        .unwrap();
        assert_eq!(cfg.solver.method, IntegratorType::Rkf45);
        assert_eq!(cfg.solver.rtol, 1e-8);
        let opts = cfg.sim_options();
        assert_eq!(opts.adaptive.rtol, 1e-8);
        assert!(matches!(cfg.solver.step_spec(), StepSpec::Adaptive { .. }));
    }

    #[test]
    fn unknown_fields_are_config_errors() {
        let err = RunConfig::from_yaml_str("model: SIR\nt_end: 1\nbogus: 3\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RunConfig::load(Path::new("/nonexistent/run.yaml")).unwrap_err();
        assert!(matches!(err, AppError::ConfigRead { .. }));
    }

    #[test]
    fn yaml_round_trip() {
        let cfg = RunConfig::new("SIR-D", 30.0)
            .with_parameter("alpha", 0.02)
            .with_initial("S", 100.0);
        let back = RunConfig::from_yaml_str(&cfg.to_yaml_string().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn scenario_config_uses_head_counts() {
        let scenario = ep_models::find_scenario("covid19-sp").unwrap();
        let cfg = RunConfig::from_scenario(&scenario, 180.0);
        assert_eq!(cfg.model, "SIR");
        assert_eq!(cfg.population, Some(scenario.population));
        assert!((cfg.initial_conditions.get("I").unwrap() - 1000.0).abs() < 1e-6);
    }
}

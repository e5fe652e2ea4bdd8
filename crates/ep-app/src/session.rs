//! Simulation session: configure once, run, inspect.
//!
//! `configure` does every structural check (model kind, parameters, initial
//! conditions, graph validation, solver settings) before any integration
//! work. `run` assembles the derivative function and integrates it. Finished
//! outputs are shared behind `Arc` and never mutated; running again only
//! replaces the session's pointer.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use ep_graph::GraphDescription;
use ep_models::{ModelInstance, ModelRegistry, ParameterSet};
use ep_results::{RunManifest, RunRecord, RunStore, TimeSeries, compute_run_id};
use ep_sim::{SimOptions, SimStats, assemble, run_sim_with_progress};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{RunConfig, SolverConfig};
use crate::error::{AppError, AppResult};
use crate::progress::{IntegrationProgress, RunProgressEvent, RunStage};

/// Version string folded into every run id.
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of one completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub manifest: RunManifest,
    pub series: Arc<TimeSeries>,
    pub graph: GraphDescription,
    pub r0: Option<f64>,
    /// Integration counters; `None` when served from the cache.
    pub stats: Option<SimStats>,
    pub loaded_from_cache: bool,
}

impl RunOutput {
    pub fn run_id(&self) -> &str {
        &self.manifest.run_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    /// Transient: held only while `run_with_progress` executes, and never
    /// observed by callers.
    Running,
    Completed(Arc<RunOutput>),
    Failed(AppError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unconfigured => "unconfigured",
            SessionState::Configured => "configured",
            SessionState::Running => "running",
            SessionState::Completed(_) => "completed",
            SessionState::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything `configure` resolved and validated.
#[derive(Debug)]
struct PreparedRun {
    config: RunConfig,
    instance: ModelInstance,
    options: SimOptions,
    graph: GraphDescription,
    run_id: String,
}

/// Canonical, fully resolved description of a run; hashed into the run id.
#[derive(Serialize)]
struct ResolvedRun<'a> {
    model: &'a str,
    parameters: &'a ParameterSet,
    initial_state: Vec<(&'a str, f64)>,
    population: Option<f64>,
    t_start: f64,
    t_end: f64,
    solver: &'a SolverConfig,
}

#[derive(Debug)]
pub struct SimulationSession {
    registry: Arc<ModelRegistry>,
    solver_version: String,
    state: SessionState,
    prepared: Option<PreparedRun>,
    last_output: Option<Arc<RunOutput>>,
    store: RunStore,
}

impl SimulationSession {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            solver_version: SOLVER_VERSION.to_string(),
            state: SessionState::Unconfigured,
            prepared: None,
            last_output: None,
            store: RunStore::new(),
        }
    }

    pub fn with_solver_version(mut self, version: impl Into<String>) -> Self {
        self.solver_version = version.into();
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_configured(&self) -> bool {
        self.prepared.is_some()
    }

    pub fn config(&self) -> Option<&RunConfig> {
        self.prepared.as_ref().map(|p| &p.config)
    }

    pub fn instance(&self) -> Option<&ModelInstance> {
        self.prepared.as_ref().map(|p| &p.instance)
    }

    /// Run id the current configuration will produce.
    pub fn run_id(&self) -> Option<&str> {
        self.prepared.as_ref().map(|p| p.run_id.as_str())
    }

    /// Nodes and edges of the configured model, for display.
    pub fn graph_description(&self) -> AppResult<&GraphDescription> {
        self.prepared
            .as_ref()
            .map(|p| &p.graph)
            .ok_or(AppError::NotConfigured)
    }

    /// Most recent completed output, kept across reconfiguration.
    pub fn last_output(&self) -> Option<Arc<RunOutput>> {
        self.last_output.clone()
    }

    pub fn cache(&self) -> &RunStore {
        &self.store
    }

    /// Drop the configuration and outputs. Cached runs are kept.
    pub fn reset(&mut self) {
        self.prepared = None;
        self.last_output = None;
        self.state = SessionState::Unconfigured;
    }

    /// Validate and bind a configuration.
    ///
    /// On error the session keeps its previous state and configuration.
    pub fn configure(&mut self, config: RunConfig) -> AppResult<()> {
        let prepared = self.prepare(config).inspect_err(|err| {
            warn!(error = %err, "configuration rejected");
        })?;
        info!(
            model = prepared.instance.model(),
            run_id = %prepared.run_id,
            compartments = prepared.graph.compartments.len(),
            "session configured"
        );
        self.prepared = Some(prepared);
        self.state = SessionState::Configured;
        Ok(())
    }

    fn prepare(&self, config: RunConfig) -> AppResult<PreparedRun> {
        let model = self.registry.get(&config.model)?;

        let initial = if config.initial_conditions.is_empty() {
            let defaults = model.default_initial_conditions();
            match config.population {
                Some(n) => defaults.scaled(n),
                None => defaults,
            }
        } else {
            config.initial_conditions.clone()
        };
        let instance = model.instantiate(&config.parameters, &initial, config.population)?;

        let options = config.sim_options();
        options
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let resolved = ResolvedRun {
            model: instance.model(),
            parameters: instance.parameter_set(),
            initial_state: instance
                .graph()
                .compartments()
                .iter()
                .map(|c| (c.name.as_str(), c.initial_value))
                .collect(),
            population: config.population,
            t_start: config.t_start,
            t_end: config.t_end,
            solver: &config.solver,
        };
        let run_id = compute_run_id(&resolved, &self.solver_version)?;
        let graph = instance.describe();

        Ok(PreparedRun {
            config,
            instance,
            options,
            graph,
            run_id,
        })
    }

    /// Run the configured model to completion.
    pub fn run(&mut self) -> AppResult<Arc<RunOutput>> {
        self.run_with_progress(&mut |_| ControlFlow::Continue(()))
    }

    /// Run the configured model, streaming progress events.
    ///
    /// Returning `ControlFlow::Break(())` from an `Integrating` event
    /// cancels the run between steps; the session returns to `Configured`.
    pub fn run_with_progress(
        &mut self,
        progress: &mut dyn FnMut(&RunProgressEvent) -> ControlFlow<()>,
    ) -> AppResult<Arc<RunOutput>> {
        let started = Instant::now();
        let Some(prepared) = self.prepared.as_ref() else {
            return Err(AppError::NotConfigured);
        };

        emit(progress, started, RunStage::CheckingCache, "Checking run cache");
        if let Some(record) = self.store.get(&prepared.run_id) {
            emit(
                progress,
                started,
                RunStage::LoadingCachedResult,
                "Loading cached run",
            );
            debug!(run_id = %prepared.run_id, "run served from cache");
            let output = Arc::new(RunOutput {
                manifest: record.manifest.clone(),
                series: Arc::clone(&record.series),
                graph: prepared.graph.clone(),
                r0: prepared.instance.r0(),
                stats: None,
                loaded_from_cache: true,
            });
            emit(progress, started, RunStage::Completed, "Run complete");
            return Ok(self.complete(output));
        }

        self.state = SessionState::Running;
        let (series, stats) = match execute(prepared, started, progress) {
            Ok(done) => done,
            Err(err) => {
                if err.is_cancelled() {
                    info!(error = %err, "run cancelled");
                    self.state = SessionState::Configured;
                } else {
                    warn!(error = %err, "run failed");
                    self.state = SessionState::Failed(err.clone());
                }
                return Err(err);
            }
        };

        let manifest = RunManifest {
            run_id: prepared.run_id.clone(),
            model: prepared.instance.model().to_string(),
            timestamp: RunManifest::timestamp_now(),
            method: prepared.options.integrator.to_string(),
            t_start: prepared.options.t_start,
            t_end: prepared.options.t_end,
            step: prepared.config.solver.step_spec(),
            sample_count: series.len(),
            solver_version: self.solver_version.clone(),
        };
        let record = self.store.save_run(RunRecord { manifest, series });

        info!(
            run_id = %record.manifest.run_id,
            samples = record.manifest.sample_count,
            steps = stats.steps,
            elapsed_s = started.elapsed().as_secs_f64(),
            "run completed"
        );

        let output = Arc::new(RunOutput {
            manifest: record.manifest.clone(),
            series: Arc::clone(&record.series),
            graph: prepared.graph.clone(),
            r0: prepared.instance.r0(),
            stats: Some(stats),
            loaded_from_cache: false,
        });
        emit(progress, started, RunStage::Completed, "Run complete");
        Ok(self.complete(output))
    }

    fn complete(&mut self, output: Arc<RunOutput>) -> Arc<RunOutput> {
        self.last_output = Some(Arc::clone(&output));
        self.state = SessionState::Completed(Arc::clone(&output));
        output
    }
}

fn emit(
    progress: &mut dyn FnMut(&RunProgressEvent) -> ControlFlow<()>,
    started: Instant,
    stage: RunStage,
    message: &str,
) {
    // Only integration events can cancel.
    let _ = progress(&RunProgressEvent::stage(
        stage,
        started.elapsed().as_secs_f64(),
        Some(message.to_string()),
    ));
}

/// Assemble and integrate a prepared run.
fn execute(
    prepared: &PreparedRun,
    started: Instant,
    progress: &mut dyn FnMut(&RunProgressEvent) -> ControlFlow<()>,
) -> AppResult<(Arc<TimeSeries>, SimStats)> {
    emit(
        progress,
        started,
        RunStage::Assembling,
        "Assembling derivative function",
    );
    let derivative = assemble(prepared.instance.graph());
    let system = derivative.bind(prepared.instance.params())?;

    emit(progress, started, RunStage::Integrating, "Integrating");
    let record = run_sim_with_progress(
        &system,
        &prepared.instance.initial_state(),
        &prepared.options,
        |p| {
            progress(&RunProgressEvent {
                stage: RunStage::Integrating,
                elapsed_wall_s: started.elapsed().as_secs_f64(),
                message: None,
                integration: Some(IntegrationProgress::from(p)),
            })
        },
    )?;

    let series = TimeSeries::from_columns(derivative.labels().to_vec(), record.t, record.x)?;
    Ok((Arc::new(series), record.stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SimulationSession {
        SimulationSession::new(Arc::new(ModelRegistry::builtin()))
    }

    fn sir_config() -> RunConfig {
        RunConfig::new("SIR", 20.0)
            .with_parameter("beta", 0.3)
            .with_parameter("gamma", 0.1)
            .with_initial("S", 990.0)
            .with_initial("I", 10.0)
            .with_initial("R", 0.0)
    }

    #[test]
    fn starts_unconfigured() {
        let mut s = session();
        assert_eq!(s.state(), &SessionState::Unconfigured);
        assert_eq!(s.run().unwrap_err(), AppError::NotConfigured);
        assert!(s.graph_description().is_err());
    }

    #[test]
    fn configure_then_run() {
        let mut s = session();
        s.configure(sir_config()).unwrap();
        assert_eq!(s.state(), &SessionState::Configured);
        assert_eq!(s.graph_description().unwrap().compartments, ["S", "I", "R"]);

        let out = s.run().unwrap();
        assert!(matches!(s.state(), SessionState::Completed(o) if Arc::ptr_eq(o, &out)));
        assert_eq!(out.series.len(), 201);
        assert_eq!(out.manifest.method, "rk4");
        assert!((out.r0.unwrap() - 3.0).abs() < 1e-12);
        assert!(!out.loaded_from_cache);
    }

    #[test]
    fn failed_configure_keeps_previous_state() {
        let mut s = session();
        s.configure(sir_config()).unwrap();
        let run_id = s.run_id().map(str::to_string);

        let err = s.configure(RunConfig::new("SIRX", 10.0)).unwrap_err();
        assert!(matches!(err, AppError::UnknownModelKind { .. }));
        assert_eq!(s.state(), &SessionState::Configured);
        assert_eq!(s.run_id().map(str::to_string), run_id);
    }

    #[test]
    fn identical_config_is_served_from_cache() {
        let mut s = session();
        s.configure(sir_config()).unwrap();
        let first = s.run().unwrap();
        s.configure(sir_config()).unwrap();
        let second = s.run().unwrap();
        assert!(second.loaded_from_cache);
        assert!(Arc::ptr_eq(&first.series, &second.series));
        assert_eq!(s.cache().len(), 1);
    }

    #[test]
    fn rerun_with_new_parameters_keeps_prior_output() {
        let mut s = session();
        s.configure(sir_config()).unwrap();
        let first = s.run().unwrap();
        let snapshot = (*first.series).clone();

        s.configure(sir_config().with_parameter("beta", 0.5)).unwrap();
        let second = s.run().unwrap();
        assert_ne!(first.run_id(), second.run_id());
        assert_eq!(*first.series, snapshot);
        assert_ne!(first.series.final_sample(), second.series.final_sample());
    }

    #[test]
    fn numerical_failure_moves_to_failed() {
        let mut s = session();
        let solver = SolverConfig {
            method: ep_sim::IntegratorType::ForwardEuler,
            dt: 20.0,
            ..SolverConfig::default()
        };
        // One Euler step drives I well below zero.
        s.configure(
            sir_config()
                .with_parameter("gamma", 0.5)
                .with_solver(solver),
        )
        .unwrap();
        let err = s.run().unwrap_err();
        assert!(matches!(err, AppError::Simulation(ref e) if e.is_numerical()));
        assert!(matches!(s.state(), SessionState::Failed(_)));
        assert!(s.last_output().is_none());
    }

    #[test]
    fn cancellation_returns_to_configured() {
        let mut s = session();
        s.configure(sir_config()).unwrap();
        let mut stages = Vec::new();
        let err = s
            .run_with_progress(&mut |event| {
                stages.push(event.stage);
                match event.integration {
                    Some(p) if p.step >= 5 => ControlFlow::Break(()),
                    _ => ControlFlow::Continue(()),
                }
            })
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(s.state(), &SessionState::Configured);
        assert_eq!(
            &stages[..3],
            [RunStage::CheckingCache, RunStage::Assembling, RunStage::Integrating]
        );
    }

    #[test]
    fn running_state_never_outlives_a_run() {
        let mut s = session();
        let not_running = |s: &SimulationSession| s.state() != &SessionState::Running;

        s.configure(sir_config()).unwrap();
        s.run().unwrap();
        assert!(not_running(&s));
        s.run().unwrap();
        assert!(not_running(&s));

        s.configure(sir_config().with_parameter("beta", 0.4)).unwrap();
        let _ = s.run_with_progress(&mut |_| ControlFlow::Break(()));
        assert!(not_running(&s));

        let solver = SolverConfig {
            method: ep_sim::IntegratorType::ForwardEuler,
            dt: 20.0,
            ..SolverConfig::default()
        };
        s.configure(sir_config().with_parameter("gamma", 0.5).with_solver(solver))
            .unwrap();
        assert!(s.run().is_err());
        assert!(not_running(&s));
    }

    #[test]
    fn reset_clears_configuration() {
        let mut s = session();
        s.configure(sir_config()).unwrap();
        s.run().unwrap();
        s.reset();
        assert_eq!(s.state(), &SessionState::Unconfigured);
        assert!(s.last_output().is_none());
        assert_eq!(s.cache().len(), 1);
    }
}

mod output;

use clap::{Parser, Subcommand};
use ep_app::{
    AppError, AppResult, IntegratorType, ModelRegistry, RunConfig, RunOutput, RunProgressEvent,
    RunStage,
    SimulationSession, find_scenario, list_models, model_graph, run_parallel, scenarios,
    summarize,
};
use output::OutputFormat;
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ep-cli")]
#[command(about = "Epidemic lab CLI - compartmental ODE models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available models and their parameters
    Models,
    /// List preset scenarios
    Scenarios,
    /// Validate a run configuration without integrating
    Validate {
        /// Path to the run configuration (YAML or JSON)
        config_path: PathBuf,
    },
    /// Run a simulation
    Run {
        /// Path to the run configuration (YAML or JSON)
        #[arg(required_unless_present = "scenario")]
        config_path: Option<PathBuf>,
        /// Run a preset scenario instead of a configuration file
        #[arg(long, conflicts_with = "config_path")]
        scenario: Option<String>,
        /// End time for scenario runs
        #[arg(long, default_value_t = 180.0)]
        t_end: f64,
        /// Override the integration method
        #[arg(long)]
        method: Option<IntegratorType>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Rows shown by the table format
        #[arg(long, default_value_t = 20)]
        rows: usize,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the compartment graph of a model
    Graph {
        /// Model kind (SIR, SIR-D, SIR-F, SEWIR-F)
        model: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run several parameter sets of one model side by side
    Compare {
        /// Paths to run configurations
        #[arg(required = true, num_args = 2..)]
        config_paths: Vec<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let registry = Arc::new(ModelRegistry::builtin());
    tracing::debug!(models = registry.len(), "registry loaded");

    match cli.command {
        Commands::Models => cmd_models(&registry),
        Commands::Scenarios => cmd_scenarios(),
        Commands::Validate { config_path } => cmd_validate(&registry, &config_path),
        Commands::Run {
            config_path,
            scenario,
            t_end,
            method,
            format,
            rows,
            output,
        } => {
            let mut config = match (config_path, scenario) {
                (Some(path), _) => RunConfig::load(&path)?,
                (None, Some(id)) => scenario_config(&id, t_end)?,
                (None, None) => {
                    return Err(AppError::InvalidInput(
                        "a configuration path or --scenario is required".to_string(),
                    ));
                }
            };
            if let Some(method) = method {
                config.solver.method = method;
            }
            cmd_run(&registry, config, format, rows, output.as_deref())
        }
        Commands::Graph { model, json } => cmd_graph(&registry, &model, json),
        Commands::Compare { config_paths } => cmd_compare(&registry, &config_paths),
    }
}

fn scenario_config(id: &str, t_end: f64) -> AppResult<RunConfig> {
    let scenario = find_scenario(id).ok_or_else(|| {
        let known: Vec<&str> = scenarios().iter().map(|s| s.id).collect();
        AppError::InvalidInput(format!(
            "Unknown scenario '{}' (known: {})",
            id,
            known.join(", ")
        ))
    })?;
    Ok(RunConfig::from_scenario(&scenario, t_end))
}

fn cmd_models(registry: &ModelRegistry) -> AppResult<()> {
    for model in list_models(registry) {
        println!("{} - {}", model.name, model.description);
        println!("  Compartments: {}", model.compartments.join(", "));
        for p in &model.parameters {
            println!("  {:<8} = {:<8} {}", p.name, p.default, p.description);
        }
        if let Some(r0) = model.default_r0 {
            println!("  R0 (defaults): {:.3}", r0);
        }
        println!();
    }
    Ok(())
}

fn cmd_scenarios() -> AppResult<()> {
    println!("Preset scenarios:");
    for s in scenarios() {
        println!("  {:<14} {} [{}]", s.id, s.name, s.model);
        println!("  {:<14} {}", "", s.description);
    }
    Ok(())
}

fn cmd_validate(registry: &Arc<ModelRegistry>, config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = RunConfig::load(config_path)?;
    let mut session = SimulationSession::new(Arc::clone(registry));
    session.configure(config)?;

    let graph = session.graph_description()?;
    println!("✓ Configuration is valid");
    println!(
        "  {} compartments, {} flows",
        graph.compartments.len(),
        graph.edges.len()
    );
    if let Some(r0) = session.instance().and_then(|i| i.r0()) {
        println!("  R0: {:.3}", r0);
    }
    Ok(())
}

fn cmd_run(
    registry: &Arc<ModelRegistry>,
    config: RunConfig,
    format: OutputFormat,
    rows: usize,
    output: Option<&Path>,
) -> AppResult<()> {
    // Progress goes to stderr so stdout carries only the exported payload.
    let run = execute_run(registry, config, &mut io::stderr().lock())?;
    let rendered = render_run(&run, format, rows)?;

    if let Some(path) = output {
        std::fs::write(path, rendered)?;
        println!(
            "✓ Exported {} samples to {}",
            run.series.len(),
            path.display()
        );
    } else {
        print!("{}", rendered);
    }
    Ok(())
}

fn execute_run(
    registry: &Arc<ModelRegistry>,
    config: RunConfig,
    progress_out: &mut dyn Write,
) -> AppResult<Arc<RunOutput>> {
    let mut session = SimulationSession::new(Arc::clone(registry));
    session.configure(config)?;

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let result = session.run_with_progress(&mut |event| {
        let fraction = event
            .integration
            .as_ref()
            .map(|p| p.fraction_complete)
            .unwrap_or(-1.0);
        let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.01)
            || last_emit.elapsed().as_millis() >= 100;
        if emit_now {
            render_cli_progress(progress_out, event);
            if fraction >= 0.0 {
                last_fraction = fraction;
            }
            last_emit = Instant::now();
        }
        ControlFlow::Continue(())
    });
    clear_progress_line(progress_out);
    result
}

fn render_run(run: &RunOutput, format: OutputFormat, rows: usize) -> AppResult<String> {
    let summary = summarize(run);
    Ok(match format {
        OutputFormat::Table => {
            let mut text = format!("✓ Simulation completed: {}\n", run.run_id());
            text.push_str(&output::render_summary(&summary));
            if let Some(stats) = run.stats {
                text.push_str(&format!(
                    "  Steps:       {} ({} rejected, {} rhs calls)\n",
                    stats.steps, stats.rejected_steps, stats.rhs_calls
                ));
            }
            text.push('\n');
            text.push_str(&output::render_table(&run.series, rows));
            text
        }
        OutputFormat::Csv => output::render_csv(&run.series),
        OutputFormat::Json => {
            output::render_json(run, &summary).map_err(|e| AppError::Results(e.to_string()))?
        }
    })
}

fn cmd_graph(registry: &ModelRegistry, model: &str, json: bool) -> AppResult<()> {
    let graph = model_graph(registry, model)?;
    if json {
        let text =
            serde_json::to_string_pretty(&graph).map_err(|e| AppError::Results(e.to_string()))?;
        println!("{}", text);
    } else {
        print!("{}", output::render_graph(&graph));
    }
    Ok(())
}

fn cmd_compare(registry: &Arc<ModelRegistry>, config_paths: &[PathBuf]) -> AppResult<()> {
    let configs = config_paths
        .iter()
        .map(|p| RunConfig::load(p))
        .collect::<AppResult<Vec<_>>>()?;

    let model = registry.get(&configs[0].model)?;
    for config in &configs[1..] {
        if registry.get(&config.model)?.name() != model.name() {
            return Err(AppError::InvalidInput(format!(
                "compare runs parameter sets of one model; got {} and {}",
                model.name(),
                config.model
            )));
        }
    }

    println!(
        "{:<28} {:>8} {:>12} {:>10} {:>12} {:>10}",
        "config", "R0", "peak I", "peak t", "final size", "attack %"
    );
    for (path, result) in config_paths.iter().zip(run_parallel(registry, configs)) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match result {
            Ok(run) => {
                let m = summarize(&run).metrics;
                let fmt = |v: Option<f64>, scale: f64| {
                    v.map(|v| format!("{:.2}", v * scale))
                        .unwrap_or_else(|| "-".to_string())
                };
                println!(
                    "{:<28} {:>8} {:>12} {:>10} {:>12} {:>10}",
                    name,
                    fmt(run.r0, 1.0),
                    fmt(m.peak_infectious.map(|p| p.value), 1.0),
                    fmt(m.peak_infectious.map(|p| p.time), 1.0),
                    fmt(m.final_size, 1.0),
                    fmt(m.attack_rate, 100.0),
                );
            }
            Err(err) => println!("{:<28} failed: {}", name, err),
        }
    }
    Ok(())
}

fn clear_progress_line(out: &mut dyn Write) {
    let _ = write!(out, "\r{}\r", " ".repeat(120));
    let _ = out.flush();
}

fn render_cli_progress(out: &mut dyn Write, event: &RunProgressEvent) {
    match (event.stage, &event.integration) {
        (RunStage::Integrating, Some(p)) => {
            let width = 28usize;
            let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            let _ = write!(
                out,
                "\r[{}] {:>6.2}%  t={:.2}/{:.2}  step={}  elapsed={:.1}s",
                bar,
                p.fraction_complete * 100.0,
                p.sim_time,
                p.t_end,
                p.step,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {:?}  elapsed={:.2}s",
                spinner[spin_idx], event.stage, event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            let _ = write!(out, "{}", line);
        }
    }
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sir_run(progress: &mut Vec<u8>) -> Arc<RunOutput> {
        let registry = Arc::new(ModelRegistry::builtin());
        execute_run(&registry, RunConfig::new("SIR", 20.0), progress).unwrap()
    }

    #[test]
    fn csv_export_excludes_progress_output() {
        let mut progress = Vec::new();
        let run = sir_run(&mut progress);
        let csv = render_run(&run, OutputFormat::Csv, 20).unwrap();
        assert!(csv.starts_with("time,S,I,R\n"), "{csv:.40}");
        assert!(!csv.contains('\r'));
        // The clear-line sequence always lands on the progress writer.
        assert!(progress.contains(&b'\r'));
    }

    #[test]
    fn json_export_parses_cleanly() {
        let mut progress = Vec::new();
        let run = sir_run(&mut progress);
        let json = render_run(&run, OutputFormat::Json, 20).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("manifest").is_some());
        assert_eq!(value["series"]["compartments"][0], "S");
    }
}

//! Rendering of run results for the terminal and for export.

use ep_app::{GraphDescription, RunOutput, RunSummary};
use ep_results::{RunManifest, TimeSeries};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Full time series as CSV: `time,<compartment>...`.
pub fn render_csv(series: &TimeSeries) -> String {
    let mut csv = String::from("time");
    for name in series.compartments() {
        csv.push(',');
        csv.push_str(name);
    }
    csv.push('\n');
    for sample in series.samples() {
        csv.push_str(&sample.time.to_string());
        for v in &sample.values {
            csv.push(',');
            csv.push_str(&v.to_string());
        }
        csv.push('\n');
    }
    csv
}

/// About `rows` evenly spaced samples as an aligned table; the last sample
/// is always included.
pub fn render_table(series: &TimeSeries, rows: usize) -> String {
    let samples = series.samples();
    if samples.is_empty() {
        return String::new();
    }
    let stride = (samples.len() / rows.max(1)).max(1);

    let mut out = format!("{:>10}", "t");
    for name in series.compartments() {
        out.push_str(&format!(" {:>14}", name));
    }
    out.push('\n');

    let last = samples.len() - 1;
    for (i, sample) in samples.iter().enumerate() {
        if i % stride != 0 && i != last {
            continue;
        }
        out.push_str(&format!("{:>10.3}", sample.time));
        for v in &sample.values {
            out.push_str(&format!(" {:>14.4}", v));
        }
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct JsonRun<'a> {
    manifest: &'a RunManifest,
    summary: &'a RunSummary,
    graph: &'a GraphDescription,
    series: &'a TimeSeries,
}

pub fn render_json(output: &RunOutput, summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonRun {
        manifest: &output.manifest,
        summary,
        graph: &output.graph,
        series: &output.series,
    })
}

pub fn render_graph(graph: &GraphDescription) -> String {
    let mut out = format!("Compartments: {}\n", graph.compartments.join(", "));
    out.push_str("Flows:\n");
    for (source, target, label) in graph.edge_tuples() {
        out.push_str(&format!("  {} -> {}  [{}]\n", source, target, label));
    }
    out
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Model:       {}\n", summary.model));
    out.push_str(&format!("  Method:      {}\n", summary.method));
    out.push_str(&format!(
        "  Time range:  {:.3} - {:.3}\n",
        summary.time_range.0, summary.time_range.1
    ));
    out.push_str(&format!("  Samples:     {}\n", summary.sample_count));
    if let Some(r0) = summary.r0 {
        out.push_str(&format!("  R0:          {:.3}\n", r0));
    }
    let m = &summary.metrics;
    if let Some(peak) = m.peak_infectious {
        out.push_str(&format!(
            "  Peak I:      {:.2} at t={:.2}\n",
            peak.value, peak.time
        ));
    }
    if let Some(size) = m.final_size {
        out.push_str(&format!("  Final size:  {:.2}", size));
        if let Some(rate) = m.attack_rate {
            out.push_str(&format!(" ({:.1}%)", rate * 100.0));
        }
        out.push('\n');
    }
    if let Some(rt) = m.final_rt {
        out.push_str(&format!("  Final Rt:    {:.3}\n", rt));
    }
    out.push_str(&format!("  Drift:       {:.3e}\n", m.conservation_drift));
    out
}

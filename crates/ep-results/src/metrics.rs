//! Epidemic summary metrics.
//!
//! Computes peak prevalence, final epidemic size, conservation drift and the
//! effective reproduction number from a finished time series.

use serde::{Deserialize, Serialize};

use crate::types::TimeSeries;
use crate::{ResultsError, ResultsResult};

/// Time and value of a compartment's maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub time: f64,
    pub value: f64,
}

/// Standard epidemic metrics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EpidemicMetrics {
    /// Maximum of the infectious compartment
    pub peak_infectious: Option<Peak>,
    /// Susceptibles lost over the run, `S(t0) - S(t_end)`
    pub final_size: Option<f64>,
    /// `final_size` as a fraction of the initial population
    pub attack_rate: Option<f64>,
    /// Maximum relative deviation of the population total from its initial value
    pub conservation_drift: f64,
    /// Effective reproduction number at the last sample
    pub final_rt: Option<f64>,
    /// Final value of every compartment, in state order
    pub final_values: Vec<(String, f64)>,
}

impl EpidemicMetrics {
    /// Returns true if the epidemic-specific metrics could be computed
    pub fn has_data(&self) -> bool {
        self.peak_infectious.is_some() || self.final_size.is_some()
    }
}

/// Maximum of the named compartment; the earliest sample wins ties.
pub fn peak(series: &TimeSeries, name: &str) -> ResultsResult<Peak> {
    series
        .pairs(name)?
        .into_iter()
        .fold(None, |best: Option<Peak>, (time, value)| match best {
            Some(p) if p.value >= value => Some(p),
            _ => Some(Peak { time, value }),
        })
        .ok_or(ResultsError::EmptySeries)
}

/// Maximum of `|total(t) - total(t0)| / |total(t0)|` over the run.
pub fn conservation_drift(series: &TimeSeries) -> f64 {
    let totals = series.totals();
    let Some(&initial) = totals.first() else {
        return 0.0;
    };
    let scale = initial.abs().max(f64::MIN_POSITIVE);
    totals
        .iter()
        .map(|t| (t - initial).abs() / scale)
        .fold(0.0, f64::max)
}

/// `Rt = R0 * S(t) / N(t)` at every sample, with `N` the total of all compartments.
pub fn effective_reproduction(
    series: &TimeSeries,
    r0: f64,
    susceptible: &str,
) -> ResultsResult<Vec<f64>> {
    let s = series.series(susceptible)?;
    Ok(s.iter()
        .zip(series.totals())
        .map(|(s, n)| if n > 0.0 { r0 * s / n } else { 0.0 })
        .collect())
}

/// Compute all metrics; entries that need a missing compartment stay `None`.
pub fn compute_metrics(
    series: &TimeSeries,
    r0: Option<f64>,
    susceptible: &str,
    infectious: &str,
) -> EpidemicMetrics {
    let mut metrics = EpidemicMetrics {
        conservation_drift: conservation_drift(series),
        ..EpidemicMetrics::default()
    };

    if let Some(last) = series.final_sample() {
        metrics.final_values = series
            .compartments()
            .iter()
            .cloned()
            .zip(last.values.iter().copied())
            .collect();
    }

    metrics.peak_infectious = peak(series, infectious).ok();

    if let Ok(s) = series.series(susceptible)
        && let (Some(s0), Some(s_end)) = (s.first(), s.last())
    {
        let lost = s0 - s_end;
        metrics.final_size = Some(lost);
        let n0 = series.totals().first().copied().unwrap_or(0.0);
        if n0 > 0.0 {
            metrics.attack_rate = Some(lost / n0);
        }
    }

    if let Some(r0) = r0 {
        metrics.final_rt = effective_reproduction(series, r0, susceptible)
            .ok()
            .and_then(|rt| rt.last().copied());
    }

    metrics
}

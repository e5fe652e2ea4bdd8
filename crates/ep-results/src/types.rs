//! Result data types.

use serde::{Deserialize, Serialize};

use crate::{ResultsError, ResultsResult};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub model: String,
    pub timestamp: String,
    pub method: String,
    pub t_start: f64,
    pub t_end: f64,
    pub step: StepSpec,
    pub sample_count: usize,
    pub solver_version: String,
}

impl RunManifest {
    /// RFC 3339 UTC timestamp for a manifest created now.
    pub fn timestamp_now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

/// Step control used for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepSpec {
    Fixed { dt: f64 },
    Adaptive { rtol: f64, atol: f64 },
}

/// One row of a time series: a time and every compartment value in state order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub values: Vec<f64>,
}

/// Ordered samples of named compartment values.
///
/// Construction checks that every sample has one value per compartment and
/// that times strictly increase; the series is never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    compartments: Vec<String>,
    samples: Vec<Sample>,
}

/// Unchecked wire form; deserialization goes through [`TimeSeries::new`].
#[derive(Deserialize)]
struct RawTimeSeries {
    compartments: Vec<String>,
    samples: Vec<Sample>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = ResultsError;

    fn try_from(raw: RawTimeSeries) -> ResultsResult<Self> {
        Self::new(raw.compartments, raw.samples)
    }
}

impl TimeSeries {
    pub fn new(compartments: Vec<String>, samples: Vec<Sample>) -> ResultsResult<Self> {
        for (index, sample) in samples.iter().enumerate() {
            if sample.values.len() != compartments.len() {
                return Err(ResultsError::SampleWidth {
                    index,
                    expected: compartments.len(),
                    actual: sample.values.len(),
                });
            }
            if index > 0 && sample.time <= samples[index - 1].time {
                return Err(ResultsError::NonMonotonicTime {
                    index,
                    time: sample.time,
                });
            }
        }
        Ok(Self {
            compartments,
            samples,
        })
    }

    /// Build from parallel time and state vectors.
    pub fn from_columns(
        compartments: Vec<String>,
        times: Vec<f64>,
        states: Vec<Vec<f64>>,
    ) -> ResultsResult<Self> {
        if times.len() != states.len() {
            return Err(ResultsError::SampleWidth {
                index: times.len().min(states.len()),
                expected: times.len(),
                actual: states.len(),
            });
        }
        let samples = times
            .into_iter()
            .zip(states)
            .map(|(time, values)| Sample { time, values })
            .collect();
        Self::new(compartments, samples)
    }

    pub fn compartments(&self) -> &[String] {
        &self.compartments
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.compartments.iter().position(|c| c == name)
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Values of compartment `i` over time.
    pub fn column(&self, i: usize) -> Option<Vec<f64>> {
        (i < self.compartments.len()).then(|| self.samples.iter().map(|s| s.values[i]).collect())
    }

    /// Values of the named compartment over time.
    pub fn series(&self, name: &str) -> ResultsResult<Vec<f64>> {
        self.index_of(name)
            .and_then(|i| self.column(i))
            .ok_or_else(|| ResultsError::UnknownCompartment {
                name: name.to_string(),
            })
    }

    /// `(time, value)` pairs for the named compartment.
    pub fn pairs(&self, name: &str) -> ResultsResult<Vec<(f64, f64)>> {
        let values = self.series(name)?;
        Ok(self.samples.iter().map(|s| s.time).zip(values).collect())
    }

    /// Sum of all compartments at every sample.
    pub fn totals(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.values.iter().sum()).collect()
    }

    pub fn first_sample(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn final_sample(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Value of `name` at `time`, linearly interpolated between samples.
    pub fn value_at(&self, name: &str, time: f64) -> ResultsResult<f64> {
        let i = self
            .index_of(name)
            .ok_or_else(|| ResultsError::UnknownCompartment {
                name: name.to_string(),
            })?;
        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(ResultsError::EmptySeries),
        };
        if !(first.time..=last.time).contains(&time) {
            return Err(ResultsError::TimeOutOfRange {
                time,
                start: first.time,
                end: last.time,
            });
        }

        let upper = self.samples.partition_point(|s| s.time < time);
        let hi = &self.samples[upper];
        if hi.time == time || upper == 0 {
            return Ok(hi.values[i]);
        }
        let lo = &self.samples[upper - 1];
        let w = (time - lo.time) / (hi.time - lo.time);
        Ok(lo.values[i] + w * (hi.values[i] - lo.values[i]))
    }
}

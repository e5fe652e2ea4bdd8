//! Named parameter values and initial conditions.

use std::collections::BTreeMap;

use ep_core::Real;
use serde::{Deserialize, Serialize};

/// Static description of one model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub default: Real,
}

/// Parameter name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, Real>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: Real) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Real) -> Option<Real> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<Real> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, Real> {
        &self.0
    }
}

impl<K: Into<String>> FromIterator<(K, Real)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, Real)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Compartment name → initial value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitialConditions(BTreeMap<String, Real>);

impl InitialConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Real) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Real) -> Option<Real> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<Real> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all supplied values.
    pub fn total(&self) -> Real {
        self.0.values().sum()
    }

    /// Multiply every value by `factor` (e.g. fractions → head counts).
    pub fn scaled(&self, factor: Real) -> Self {
        Self(self.0.iter().map(|(k, v)| (k.clone(), v * factor)).collect())
    }

    pub fn as_map(&self) -> &BTreeMap<String, Real> {
        &self.0
    }
}

impl<K: Into<String>> FromIterator<(K, Real)> for InitialConditions {
    fn from_iter<I: IntoIterator<Item = (K, Real)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

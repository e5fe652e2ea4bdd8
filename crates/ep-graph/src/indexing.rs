//! Stable state-vector layout.
//!
//! The layout is the contract between the assembler and the integrator:
//! compartment `i` of the graph is entry `i` of every state vector.

use std::collections::{BTreeMap, HashMap};

use ep_core::Real;

use crate::error::{GraphError, GraphResult};
use crate::graph::CompartmentGraph;

/// Bidirectional mapping between compartment names and state indices.
#[derive(Debug, Clone, PartialEq)]
pub struct StateLayout {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl StateLayout {
    /// Build the layout from a graph (declaration order).
    pub fn from_graph(graph: &CompartmentGraph) -> Self {
        Self::from_names(graph.compartments().iter().map(|c| c.name.clone()))
    }

    /// Build a layout from an ordered list of names.
    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> Self {
        let names: Vec<String> = names.into_iter().collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ordered compartment names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    /// State index of a compartment.
    pub fn index_of(&self, name: &str) -> GraphResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::IdNotFound {
                what: format!("compartment '{name}'"),
            })
    }

    /// Pair each value of a state vector with its compartment name.
    pub fn label<'a>(&'a self, state: &'a [Real]) -> impl Iterator<Item = (&'a str, Real)> + 'a {
        self.names
            .iter()
            .map(String::as_str)
            .zip(state.iter().copied())
    }

    /// Build a state vector from named values; missing compartments get `fill`.
    pub fn vector_from(&self, values: &BTreeMap<String, Real>, fill: Real) -> GraphResult<Vec<Real>> {
        let mut state = vec![fill; self.names.len()];
        for (name, value) in values {
            state[self.index_of(name)?] = *value;
        }
        Ok(state)
    }
}

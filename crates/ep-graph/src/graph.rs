//! Core graph data structures.

use ep_core::{CompartmentId, FlowId, ParamId, Real};

use crate::description::GraphDescription;
use crate::indexing::StateLayout;
use crate::rate::RateExpr;

/// A named state variable of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Compartment {
    pub id: CompartmentId,
    pub name: String,
    /// Value at the start of a run.
    pub initial_value: Real,
}

/// A named scalar used inside flow-rate expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub id: ParamId,
    pub name: String,
}

/// A directed edge moving population from `source` to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub id: FlowId,
    pub source: CompartmentId,
    pub target: CompartmentId,
    pub rate: RateExpr,
    /// Display label (the rate parameter name).
    pub label: String,
}

/// Compartments whose values must sum to a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservedTotal {
    pub members: Vec<CompartmentId>,
    pub total: Real,
}

/// The graph: a validated, immutable collection of compartments, parameters and flows.
///
/// Compartment order is the state-vector order and stays fixed for the
/// lifetime of the graph. Per-compartment incident flows are kept in a
/// compact offset array for the assembler.
#[derive(Debug, Clone)]
pub struct CompartmentGraph {
    pub(crate) compartments: Vec<Compartment>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) flows: Vec<Flow>,
    pub(crate) conserved: Option<ConservedTotal>,

    /// Compartment i's flows are in comp_flows[comp_flow_offsets[i]..comp_flow_offsets[i+1]].
    pub(crate) comp_flow_offsets: Vec<usize>,

    /// Flat list of flow IDs incident to compartments (sorted by flow ID within each compartment).
    pub(crate) comp_flows: Vec<FlowId>,
}

impl CompartmentGraph {
    /// Return all compartments in state-vector order.
    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    /// Return all parameters in binding order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Return all flows.
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Conserved group, if one was declared.
    pub fn conserved(&self) -> Option<&ConservedTotal> {
        self.conserved.as_ref()
    }

    /// Number of state variables.
    pub fn dimension(&self) -> usize {
        self.compartments.len()
    }

    pub fn compartment(&self, id: CompartmentId) -> Option<&Compartment> {
        self.compartments.get(id.slot())
    }

    pub fn parameter(&self, id: ParamId) -> Option<&Parameter> {
        self.parameters.get(id.slot())
    }

    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(id.slot())
    }

    /// Look up a compartment by name.
    pub fn compartment_id(&self, name: &str) -> Option<CompartmentId> {
        self.compartments
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
    }

    /// Look up a parameter by name.
    pub fn parameter_id(&self, name: &str) -> Option<ParamId> {
        self.parameters.iter().find(|p| p.name == name).map(|p| p.id)
    }

    /// All flow IDs touching a compartment (as source or target).
    pub fn incident_flows(&self, id: CompartmentId) -> &[FlowId] {
        let idx = id.slot();
        if idx >= self.compartments.len() {
            return &[];
        }
        let start = self.comp_flow_offsets[idx];
        let end = self.comp_flow_offsets[idx + 1];
        &self.comp_flows[start..end]
    }

    /// Flows entering a compartment.
    pub fn inflows(&self, id: CompartmentId) -> impl Iterator<Item = &Flow> + '_ {
        self.incident_flows(id)
            .iter()
            .filter_map(move |f| self.flow(*f))
            .filter(move |f| f.target == id)
    }

    /// Flows leaving a compartment.
    pub fn outflows(&self, id: CompartmentId) -> impl Iterator<Item = &Flow> + '_ {
        self.incident_flows(id)
            .iter()
            .filter_map(move |f| self.flow(*f))
            .filter(move |f| f.source == id)
    }

    /// Initial values in state-vector order.
    pub fn initial_state(&self) -> Vec<Real> {
        self.compartments.iter().map(|c| c.initial_value).collect()
    }

    /// Name ↔ index mapping for the state vector.
    pub fn layout(&self) -> StateLayout {
        StateLayout::from_graph(self)
    }

    /// Nodes/edges projection for presentation.
    pub fn describe(&self) -> GraphDescription {
        GraphDescription::from_graph(self)
    }
}

//! Incremental graph builder.

use std::collections::HashMap;

use ep_core::{CompartmentId, FlowId, ParamId, Real};

use crate::error::GraphResult;
use crate::graph::{Compartment, CompartmentGraph, Flow, Parameter};
use crate::rate::Rate;
use crate::validate;

/// How `validate` treats compartments that no flow touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Reject with `GraphError::OrphanCompartment`.
    #[default]
    Deny,
    /// Log a warning and accept the compartment as an intentional constant.
    Warn,
}

/// A flow as declared, before names are resolved.
#[derive(Debug, Clone)]
pub(crate) struct FlowDecl {
    pub(crate) source: String,
    pub(crate) target: String,
    pub(crate) rate: Rate,
}

impl FlowDecl {
    pub(crate) fn describe(&self) -> String {
        format!("{} -> {}", self.source, self.target)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConservedDecl {
    pub(crate) members: Vec<String>,
    pub(crate) total: Real,
}

/// Builder for constructing a compartment graph incrementally.
///
/// Declarations are recorded as given; duplicate or dangling names are only
/// reported by `validate()` (which `build()` always runs), so a model
/// definition sees every structural problem at one point.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    compartments: Vec<Compartment>,
    parameters: Vec<Parameter>,
    flows: Vec<FlowDecl>,
    conserved: Option<ConservedDecl>,
    orphan_policy: OrphanPolicy,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the orphan policy used by `validate` and `build`.
    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    /// Declare a compartment and return its ID (its index in the state vector).
    pub fn declare_compartment(
        &mut self,
        name: impl Into<String>,
        initial_value: Real,
    ) -> CompartmentId {
        let id = CompartmentId::from_index(self.compartments.len() as u32);
        self.compartments.push(Compartment {
            id,
            name: name.into(),
            initial_value,
        });
        id
    }

    /// Declare a rate parameter and return its ID (its index in the binding).
    pub fn declare_parameter(&mut self, name: impl Into<String>) -> ParamId {
        let id = ParamId::from_index(self.parameters.len() as u32);
        self.parameters.push(Parameter {
            id,
            name: name.into(),
        });
        id
    }

    /// Declare a directed flow between two compartments, by name.
    pub fn declare_flow(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        rate: Rate,
    ) -> FlowId {
        let id = FlowId::from_index(self.flows.len() as u32);
        self.flows.push(FlowDecl {
            source: source.into(),
            target: target.into(),
            rate,
        });
        id
    }

    /// Declare that the listed compartments must sum to `total`.
    pub fn conserve_total<I, S>(&mut self, members: I, total: Real)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conserved = Some(ConservedDecl {
            members: members.into_iter().map(Into::into).collect(),
            total,
        });
    }

    /// Overwrite the initial value of an already declared compartment.
    pub fn set_initial_value(&mut self, id: CompartmentId, value: Real) {
        if let Some(comp) = self.compartments.get_mut(id.slot()) {
            comp.initial_value = value;
        }
    }

    /// Names declared so far, in declaration order.
    pub fn compartment_names(&self) -> impl Iterator<Item = &str> {
        self.compartments.iter().map(|c| c.name.as_str())
    }

    /// Check the declarations without consuming the builder.
    pub fn validate(&self) -> GraphResult<()> {
        validate::resolve(
            &self.compartments,
            &self.parameters,
            &self.flows,
            self.conserved.as_ref(),
            self.orphan_policy,
        )
        .map(|_| ())
    }

    /// Validate and freeze into an immutable `CompartmentGraph`.
    pub fn build(self) -> GraphResult<CompartmentGraph> {
        let resolved = validate::resolve(
            &self.compartments,
            &self.parameters,
            &self.flows,
            self.conserved.as_ref(),
            self.orphan_policy,
        )?;

        let (comp_flow_offsets, comp_flows) =
            Self::build_incidence(&self.compartments, &resolved.flows);

        Ok(CompartmentGraph {
            compartments: self.compartments,
            parameters: self.parameters,
            flows: resolved.flows,
            conserved: resolved.conserved,
            comp_flow_offsets,
            comp_flows,
        })
    }

    /// Build compact incidence lists: for each compartment, collect the flows touching it.
    fn build_incidence(compartments: &[Compartment], flows: &[Flow]) -> (Vec<usize>, Vec<FlowId>) {
        let mut comp_to_flows: HashMap<CompartmentId, Vec<FlowId>> = HashMap::new();
        for flow in flows {
            comp_to_flows.entry(flow.source).or_default().push(flow.id);
            comp_to_flows.entry(flow.target).or_default().push(flow.id);
        }

        for list in comp_to_flows.values_mut() {
            list.sort_by_key(|f| f.index());
        }

        let mut offsets = Vec::with_capacity(compartments.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);

        for comp in compartments {
            if let Some(list) = comp_to_flows.get(&comp.id) {
                flat.extend_from_slice(list);
            }
            offsets.push(flat.len());
        }

        (offsets, flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;

    fn sir_builder() -> GraphBuilder {
        let mut b = GraphBuilder::new();
        b.declare_compartment("S", 990.0);
        b.declare_compartment("I", 10.0);
        b.declare_compartment("R", 0.0);
        b.declare_parameter("beta");
        b.declare_parameter("gamma");
        b.declare_flow("S", "I", Rate::mass_action("beta", "I"));
        b.declare_flow("I", "R", Rate::linear("gamma"));
        b
    }

    #[test]
    fn builder_assigns_sequential_ids() {
        let mut b = GraphBuilder::new();
        let s = b.declare_compartment("S", 1.0);
        let i = b.declare_compartment("I", 0.0);
        let beta = b.declare_parameter("beta");
        let f = b.declare_flow("S", "I", Rate::linear("beta"));
        assert_eq!(s.index(), 0);
        assert_eq!(i.index(), 1);
        assert_eq!(beta.index(), 0);
        assert_eq!(f.index(), 0);
        assert_eq!(b.compartment_names().collect::<Vec<_>>(), ["S", "I"]);
    }

    #[test]
    fn builder_build_simple() {
        let graph = sir_builder().build().unwrap();
        assert_eq!(graph.dimension(), 3);
        assert_eq!(graph.parameters().len(), 2);

        let s = graph.compartment_id("S").unwrap();
        let r = graph.compartment_id("R").unwrap();
        assert_eq!(graph.incident_flows(s).len(), 1);
        assert_eq!(graph.incident_flows(r).len(), 1);
    }

    #[test]
    fn validate_does_not_consume() {
        let b = sir_builder();
        assert!(b.validate().is_ok());
        assert!(b.build().is_ok());
    }

    #[test]
    fn set_initial_value_overwrites() {
        let mut b = sir_builder();
        b.set_initial_value(CompartmentId::from_index(2), 5.0);
        let g = b.build().unwrap();
        assert_eq!(g.initial_state()[2], 5.0);
    }

    #[test]
    fn orphan_policy_warn_accepts_isolated_compartment() {
        let mut b = sir_builder();
        b.declare_compartment("V", 0.0);
        assert!(matches!(
            b.validate(),
            Err(GraphError::OrphanCompartment { ref name }) if name == "V"
        ));

        let b = b.with_orphan_policy(OrphanPolicy::Warn);
        let g = b.build().unwrap();
        assert_eq!(g.dimension(), 4);
        assert!(g.incident_flows(g.compartment_id("V").unwrap()).is_empty());
    }
}

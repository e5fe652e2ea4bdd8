//! Display-agnostic projection of a compartment graph.
//!
//! Presentation layers recompute this on every redraw; nothing here is
//! tracked as state by the core.

use serde::{Deserialize, Serialize};

use crate::graph::CompartmentGraph;

/// One flow edge for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDescription {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// Nodes (compartment names, state order) and edges (flows, declaration order).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    pub compartments: Vec<String>,
    pub edges: Vec<EdgeDescription>,
}

impl GraphDescription {
    pub fn from_graph(graph: &CompartmentGraph) -> Self {
        let name_of = |id: ep_core::CompartmentId| {
            graph
                .compartment(id)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };

        Self {
            compartments: graph.compartments().iter().map(|c| c.name.clone()).collect(),
            edges: graph
                .flows()
                .iter()
                .map(|f| EdgeDescription {
                    source: name_of(f.source),
                    target: name_of(f.target),
                    label: f.label.clone(),
                })
                .collect(),
        }
    }

    /// Edges as `(source, target, label)` tuples.
    pub fn edge_tuples(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.label.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::GraphBuilder;
    use crate::rate::Rate;

    #[test]
    fn description_lists_nodes_and_edges() {
        let mut b = GraphBuilder::new();
        b.declare_compartment("S", 1.0);
        b.declare_compartment("I", 0.0);
        b.declare_compartment("R", 0.0);
        b.declare_parameter("beta");
        b.declare_parameter("gamma");
        b.declare_flow("S", "I", Rate::mass_action("beta", "I"));
        b.declare_flow("I", "R", Rate::linear("gamma"));
        let desc = b.build().unwrap().describe();

        assert_eq!(desc.compartments, ["S", "I", "R"]);
        let edges: Vec<_> = desc.edge_tuples().collect();
        assert_eq!(edges, vec![("S", "I", "beta"), ("I", "R", "gamma")]);

        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["edges"][1]["label"], "gamma");
    }
}

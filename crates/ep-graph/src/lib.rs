//! ep-graph: compartment graph layer for the epidemic lab.
//!
//! Provides:
//! - Core graph data structures (Compartment, Parameter, Flow, CompartmentGraph)
//! - Closed set of flow-rate expressions (mass-action, linear, constant)
//! - Incremental graph builder with validation
//! - Stable state-vector layout for the assembler
//! - Display-agnostic graph description for presentation layers
//!
//! # Example
//!
//! ```
//! use ep_graph::{GraphBuilder, Rate};
//!
//! let mut builder = GraphBuilder::new();
//! builder.declare_compartment("S", 990.0);
//! builder.declare_compartment("I", 10.0);
//! builder.declare_compartment("R", 0.0);
//! builder.declare_parameter("beta");
//! builder.declare_parameter("gamma");
//! builder.declare_flow("S", "I", Rate::mass_action("beta", "I"));
//! builder.declare_flow("I", "R", Rate::linear("gamma"));
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.compartments().len(), 3);
//! assert_eq!(graph.flows().len(), 2);
//! ```

pub mod builder;
pub mod description;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod rate;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{GraphBuilder, OrphanPolicy};
pub use description::{EdgeDescription, GraphDescription};
pub use error::{GraphError, GraphResult};
pub use graph::{Compartment, CompartmentGraph, ConservedTotal, Flow, Parameter};
pub use indexing::StateLayout;
pub use rate::{Rate, RateExpr};

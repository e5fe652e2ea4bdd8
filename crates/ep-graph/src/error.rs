//! Graph-specific error types.

use thiserror::Error;

/// Graph construction and validation errors.
///
/// Every variant names the offending compartment, parameter or flow so the
/// model definition can be fixed without guesswork.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Graph declares no compartments")]
    EmptyGraph,

    #[error("Compartment '{name}' is declared more than once")]
    DuplicateCompartment { name: String },

    #[error("Parameter '{name}' is declared more than once")]
    DuplicateParameter { name: String },

    #[error("Compartment '{name}' has non-finite initial value {value}")]
    NonFiniteInitialValue { name: String, value: f64 },

    #[error("Flow {flow} references undeclared compartment '{name}'")]
    UndeclaredCompartment { name: String, flow: String },

    #[error("Flow {flow} references undeclared parameter '{name}'")]
    UndeclaredParameter { name: String, flow: String },

    #[error("Flow on compartment '{name}' is a self-loop")]
    SelfLoop { name: String },

    #[error("Parameter '{name}' is not used by any flow")]
    UnusedParameter { name: String },

    #[error("Compartment '{name}' participates in no flow")]
    OrphanCompartment { name: String },

    #[error("Conserved group lists compartment '{name}' more than once")]
    DuplicateConservedMember { name: String },

    #[error("Conserved total must be finite and non-negative, got {total}")]
    InvalidConservedTotal { total: f64 },

    #[error("{what} not found in graph")]
    IdNotFound { what: String },
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_context() {
        let err = GraphError::UndeclaredCompartment {
            name: "X".into(),
            flow: "S -> X".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'X'"));
        assert!(msg.contains("S -> X"));
    }
}

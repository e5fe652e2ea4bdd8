//! Graph validation and name resolution.

use std::collections::{HashMap, HashSet};

use ep_core::{CompartmentId, FlowId, ParamId};
use tracing::warn;

use crate::builder::{ConservedDecl, FlowDecl, OrphanPolicy};
use crate::error::{GraphError, GraphResult};
use crate::graph::{Compartment, ConservedTotal, Flow, Parameter};
use crate::rate::{Rate, RateExpr};

/// Declarations with every name resolved to an ID.
pub(crate) struct Resolved {
    pub(crate) flows: Vec<Flow>,
    pub(crate) conserved: Option<ConservedTotal>,
}

/// Validate the declarations and resolve names.
///
/// Checks run in a fixed order so the first reported error is deterministic:
/// compartments, parameters, flows, parameter usage, orphans, conserved group.
pub(crate) fn resolve(
    compartments: &[Compartment],
    parameters: &[Parameter],
    flows: &[FlowDecl],
    conserved: Option<&ConservedDecl>,
    orphan_policy: OrphanPolicy,
) -> GraphResult<Resolved> {
    if compartments.is_empty() {
        return Err(GraphError::EmptyGraph);
    }

    let mut comp_ids: HashMap<&str, CompartmentId> = HashMap::new();
    for comp in compartments {
        if comp_ids.insert(comp.name.as_str(), comp.id).is_some() {
            return Err(GraphError::DuplicateCompartment {
                name: comp.name.clone(),
            });
        }
        if !comp.initial_value.is_finite() {
            return Err(GraphError::NonFiniteInitialValue {
                name: comp.name.clone(),
                value: comp.initial_value,
            });
        }
    }

    let mut param_ids: HashMap<&str, ParamId> = HashMap::new();
    for param in parameters {
        if param_ids.insert(param.name.as_str(), param.id).is_some() {
            return Err(GraphError::DuplicateParameter {
                name: param.name.clone(),
            });
        }
    }

    let lookup_comp = |name: &str, decl: &FlowDecl| {
        comp_ids
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UndeclaredCompartment {
                name: name.to_string(),
                flow: decl.describe(),
            })
    };
    let lookup_param = |name: &str, decl: &FlowDecl| {
        param_ids
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UndeclaredParameter {
                name: name.to_string(),
                flow: decl.describe(),
            })
    };

    let mut resolved_flows = Vec::with_capacity(flows.len());
    for (i, decl) in flows.iter().enumerate() {
        let source = lookup_comp(&decl.source, decl)?;
        let target = lookup_comp(&decl.target, decl)?;
        if source == target {
            return Err(GraphError::SelfLoop {
                name: decl.source.clone(),
            });
        }

        let rate = match &decl.rate {
            Rate::MassAction { rate, infectious } => RateExpr::MassAction {
                rate: lookup_param(rate, decl)?,
                infectious: lookup_comp(infectious, decl)?,
            },
            Rate::Linear { rate } => RateExpr::Linear {
                rate: lookup_param(rate, decl)?,
            },
            Rate::Constant { rate } => RateExpr::Constant {
                rate: lookup_param(rate, decl)?,
            },
        };

        resolved_flows.push(Flow {
            id: FlowId::from_index(i as u32),
            source,
            target,
            rate,
            label: decl.rate.parameter().to_string(),
        });
    }

    let used_params: HashSet<ParamId> = resolved_flows.iter().map(|f| f.rate.parameter()).collect();
    if let Some(unused) = parameters.iter().find(|p| !used_params.contains(&p.id)) {
        return Err(GraphError::UnusedParameter {
            name: unused.name.clone(),
        });
    }

    check_orphans(compartments, &resolved_flows, orphan_policy)?;

    let conserved = match conserved {
        Some(decl) => Some(resolve_conserved(decl, &comp_ids)?),
        None => None,
    };

    Ok(Resolved {
        flows: resolved_flows,
        conserved,
    })
}

fn check_orphans(
    compartments: &[Compartment],
    flows: &[Flow],
    policy: OrphanPolicy,
) -> GraphResult<()> {
    let touched: HashSet<CompartmentId> = flows
        .iter()
        .flat_map(|f| [f.source, f.target])
        .collect();

    for comp in compartments.iter().filter(|c| !touched.contains(&c.id)) {
        match policy {
            OrphanPolicy::Deny => {
                return Err(GraphError::OrphanCompartment {
                    name: comp.name.clone(),
                });
            }
            OrphanPolicy::Warn => {
                warn!(compartment = %comp.name, "compartment participates in no flow");
            }
        }
    }
    Ok(())
}

fn resolve_conserved(
    decl: &ConservedDecl,
    comp_ids: &HashMap<&str, CompartmentId>,
) -> GraphResult<ConservedTotal> {
    if !decl.total.is_finite() || decl.total < 0.0 {
        return Err(GraphError::InvalidConservedTotal { total: decl.total });
    }

    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(decl.members.len());
    for name in &decl.members {
        let id = comp_ids
            .get(name.as_str())
            .copied()
            .ok_or_else(|| GraphError::UndeclaredCompartment {
                name: name.clone(),
                flow: "conserved total".to_string(),
            })?;
        if !seen.insert(id) {
            return Err(GraphError::DuplicateConservedMember { name: name.clone() });
        }
        members.push(id);
    }

    Ok(ConservedTotal {
        members,
        total: decl.total,
    })
}

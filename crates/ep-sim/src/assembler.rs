//! ODE assembler: compartment graph → derivative function.
//!
//! Each compartment's derivative is the signed sum of its incident flow
//! rates: inflows count positive, outflows negative. Flows are evaluated
//! once and scattered to both endpoints, which is the same sum.

use ep_core::Real;
use ep_graph::{CompartmentGraph, RateExpr};

use crate::error::{SimError, SimResult};
use crate::model::OdeSystem;

#[derive(Debug, Clone)]
struct CompiledFlow {
    source: usize,
    target: usize,
    rate: RateExpr,
    label: String,
}

/// Pure derivative function `f(t, state, params) -> d(state)/dt`.
///
/// Holds only the graph topology; parameter values are passed per call, so
/// one `DerivativeFn` can be shared by any number of runs and threads.
#[derive(Debug, Clone)]
pub struct DerivativeFn {
    labels: Vec<String>,
    param_names: Vec<String>,
    flows: Vec<CompiledFlow>,
}

/// Compile a validated graph into a derivative function.
pub fn assemble(graph: &CompartmentGraph) -> DerivativeFn {
    let labels: Vec<String> = graph.compartments().iter().map(|c| c.name.clone()).collect();
    let flows = graph
        .flows()
        .iter()
        .map(|f| CompiledFlow {
            source: f.source.slot(),
            target: f.target.slot(),
            rate: f.rate,
            label: format!("{} -> {}", labels[f.source.slot()], labels[f.target.slot()]),
        })
        .collect();

    DerivativeFn {
        param_names: graph.parameters().iter().map(|p| p.name.clone()).collect(),
        labels,
        flows,
    }
}

impl DerivativeFn {
    /// Length of the state vector.
    pub fn dimension(&self) -> usize {
        self.labels.len()
    }

    /// Length of the parameter binding.
    pub fn param_count(&self) -> usize {
        self.param_names.len()
    }

    /// Compartment names in state order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Flow labels (`"S -> I"`) in flow order.
    pub fn flow_labels(&self) -> impl Iterator<Item = &str> {
        self.flows.iter().map(|f| f.label.as_str())
    }

    fn check_inputs(&self, t: Real, state: &[Real], params: &[Real]) -> SimResult<()> {
        if state.len() != self.dimension() {
            return Err(SimError::DimensionMismatch {
                what: "state",
                expected: self.dimension(),
                actual: state.len(),
            });
        }
        if params.len() != self.param_count() {
            return Err(SimError::DimensionMismatch {
                what: "params",
                expected: self.param_count(),
                actual: params.len(),
            });
        }
        if let Some((i, v)) = state.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::NonFiniteState {
                what: "state",
                label: self.labels[i].clone(),
                t,
                value: *v,
            });
        }
        if let Some((i, v)) = params.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::NonFiniteState {
                what: "parameter",
                label: self.param_names[i].clone(),
                t,
                value: *v,
            });
        }
        Ok(())
    }

    /// Instantaneous magnitude of every flow, in flow order.
    pub fn flow_rates(&self, t: Real, state: &[Real], params: &[Real]) -> SimResult<Vec<Real>> {
        self.check_inputs(t, state, params)?;
        let total: Real = state.iter().sum();
        self.flows
            .iter()
            .map(|flow| self.rate_of(flow, t, state, params, total))
            .collect()
    }

    fn rate_of(
        &self,
        flow: &CompiledFlow,
        t: Real,
        state: &[Real],
        params: &[Real],
        total: Real,
    ) -> SimResult<Real> {
        let rate = flow.rate.evaluate(state[flow.source], state, params, total);
        if !rate.is_finite() {
            return Err(SimError::NonFiniteState {
                what: "flow rate",
                label: flow.label.clone(),
                t,
                value: rate,
            });
        }
        // A negative rate is only a definition bug when the state itself is
        // physical; slightly negative states come from discretization.
        if rate < 0.0 && state.iter().all(|v| *v >= 0.0) {
            return Err(SimError::NegativeFlowRate {
                flow: flow.label.clone(),
                rate,
            });
        }
        Ok(rate)
    }

    /// Evaluate `d(state)/dt` into `out`.
    pub fn evaluate_into(
        &self,
        t: Real,
        state: &[Real],
        params: &[Real],
        out: &mut [Real],
    ) -> SimResult<()> {
        self.check_inputs(t, state, params)?;
        if out.len() != self.dimension() {
            return Err(SimError::DimensionMismatch {
                what: "derivative buffer",
                expected: self.dimension(),
                actual: out.len(),
            });
        }

        let total: Real = state.iter().sum();
        out.fill(0.0);
        for flow in &self.flows {
            let rate = self.rate_of(flow, t, state, params, total)?;
            out[flow.source] -= rate;
            out[flow.target] += rate;
        }
        Ok(())
    }

    /// Evaluate `d(state)/dt`.
    pub fn evaluate(&self, t: Real, state: &[Real], params: &[Real]) -> SimResult<Vec<Real>> {
        let mut out = vec![0.0; self.dimension()];
        self.evaluate_into(t, state, params, &mut out)?;
        Ok(out)
    }

    /// Fix the parameter binding, producing an `OdeSystem`.
    pub fn bind<'a>(&'a self, params: &'a [Real]) -> SimResult<BoundSystem<'a>> {
        if params.len() != self.param_count() {
            return Err(SimError::DimensionMismatch {
                what: "params",
                expected: self.param_count(),
                actual: params.len(),
            });
        }
        Ok(BoundSystem {
            derivative: self,
            params,
        })
    }
}

/// A derivative function with its parameters fixed for one run.
#[derive(Debug, Clone, Copy)]
pub struct BoundSystem<'a> {
    derivative: &'a DerivativeFn,
    params: &'a [Real],
}

impl BoundSystem<'_> {
    pub fn params(&self) -> &[Real] {
        self.params
    }
}

impl OdeSystem for BoundSystem<'_> {
    fn dimension(&self) -> usize {
        self.derivative.dimension()
    }

    fn rhs(&self, t: f64, x: &[f64], out: &mut [f64]) -> SimResult<()> {
        self.derivative.evaluate_into(t, x, self.params, out)
    }

    fn state_label(&self, i: usize) -> String {
        self.derivative
            .labels
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("x[{i}]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ep_graph::{GraphBuilder, Rate};

    fn sir() -> DerivativeFn {
        let mut b = GraphBuilder::new();
        b.declare_compartment("S", 990.0);
        b.declare_compartment("I", 10.0);
        b.declare_compartment("R", 0.0);
        b.declare_parameter("beta");
        b.declare_parameter("gamma");
        b.declare_flow("S", "I", Rate::mass_action("beta", "I"));
        b.declare_flow("I", "R", Rate::linear("gamma"));
        assemble(&b.build().unwrap())
    }

    #[test]
    fn sir_derivative_matches_closed_form() {
        let f = sir();
        let (s, i, r) = (990.0, 10.0, 0.0);
        let (beta, gamma) = (0.3, 0.1);
        let n = s + i + r;
        let d = f.evaluate(0.0, &[s, i, r], &[beta, gamma]).unwrap();
        assert!((d[0] - (-beta * s * i / n)).abs() < 1e-12);
        assert!((d[1] - (beta * s * i / n - gamma * i)).abs() < 1e-12);
        assert!((d[2] - gamma * i).abs() < 1e-12);
    }

    #[test]
    fn derivatives_sum_to_zero() {
        let f = sir();
        let d = f.evaluate(0.0, &[500.0, 300.0, 200.0], &[0.7, 0.2]).unwrap();
        assert!(d.iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let f = sir();
        let state = [123.4, 56.7, 8.9];
        let params = [0.31, 0.07];
        let a = f.evaluate(2.5, &state, &params).unwrap();
        let b = f.evaluate(2.5, &state, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dimension_checks() {
        let f = sir();
        assert!(matches!(
            f.evaluate(0.0, &[1.0, 2.0], &[0.1, 0.1]),
            Err(SimError::DimensionMismatch { what: "state", .. })
        ));
        assert!(matches!(
            f.evaluate(0.0, &[1.0, 2.0, 3.0], &[0.1]),
            Err(SimError::DimensionMismatch { what: "params", .. })
        ));
        assert!(f.bind(&[0.1]).is_err());
    }

    #[test]
    fn non_finite_state_is_reported_with_label() {
        let f = sir();
        let err = f.evaluate(1.0, &[1.0, f64::NAN, 0.0], &[0.1, 0.1]).unwrap_err();
        assert!(matches!(err, SimError::NonFiniteState { ref label, .. } if label == "I"));
    }

    #[test]
    fn negative_rate_from_physical_state_is_a_definition_bug() {
        let f = sir();
        let err = f.evaluate(0.0, &[10.0, 1.0, 0.0], &[0.1, -0.5]).unwrap_err();
        assert!(matches!(err, SimError::NegativeFlowRate { ref flow, .. } if flow == "I -> R"));
    }

    #[test]
    fn flow_rates_in_flow_order() {
        let f = sir();
        let rates = f.flow_rates(0.0, &[990.0, 10.0, 0.0], &[0.3, 0.1]).unwrap();
        assert_eq!(rates.len(), 2);
        assert!((rates[0] - 2.97).abs() < 1e-12);
        assert!((rates[1] - 1.0).abs() < 1e-12);
        assert_eq!(f.flow_labels().collect::<Vec<_>>(), ["S -> I", "I -> R"]);
    }

    #[test]
    fn bound_system_labels_states() {
        let f = sir();
        let params = [0.3, 0.1];
        let sys = f.bind(&params).unwrap();
        assert_eq!(sys.dimension(), 3);
        assert_eq!(sys.state_label(2), "R");
        assert_eq!(sys.state_label(9), "x[9]");
    }
}

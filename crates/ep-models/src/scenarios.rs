//! Preset scenarios for the built-in models.
//!
//! Initial conditions are population fractions; scale by a population size
//! with `InitialConditions::scaled` to get head counts.

use crate::kind::ModelKind;
use crate::params::{InitialConditions, ParameterSet};

/// São Paulo state population (2024 estimate).
pub const SAO_PAULO_POPULATION: f64 = 45_973_194.0;

/// A named parameter/initial-condition preset.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: &'static str,
    pub name: &'static str,
    pub model: ModelKind,
    pub description: &'static str,
    pub parameters: ParameterSet,
    pub initial_conditions: InitialConditions,
    /// Population the fractions refer to.
    pub population: f64,
}

fn seeded_sir(initial_cases: f64, population: f64) -> InitialConditions {
    let infected = initial_cases / population;
    InitialConditions::new()
        .with("S", 1.0 - infected)
        .with("I", infected)
        .with("R", 0.0)
}

/// All presets, in display order.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "covid19-sp",
            name: "COVID-19 (SP - Standard)",
            model: ModelKind::Sir,
            description: "Approximation of COVID-19 in SP. R0 ≈ 3.1, infectious period ≈ 7 days.",
            parameters: ParameterSet::new().with("beta", 0.44).with("gamma", 0.14),
            initial_conditions: seeded_sir(1000.0, SAO_PAULO_POPULATION),
            population: SAO_PAULO_POPULATION,
        },
        Scenario {
            id: "influenza-sp",
            name: "Influenza (SP - Seasonal)",
            model: ModelKind::Sir,
            description: "Seasonal flu scenario. R0 ≈ 1.3, infectious period ≈ 5 days.",
            parameters: ParameterSet::new().with("beta", 0.26).with("gamma", 0.2),
            initial_conditions: seeded_sir(500.0, SAO_PAULO_POPULATION),
            population: SAO_PAULO_POPULATION,
        },
        Scenario {
            id: "rsv-sp",
            name: "RSV (SP - High Transmissibility)",
            model: ModelKind::Sir,
            description: "RSV scenario (children/elderly impact). R0 ≈ 3.0, infectious period ≈ 7 days.",
            parameters: ParameterSet::new().with("beta", 0.43).with("gamma", 0.143),
            initial_conditions: seeded_sir(200.0, SAO_PAULO_POPULATION),
            population: SAO_PAULO_POPULATION,
        },
    ]
}

/// Find a preset by id or display name (case-insensitive).
pub fn find_scenario(key: &str) -> Option<Scenario> {
    scenarios()
        .into_iter()
        .find(|s| s.id.eq_ignore_ascii_case(key) || s.name.eq_ignore_ascii_case(key))
}

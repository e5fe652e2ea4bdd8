//! Built-in model kinds.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// The four built-in model kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Sir,
    SirD,
    SirF,
    SewirF,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [Self::Sir, Self::SirD, Self::SirF, Self::SewirF];

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sir => "SIR",
            Self::SirD => "SIR-D",
            Self::SirF => "SIR-F",
            Self::SewirF => "SEWIR-F",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uppercase and drop separators so `"sir_d"`, `"SIR-D"` and `"SIRD"` compare equal.
pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        Self::ALL
            .into_iter()
            .find(|k| normalize(k.name()) == key)
            .ok_or_else(|| ModelError::UnknownModelKind {
                kind: s.to_string(),
                known: Self::ALL.map(ModelKind::name).join(", "),
            })
    }
}

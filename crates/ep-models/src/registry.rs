//! Explicit model registry.
//!
//! The registry is an ordinary value owned by whoever runs simulations, not
//! ambient global state: tests can build one with extra models without
//! touching the built-in set.

use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::kind::{ModelKind, normalize};
use crate::sewirf::SewirF;
use crate::sir::Sir;
use crate::sird::SirD;
use crate::sirf::SirF;
use crate::traits::CompartmentalModel;

/// Immutable name → model map, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<dyn CompartmentalModel>>,
}

impl ModelRegistry {
    /// Registry with the four built-in models.
    pub fn builtin() -> Self {
        Self::builder().with_builtins().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a model by name; separators and case are ignored.
    pub fn get(&self, name: &str) -> ModelResult<Arc<dyn CompartmentalModel>> {
        let key = normalize(name);
        self.models
            .iter()
            .find(|m| normalize(m.name()) == key)
            .cloned()
            .ok_or_else(|| ModelError::UnknownModelKind {
                kind: name.to_string(),
                known: self.names().join(", "),
            })
    }

    /// Look up a built-in kind.
    pub fn get_kind(&self, kind: ModelKind) -> ModelResult<Arc<dyn CompartmentalModel>> {
        self.get(kind.name())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Registered model names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CompartmentalModel>> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Builder for a `ModelRegistry`.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    models: Vec<Arc<dyn CompartmentalModel>>,
}

impl RegistryBuilder {
    /// Register the built-in SIR, SIR-D, SIR-F and SEWIR-F models.
    pub fn with_builtins(self) -> Self {
        self.register(Sir)
            .register(SirD)
            .register(SirF)
            .register(SewirF)
    }

    /// Register a model, replacing any model with the same normalized name.
    pub fn register<M: CompartmentalModel + 'static>(self, model: M) -> Self {
        self.register_arc(Arc::new(model))
    }

    pub fn register_arc(mut self, model: Arc<dyn CompartmentalModel>) -> Self {
        let key = normalize(model.name());
        match self.models.iter().position(|m| normalize(m.name()) == key) {
            Some(i) => self.models[i] = model,
            None => self.models.push(model),
        }
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
        }
    }
}

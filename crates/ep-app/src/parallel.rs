//! Independent runs in parallel.

use std::sync::Arc;

use ep_models::ModelRegistry;
use rayon::prelude::*;
use tracing::debug;

use crate::config::RunConfig;
use crate::error::AppResult;
use crate::session::{RunOutput, SimulationSession};

/// Run each configuration in its own session, in parallel.
///
/// Sessions share only the immutable registry. Results come back in input
/// order; one failed run does not affect the others.
pub fn run_parallel(
    registry: &Arc<ModelRegistry>,
    configs: Vec<RunConfig>,
) -> Vec<AppResult<Arc<RunOutput>>> {
    debug!(runs = configs.len(), "starting parallel runs");
    configs
        .into_par_iter()
        .map(|config| {
            let mut session = SimulationSession::new(Arc::clone(registry));
            session.configure(config)?;
            session.run()
        })
        .collect()
}

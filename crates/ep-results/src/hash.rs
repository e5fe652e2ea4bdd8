//! Content-based hashing for run IDs.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ResultsResult;

/// SHA-256 over the canonical JSON of a resolved run configuration plus the
/// solver version. Equal configurations always map to the same id.
pub fn compute_run_id<C: Serialize + ?Sized>(
    config: &C,
    solver_version: &str,
) -> ResultsResult<String> {
    let mut hasher = Sha256::new();

    let config_json = serde_json::to_string(config)?;
    hasher.update(config_json.as_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config(beta: f64) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([("beta", beta), ("gamma", 0.1)])
    }

    #[test]
    fn hash_stability() {
        let hash1 = compute_run_id(&config(0.3), "v1").unwrap();
        let hash2 = compute_run_id(&config(0.3), "v1").unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let base = compute_run_id(&config(0.3), "v1").unwrap();
        assert_ne!(base, compute_run_id(&config(0.4), "v1").unwrap());
        assert_ne!(base, compute_run_id(&config(0.3), "v2").unwrap());
    }
}

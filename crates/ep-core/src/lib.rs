//! ep-core: stable foundation for the epidemic lab.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact IDs for compartments, flows and parameters)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{EpError, EpResult};
pub use ids::*;
pub use numeric::*;

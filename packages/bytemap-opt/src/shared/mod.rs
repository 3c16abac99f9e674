//! Shared module - Common types used across all features
//!
//! Holds the IR model only; analyses live under `features/`.

pub mod models;

// Re-exports for convenience
pub use models::*;

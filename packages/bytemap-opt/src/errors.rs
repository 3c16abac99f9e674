//! Error types for bytemap-opt
//!
//! Only internal-consistency violations are errors. Anything the analyses
//! cannot decide is reported as an absent value and handled conservatively.

use crate::config::ConfigError;
use crate::shared::models::{BlockId, Loc};
use thiserror::Error;

/// Main error type for bytemap-opt operations
#[derive(Debug, Error)]
pub enum BytemapError {
    /// A location that is not part of the program graph
    #[error("Unknown location: {0}")]
    UnknownLocation(Loc),

    /// A block id that is not part of the program graph
    #[error("Unknown block: b{0}")]
    UnknownBlock(BlockId),

    /// The block graph has a cycle
    #[error("Program is not loop-free: cycle through block b{0}")]
    NotADag(BlockId),

    /// A bytemap command whose operands are not bare symbols
    #[error("Command is not unfolded: {0}")]
    NotUnfolded(String),

    /// A bytemap assignment reached the generic fallthrough handler
    #[error("Unexpected bytemap assignment: {0}")]
    UnexpectedBytemapAssignment(String),

    /// `diff` was asked about two locations where the first cannot reach the second
    #[error("Location {from} cannot reach {to}")]
    Unreachable { from: Loc, to: Loc },

    /// Two incompatible edits were requested for the same location
    #[error("Conflicting edits requested at {0}")]
    ConflictingPatch(Loc),

    /// The store chain walk revisited a location it is still expanding
    #[error("Store chain cycle through {0}")]
    StoreChainCycle(Loc),

    /// JSON (de)serialization of a program
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BytemapError {
    /// Create a not-unfolded error from anything printable
    pub fn not_unfolded(what: impl ToString) -> Self {
        BytemapError::NotUnfolded(what.to_string())
    }
}

/// Result type alias for bytemap operations
pub type Result<T> = std::result::Result<T, BytemapError>;

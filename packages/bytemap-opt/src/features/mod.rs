//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! Each feature contains:
//! - domain/     - Pure logic over the IR
//! - ports/      - Interface definitions (traits)
//! - application/ - Use cases
//! - infrastructure/ - Implementations

pub mod data_flow;

// Numeric ranges answering aliasing and containment questions
pub mod intervals;

// Deferred edits, committed in one batch
pub mod patching;

// Bytemap inliner and cone of influence, plus their driver
pub mod bytemaps;

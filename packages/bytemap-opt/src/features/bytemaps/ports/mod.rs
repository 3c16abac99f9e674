/*
 * Bytemap Ports
 *
 * Collaborators the passes consume:
 * - Erasability: which assignments may be deleted or rewritten
 * - Scalarizer: companion pass run by the driver
 */

pub mod erasability;
pub mod scalarizer;

pub use erasability::{EraseAll, Erasability, PreservedVars};
pub use scalarizer::{NoScalarization, Scalarizer};

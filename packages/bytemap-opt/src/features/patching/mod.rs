/*
 * Patching
 *
 * Copy-on-write editing of a program: passes read a stable snapshot and stage
 * edits keyed by location; `commit` applies them as one batch.
 *
 * Architecture:
 * - Domain: EditAction, LocEdits, RewriteStats
 * - Infrastructure: PatchingProgram (dashmap edit table, parking_lot prologues)
 */

pub mod domain;
pub mod infrastructure;

pub use domain::{EditAction, LocEdits, RewriteStats};
pub use infrastructure::PatchingProgram;

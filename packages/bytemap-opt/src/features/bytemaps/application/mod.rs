/*
 * Bytemap Application Layer
 *
 * The driver sequencing the bytemap passes.
 */

pub mod optimize;

pub use optimize::{optimize_bytemaps, optimize_bytemaps_with};

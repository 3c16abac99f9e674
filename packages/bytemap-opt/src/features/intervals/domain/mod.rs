/*
 * Interval Domain
 *
 * - Interval: non-wrapping ranges, what the oracle reports per variable
 * - WrappedInterval: arcs mod 2^256, what term differences are computed in
 */

mod interval;
mod wrapped;

pub use interval::{Bound, Interval};
pub use wrapped::WrappedInterval;

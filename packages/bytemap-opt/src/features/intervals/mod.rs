/*
 * Intervals
 *
 * Numeric ranges for variables, used to decide whether two index terms can
 * alias and whether an index falls inside a copied range.
 *
 * Architecture:
 * - Domain: Interval (non-wrapping), WrappedInterval (mod 2^256)
 * - Ports: IntervalOracle
 * - Infrastructure: IntervalAnalysis (forward DAG sweep)
 */

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{Bound, Interval, WrappedInterval};
pub use infrastructure::IntervalAnalysis;
pub use ports::IntervalOracle;

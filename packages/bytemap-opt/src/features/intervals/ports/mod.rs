/*
 * Interval Ports
 */

use crate::features::intervals::domain::Interval;
use crate::shared::models::{Loc, Var};

/// Numeric range oracle
///
/// Shared read-only between passes, so implementations must be `Send + Sync`.
pub trait IntervalOracle: Send + Sync {
    /// Range of `var` just before the command at `loc`
    fn range_at(&self, loc: Loc, var: &Var) -> Interval;

    /// Range of the value assigned by the command at `loc`, if it assigns a number
    fn lhs_range(&self, loc: Loc) -> Option<Interval>;
}

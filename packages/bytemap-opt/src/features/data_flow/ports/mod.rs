/*
 * Data Flow Ports
 *
 * Oracles the bytemap passes consult about the program they rewrite.
 */

use crate::features::data_flow::domain::DefSites;
use crate::shared::models::{Loc, Var};

/// Reaching definitions
pub trait DefSitesProvider: Send + Sync {
    /// Locations whose assignment to `var` may be observed just before the command at `loc`
    fn def_sites(&self, var: &Var, loc: Loc) -> DefSites;
}

/// Control-flow reachability between locations
pub trait ReachabilityProvider: Send + Sync {
    /// Reflexive: every location reaches itself
    fn can_reach(&self, from: Loc, to: Loc) -> bool;
}

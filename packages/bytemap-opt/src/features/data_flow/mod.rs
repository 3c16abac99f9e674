/*
 * Data Flow Infrastructure
 *
 * Loop-free dataflow over the block graph of a `Program`:
 * - BlockGraph: petgraph DAG of blocks with a topological order
 * - forward/backward sweeps: one pass in (reverse) topological order, no fixpoint
 * - ReachingDefs: variable → defining locations (None = function entry)
 * - Reachability: location → location
 *
 * Architecture:
 * - Domain: DefSites
 * - Ports: DefSitesProvider, ReachabilityProvider
 * - Infrastructure: BlockGraph, dag sweeps, ReachingDefs, Reachability
 * - Application: AnalysisCache (everything above for one program snapshot)
 */

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::AnalysisCache;
pub use domain::{concrete_sites, DefSites};
pub use infrastructure::{
    backward_dag_dataflow, forward_dag_dataflow, BlockGraph, Reachability, ReachingDefs,
};
pub use ports::{DefSitesProvider, ReachabilityProvider};

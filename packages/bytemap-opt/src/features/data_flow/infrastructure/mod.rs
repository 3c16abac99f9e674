//! Data Flow infrastructure

pub mod block_graph;
pub mod reachability;
pub mod reaching_defs;

pub use block_graph::{backward_dag_dataflow, forward_dag_dataflow, BlockGraph};
pub use reachability::Reachability;
pub use reaching_defs::ReachingDefs;

//! Location-level reachability over the block DAG

use super::block_graph::BlockGraph;
use crate::features::data_flow::ports::ReachabilityProvider;
use crate::shared::models::{BlockId, Loc};
use rustc_hash::{FxHashMap, FxHashSet};

pub struct Reachability {
    /// Blocks reachable from each block, itself included
    reachable: FxHashMap<BlockId, FxHashSet<BlockId>>,
}

impl Reachability {
    pub fn compute(graph: &BlockGraph) -> Self {
        let mut reachable: FxHashMap<BlockId, FxHashSet<BlockId>> = FxHashMap::default();
        for &block in graph.topo_order().iter().rev() {
            let mut set = FxHashSet::default();
            set.insert(block);
            for succ in graph.succs(block) {
                if let Some(from_succ) = reachable.get(&succ) {
                    set.extend(from_succ.iter().copied());
                }
            }
            reachable.insert(block, set);
        }
        Self { reachable }
    }
}

impl ReachabilityProvider for Reachability {
    fn can_reach(&self, from: Loc, to: Loc) -> bool {
        if from.block == to.block {
            return from.pos <= to.pos;
        }
        self.reachable
            .get(&from.block)
            .is_some_and(|set| set.contains(&to.block))
    }
}

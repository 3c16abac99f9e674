/*
 * Block Graph
 *
 * Petgraph view of a program's blocks:
 * - Topological order for the loop-free sweeps
 * - Cycle detection at build time (an upstream bug, reported as NotADag)
 */

use crate::errors::{BytemapError, Result};
use crate::shared::models::{Block, BlockId, Program};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Block DAG with a cached topological order
pub struct BlockGraph {
    /// Edge A → B means control may flow from A to B
    graph: DiGraph<BlockId, ()>,

    /// Block ID → Node index mapping for O(1) lookups
    block_to_node: FxHashMap<BlockId, NodeIndex>,

    topo_order: Vec<BlockId>,
}

impl BlockGraph {
    pub fn build(program: &Program) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut block_to_node = FxHashMap::default();

        for block in program.blocks() {
            let idx = graph.add_node(block.id);
            block_to_node.insert(block.id, idx);
        }

        for block in program.blocks() {
            let from = block_to_node[&block.id];
            for succ in &block.succs {
                let to = *block_to_node
                    .get(succ)
                    .ok_or(BytemapError::UnknownBlock(*succ))?;
                graph.add_edge(from, to, ());
            }
        }

        let topo_order = toposort(&graph, None)
            .map_err(|cycle| BytemapError::NotADag(graph[cycle.node_id()]))?
            .into_iter()
            .map(|idx| graph[idx])
            .collect();

        Ok(Self {
            graph,
            block_to_node,
            topo_order,
        })
    }

    /// Predecessors come before successors
    pub fn topo_order(&self) -> &[BlockId] {
        &self.topo_order
    }

    pub fn preds(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Incoming)
    }

    pub fn succs(&self, block: BlockId) -> Vec<BlockId> {
        self.neighbors(block, Direction::Outgoing)
    }

    fn neighbors(&self, block: BlockId, dir: Direction) -> Vec<BlockId> {
        let Some(&idx) = self.block_to_node.get(&block) else {
            return vec![];
        };
        let unique: BTreeSet<BlockId> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n])
            .collect();
        unique.into_iter().collect()
    }
}

/// One forward sweep in topological order.
///
/// `transfer` receives the block and the results of all its predecessors, and returns the
/// result at the block's exit.
pub fn forward_dag_dataflow<T, F>(
    program: &Program,
    graph: &BlockGraph,
    mut transfer: F,
) -> Result<BTreeMap<BlockId, T>>
where
    F: FnMut(&Block, Vec<&T>) -> Result<T>,
{
    let mut results = BTreeMap::new();
    for &id in graph.topo_order() {
        let block = program.block(id)?;
        let ins: Vec<&T> = graph
            .preds(id)
            .iter()
            .filter_map(|p| results.get(p))
            .collect();
        let out = transfer(block, ins)?;
        results.insert(id, out);
    }
    Ok(results)
}

/// One backward sweep in reverse topological order.
///
/// `transfer` receives the block and the results of all its successors, and returns the
/// result at the block's entry.
pub fn backward_dag_dataflow<T, F>(
    program: &Program,
    graph: &BlockGraph,
    mut transfer: F,
) -> Result<BTreeMap<BlockId, T>>
where
    F: FnMut(&Block, Vec<&T>) -> Result<T>,
{
    let mut results = BTreeMap::new();
    for &id in graph.topo_order().iter().rev() {
        let block = program.block(id)?;
        let outs: Vec<&T> = graph
            .succs(id)
            .iter()
            .filter_map(|s| results.get(s))
            .collect();
        let entry = transfer(block, outs)?;
        results.insert(id, entry);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Program {
        Program::new(
            0,
            vec![
                Block::new(0, vec![], vec![1, 2]),
                Block::new(1, vec![], vec![3]),
                Block::new(2, vec![], vec![3]),
                Block::new(3, vec![], vec![]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_topological_order() {
        let graph = BlockGraph::build(&diamond()).unwrap();
        let order = graph.topo_order();
        let pos = |b: BlockId| order.iter().position(|&x| x == b).unwrap();

        assert_eq!(order.len(), 4);
        assert!(pos(0) < pos(1));
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(3));
    }

    #[test]
    fn test_preds_and_succs() {
        let graph = BlockGraph::build(&diamond()).unwrap();
        assert_eq!(graph.preds(3), vec![1, 2]);
        assert_eq!(graph.succs(0), vec![1, 2]);
        assert!(graph.preds(0).is_empty());
        assert!(graph.succs(42).is_empty());
    }

    #[test]
    fn test_cycle_detected() {
        let program = Program::new(
            0,
            vec![
                Block::new(0, vec![], vec![1]),
                Block::new(1, vec![], vec![0]),
            ],
        )
        .unwrap();
        assert!(matches!(
            BlockGraph::build(&program),
            Err(BytemapError::NotADag(_))
        ));
    }

    #[test]
    fn test_forward_counts_paths() {
        let program = diamond();
        let graph = BlockGraph::build(&program).unwrap();
        let paths = forward_dag_dataflow(&program, &graph, |_, ins: Vec<&u32>| {
            Ok(if ins.is_empty() { 1 } else { ins.into_iter().sum() })
        })
        .unwrap();
        assert_eq!(paths[&3], 2);
    }

    #[test]
    fn test_backward_sees_successors_first() {
        let program = diamond();
        let graph = BlockGraph::build(&program).unwrap();
        let depth = backward_dag_dataflow(&program, &graph, |_, outs: Vec<&u32>| {
            Ok(outs.into_iter().max().map_or(0, |d| d + 1))
        })
        .unwrap();
        assert_eq!(depth[&0], 2);
        assert_eq!(depth[&3], 0);
    }
}

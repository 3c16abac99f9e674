/*
 * Data Flow Application Layer
 *
 * Bundles the analyses of one program snapshot.
 */

use crate::errors::Result;
use crate::features::data_flow::domain::DefSites;
use crate::features::data_flow::infrastructure::{BlockGraph, Reachability, ReachingDefs};
use crate::features::data_flow::ports::{DefSitesProvider, ReachabilityProvider};
use crate::shared::models::{Loc, Program, Var};

/// Graph, reaching definitions and reachability for one program
pub struct AnalysisCache<'p> {
    pub program: &'p Program,
    pub graph: BlockGraph,
    pub defs: ReachingDefs<'p>,
    pub reach: Reachability,
}

impl<'p> AnalysisCache<'p> {
    pub fn build(program: &'p Program) -> Result<Self> {
        let graph = BlockGraph::build(program)?;
        let defs = ReachingDefs::compute(program, &graph)?;
        let reach = Reachability::compute(&graph);
        tracing::trace!(
            blocks = graph.topo_order().len(),
            cmds = program.cmd_count(),
            "analysis cache built"
        );
        Ok(Self {
            program,
            graph,
            defs,
            reach,
        })
    }

    pub fn def_sites(&self, var: &Var, loc: Loc) -> DefSites {
        self.defs.def_sites(var, loc)
    }

    /// Def sites at `loc`, excluding function entry
    pub fn concrete_def_sites(&self, var: &Var, loc: Loc) -> Vec<Loc> {
        self.defs.def_sites(var, loc).into_iter().flatten().collect()
    }

    pub fn can_reach(&self, from: Loc, to: Loc) -> bool {
        self.reach.can_reach(from, to)
    }
}

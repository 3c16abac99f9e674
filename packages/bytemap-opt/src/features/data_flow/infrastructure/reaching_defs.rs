/*
 * Reaching Definitions
 *
 * Forward sweep recording, at each block entry, which locations may have
 * assigned each variable last. Inside a block the answer is found by
 * scanning back from the queried position.
 *
 * Join: union of the incoming sets. A variable missing along some
 * predecessor may still hold its entry value, so `None` joins the set.
 */

use super::block_graph::{forward_dag_dataflow, BlockGraph};
use crate::errors::Result;
use crate::features::data_flow::domain::DefSites;
use crate::features::data_flow::ports::DefSitesProvider;
use crate::shared::models::{BlockId, Loc, Program, Var};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

type DefMap = BTreeMap<Var, DefSites>;

pub struct ReachingDefs<'p> {
    program: &'p Program,
    at_entry: FxHashMap<BlockId, DefMap>,
}

impl<'p> ReachingDefs<'p> {
    pub fn compute(program: &'p Program, graph: &BlockGraph) -> Result<Self> {
        let mut at_entry = FxHashMap::default();

        forward_dag_dataflow(program, graph, |block, ins: Vec<&DefMap>| {
            let entry = join(&ins);
            let mut current = entry.clone();
            at_entry.insert(block.id, entry);

            for (loc, cmd) in block.located_cmds() {
                if let Some(lhs) = cmd.lhs() {
                    current.insert(lhs.clone(), DefSites::from([Some(loc)]));
                }
            }
            Ok(current)
        })?;

        Ok(Self { program, at_entry })
    }
}

fn join(ins: &[&DefMap]) -> DefMap {
    let mut out = DefMap::new();
    for map in ins {
        for (var, sites) in map.iter() {
            out.entry(var.clone())
                .or_insert_with(DefSites::new)
                .extend(sites.iter().copied());
        }
    }
    for (var, sites) in out.iter_mut() {
        if ins.iter().any(|m| !m.contains_key(var)) {
            sites.insert(None);
        }
    }
    out
}

impl DefSitesProvider for ReachingDefs<'_> {
    fn def_sites(&self, var: &Var, loc: Loc) -> DefSites {
        if let Ok(block) = self.program.block(loc.block) {
            let upto = loc.pos.min(block.cmds.len());
            let local = block.cmds[..upto]
                .iter()
                .enumerate()
                .rev()
                .find(|(_, cmd)| cmd.lhs() == Some(var));
            if let Some((pos, _)) = local {
                return DefSites::from([Some(Loc::new(loc.block, pos))]);
            }
        }
        self.at_entry
            .get(&loc.block)
            .and_then(|m| m.get(var))
            .cloned()
            .unwrap_or_else(|| DefSites::from([None]))
    }
}

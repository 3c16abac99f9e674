//! Programs: blocks of commands connected into a graph

use super::cmd::Cmd;
use super::location::{BlockId, Loc};
use super::symbol::Var;
use crate::errors::{BytemapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Basic block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub cmds: Vec<Cmd>,
    pub succs: Vec<BlockId>,
}

impl Block {
    pub fn new(id: BlockId, cmds: Vec<Cmd>, succs: Vec<BlockId>) -> Self {
        Self { id, cmds, succs }
    }

    /// Commands paired with their locations
    pub fn located_cmds(&self) -> impl DoubleEndedIterator<Item = (Loc, &Cmd)> + '_ {
        self.cmds
            .iter()
            .enumerate()
            .map(move |(pos, cmd)| (Loc::new(self.id, pos), cmd))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    root: BlockId,
    blocks: BTreeMap<BlockId, Block>,
}

impl Program {
    /// Build a program, checking that the root and every successor exist
    pub fn new(root: BlockId, blocks: Vec<Block>) -> Result<Self> {
        let blocks: BTreeMap<_, _> = blocks.into_iter().map(|b| (b.id, b)).collect();
        if !blocks.contains_key(&root) {
            return Err(BytemapError::UnknownBlock(root));
        }
        for block in blocks.values() {
            if let Some(missing) = block.succs.iter().find(|s| !blocks.contains_key(s)) {
                return Err(BytemapError::UnknownBlock(*missing));
            }
        }
        Ok(Self { root, blocks })
    }

    /// A program made of a single block `b0`
    pub fn single_block(cmds: Vec<Cmd>) -> Self {
        let block = Block::new(0, cmds, vec![]);
        Self {
            root: 0,
            blocks: BTreeMap::from([(0, block)]),
        }
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.blocks.get(&id).ok_or(BytemapError::UnknownBlock(id))
    }

    pub fn cmd_at(&self, loc: Loc) -> Result<&Cmd> {
        self.blocks
            .get(&loc.block)
            .and_then(|b| b.cmds.get(loc.pos))
            .ok_or(BytemapError::UnknownLocation(loc))
    }

    pub fn contains(&self, loc: Loc) -> bool {
        self.cmd_at(loc).is_ok()
    }

    /// All commands in block order
    pub fn located_cmds(&self) -> impl Iterator<Item = (Loc, &Cmd)> {
        self.blocks.values().flat_map(Block::located_cmds)
    }

    pub fn cmd_count(&self) -> usize {
        self.blocks.values().map(|b| b.cmds.len()).sum()
    }

    /// Every variable mentioned anywhere
    pub fn vars(&self) -> BTreeSet<Var> {
        self.located_cmds().flat_map(|(_, cmd)| cmd.vars()).collect()
    }

    /// Same graph, new command lists
    pub(crate) fn with_cmds(&self, mut cmds: BTreeMap<BlockId, Vec<Cmd>>) -> Self {
        let blocks = self
            .blocks
            .values()
            .map(|b| {
                let new_cmds = cmds.remove(&b.id).unwrap_or_else(|| b.cmds.clone());
                (b.id, Block::new(b.id, new_cmds, b.succs.clone()))
            })
            .collect();
        Self {
            root: self.root,
            blocks,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Program = serde_json::from_str(json)?;
        Self::new(raw.root, raw.blocks.into_values().collect())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in self.blocks.values() {
            write!(f, "b{}", block.id)?;
            if block.id == self.root {
                write!(f, " (root)")?;
            }
            writeln!(f, ":")?;
            for (loc, cmd) in block.located_cmds() {
                writeln!(f, "  {:<8} {}", loc.to_string(), cmd)?;
            }
            if !block.succs.is_empty() {
                let succs: Vec<_> = block.succs.iter().map(|s| format!("b{}", s)).collect();
                writeln!(f, "  -> {}", succs.join(", "))?;
            }
        }
        Ok(())
    }
}

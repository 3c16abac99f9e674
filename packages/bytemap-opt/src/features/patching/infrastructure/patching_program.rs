//! Deferred edit buffer over a read-only program snapshot
//!
//! Edits are staged through `&self` while passes keep reading the original
//! program, then applied in one batch by `commit`.

use crate::errors::{BytemapError, Result};
use crate::features::patching::domain::{EditAction, LocEdits};
use crate::shared::models::{BlockId, Cmd, Loc, Program, Sort, Var};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct PatchingProgram<'p> {
    program: &'p Program,
    edits: DashMap<Loc, LocEdits>,
    prologues: Mutex<BTreeMap<BlockId, Vec<Cmd>>>,
    next_temp: AtomicUsize,
}

impl<'p> PatchingProgram<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            edits: DashMap::new(),
            prologues: Mutex::new(BTreeMap::new()),
            next_temp: AtomicUsize::new(first_free_temp_index(program)),
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    fn check(&self, loc: Loc) -> Result<()> {
        if self.program.contains(loc) {
            Ok(())
        } else {
            Err(BytemapError::UnknownLocation(loc))
        }
    }

    fn set_action(&self, loc: Loc, action: EditAction) -> Result<()> {
        self.check(loc)?;
        let mut slot = self.edits.entry(loc).or_default();
        if let Some(existing) = &slot.action {
            return if *existing == action {
                Ok(())
            } else {
                Err(BytemapError::ConflictingPatch(loc))
            };
        }
        slot.action = Some(action);
        Ok(())
    }

    pub fn delete(&self, loc: Loc) -> Result<()> {
        self.set_action(loc, EditAction::Delete)
    }

    pub fn replace(&self, loc: Loc, cmd: Cmd) -> Result<()> {
        self.set_action(loc, EditAction::Replace(cmd))
    }

    pub fn insert_before(&self, loc: Loc, cmds: Vec<Cmd>) -> Result<()> {
        self.check(loc)?;
        self.edits.entry(loc).or_default().before.extend(cmds);
        Ok(())
    }

    pub fn insert_after(&self, loc: Loc, cmds: Vec<Cmd>) -> Result<()> {
        self.check(loc)?;
        self.edits.entry(loc).or_default().after.extend(cmds);
        Ok(())
    }

    /// Commands placed at the very start of `block`, ahead of any `insert_before`
    pub fn prepend_to_block(&self, block: BlockId, cmds: Vec<Cmd>) -> Result<()> {
        self.program.block(block)?;
        self.prologues.lock().entry(block).or_default().extend(cmds);
        Ok(())
    }

    /// A variable name never used in the program nor handed out before
    pub fn new_temp_var(&self, prefix: &str, sort: Sort) -> Var {
        let n = self.next_temp.fetch_add(1, Ordering::Relaxed);
        Var::new(format!("{}!{}", prefix, n), sort)
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len() + self.prologues.lock().values().filter(|c| !c.is_empty()).count()
    }

    /// Apply every staged edit, producing a program with the same blocks and edges
    pub fn commit(self) -> Program {
        let mut prologues = self.prologues.into_inner();
        let mut edits: BTreeMap<Loc, LocEdits> = self.edits.into_iter().collect();
        let mut cmds = BTreeMap::new();

        for block in self.program.blocks() {
            let touched = prologues.contains_key(&block.id)
                || edits
                    .range(Loc::start_of(block.id)..)
                    .next()
                    .is_some_and(|(loc, _)| loc.block == block.id);
            if !touched {
                continue;
            }
            let mut out = prologues.remove(&block.id).unwrap_or_default();
            for (loc, cmd) in block.located_cmds() {
                match edits.remove(&loc) {
                    Some(slot) => slot.apply(cmd, &mut out),
                    None => out.push(cmd.clone()),
                }
            }
            cmds.insert(block.id, out);
        }

        tracing::trace!(blocks = cmds.len(), "committing patched blocks");
        self.program.with_cmds(cmds)
    }
}

/// One past the largest numeric `!n` suffix among the program's variable names
fn first_free_temp_index(program: &Program) -> usize {
    program
        .vars()
        .iter()
        .filter_map(|v| v.name.rsplit_once('!'))
        .filter_map(|(_, suffix)| suffix.parse::<usize>().ok())
        .max()
        .map_or(0, |n| n + 1)
}

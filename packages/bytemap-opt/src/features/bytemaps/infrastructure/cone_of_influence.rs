/*
 * Bytemap Cone of Influence
 *
 * Backward sweep deleting commands whose results are never observed.
 *
 * Ordinary variables are tracked as a `needed` set flowing backwards. Bytemaps
 * are tracked per definition site instead:
 * - `queries[def]`: the (load location, index term) pairs later loads may ask
 *   of the bytemap defined at `def`, carried back through copies, stores and
 *   long-copies
 * - `must_take`: definitions kept whatever they are asked, because some reader
 *   of them is not understood
 *
 * A store none of whose queries can match its index is turned into a copy of
 * its base, and a long-copy only read inside (or outside) the copied range
 * loses the side nobody reads.
 */

use crate::config::BytemapConfig;
use crate::errors::{BytemapError, Result};
use crate::features::bytemaps::domain::{PassOutput, Query, Term};
use crate::features::bytemaps::infrastructure::cmd_handler::{BytemapCmdHandler, LongCopy};
use crate::features::bytemaps::infrastructure::term_factory::TermFactory;
use crate::features::bytemaps::ports::Erasability;
use crate::features::data_flow::{backward_dag_dataflow, AnalysisCache};
use crate::features::intervals::{IntervalAnalysis, IntervalOracle};
use crate::features::patching::{PatchingProgram, RewriteStats};
use crate::shared::models::{Cmd, Expr, Loc, Program, Sort, Symbol, Var};
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};

pub struct BytemapConeOfInf<'a> {
    cache: &'a AnalysisCache<'a>,
    erasability: &'a dyn Erasability,
    destructive_annotations: bool,
    patch: PatchingProgram<'a>,
    tf: TermFactory<'a>,
    queries: BTreeMap<Loc, BTreeSet<Query>>,
    must_take: FxHashSet<Loc>,
    zero_map: Option<Var>,
    stats: RewriteStats,
}

impl<'a> BytemapConeOfInf<'a> {
    /// Run the pass on `program`, building the analyses it needs
    pub fn go(
        program: &Program,
        config: &BytemapConfig,
        erasability: &dyn Erasability,
    ) -> Result<PassOutput> {
        let cache = AnalysisCache::build(program)?;
        let intervals = if config.use_intervals {
            Some(IntervalAnalysis::new(&cache)?)
        } else {
            None
        };
        Self::go_with_oracle(
            &cache,
            intervals.as_ref().map(|i| i as &dyn IntervalOracle),
            erasability,
            config.destructive_annotations,
        )
    }

    /// Run the pass over prebuilt analyses
    pub fn go_with_oracle(
        cache: &AnalysisCache<'_>,
        oracle: Option<&dyn IntervalOracle>,
        erasability: &dyn Erasability,
        destructive_annotations: bool,
    ) -> Result<PassOutput> {
        BytemapConeOfInf {
            cache,
            erasability,
            destructive_annotations,
            patch: PatchingProgram::new(cache.program),
            tf: TermFactory::new(cache, oracle),
            queries: BTreeMap::new(),
            must_take: FxHashSet::default(),
            zero_map: None,
            stats: RewriteStats::new(),
        }
        .rewrite()
    }

    fn rewrite(mut self) -> Result<PassOutput> {
        self.calc_terms()?;
        self.remove_unneeded()?;

        tracing::info!(
            stats = %self.stats,
            must_take = self.must_take.len(),
            queried = self.queries.len(),
            "BytemapConeOfInf"
        );
        let stats = self.stats;
        let program = self.patch.commit();
        tracing::trace!("BytemapConeOfInf result:\n{}", program);
        Ok(PassOutput { program, stats })
    }

    /// Terms of every assignment's lhs. Loads get none, the inliner already
    /// resolved what could be.
    fn calc_terms(&self) -> Result<()> {
        for &block in self.cache.graph.topo_order() {
            for (loc, cmd) in self.cache.program.block(block)?.located_cmds() {
                if let Cmd::Assign { rhs, .. } = cmd {
                    if let Some(term) = self.tf.expr(loc, rhs) {
                        self.tf.set_lhs_term(loc, term);
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_unneeded(&mut self) -> Result<()> {
        let cache = self.cache;
        backward_dag_dataflow(cache.program, &cache.graph, |block, succs: Vec<&BTreeSet<Var>>| {
            let mut needed: BTreeSet<Var> = succs.into_iter().flatten().cloned().collect();
            for (loc, cmd) in block.located_cmds().rev() {
                needed = self.handle_cmd(loc, cmd, needed)?;
            }
            Ok(needed)
        })?;
        Ok(())
    }

    /// `needed` after `cmd` in, `needed` before it out
    fn handle_cmd(&mut self, loc: Loc, cmd: &Cmd, needed: BTreeSet<Var>) -> Result<BTreeSet<Var>> {
        // a long-copy command writes its destination map, so a preserved destination keeps it
        let erasable = cmd.lhs().is_none() || self.erasability.is_erasable(cmd);
        let mut step = ConeStep {
            pass: self,
            loc,
            cmd,
            erasable,
            new_needed: needed.clone(),
            needed,
        };
        step.handle(cmd)?;
        Ok(step.new_needed)
    }

    /// The all-zero bytemap, defined once at the start of the root block
    fn zero_map(&mut self) -> Result<Var> {
        if let Some(zero) = &self.zero_map {
            return Ok(zero.clone());
        }
        let zero = self.patch.new_temp_var("zero", Sort::ByteMap);
        let param = self.patch.new_temp_var("md", Sort::BIT256);
        self.patch.prepend_to_block(
            self.cache.program.root(),
            vec![Cmd::assign(&zero, Expr::map_def(param, Expr::num(0u64)))],
        )?;
        self.zero_map = Some(zero.clone());
        Ok(zero)
    }
}

/// Handling of a single command during the sweep
struct ConeStep<'s, 'a> {
    pass: &'s mut BytemapConeOfInf<'a>,
    loc: Loc,
    cmd: &'s Cmd,
    erasable: bool,
    needed: BTreeSet<Var>,
    new_needed: BTreeSet<Var>,
}

fn done() -> Result<Option<()>> {
    Ok(Some(()))
}

impl ConeStep<'_, '_> {
    fn is_must_take(&self) -> bool {
        self.pass.must_take.contains(&self.loc)
    }

    /// Whether the bytemap defined here is read at all
    fn are_queries(&self) -> bool {
        self.pass
            .queries
            .get(&self.loc)
            .is_some_and(|qs| !qs.is_empty())
            || self.is_must_take()
    }

    fn own_queries(&self) -> BTreeSet<Query> {
        self.pass.queries.get(&self.loc).cloned().unwrap_or_default()
    }

    fn defs_of(&self, base: &Var) -> Vec<Loc> {
        self.pass.cache.concrete_def_sites(base, self.loc)
    }

    fn mark_must_take(&mut self, base: &Var) {
        let defs = self.defs_of(base);
        self.pass.must_take.extend(defs);
    }

    /// A kept bytemap definition whose reads are not all visible as queries
    fn keeps_whole_map(&self) -> bool {
        self.is_must_take() || (!self.erasable && self.cmd.lhs().is_some_and(Var::is_bytemap))
    }

    /// Forward `queries` to the definitions of each of `bases`. A definition
    /// that must keep its whole map passes must-take on instead, even when
    /// nothing queries it.
    fn add_queries_to(&mut self, bases: &[&Var], queries: BTreeSet<Query>) {
        if self.keeps_whole_map() {
            for base in bases {
                self.mark_must_take(base);
            }
            return;
        }
        if queries.is_empty() {
            return;
        }
        for base in bases {
            for def in self.defs_of(base) {
                self.pass
                    .queries
                    .entry(def)
                    .or_default()
                    .extend(queries.iter().cloned());
            }
        }
    }

    fn add_needed(&mut self, syms: &[&Symbol]) {
        for sym in syms {
            if let Symbol::Var(v) = sym {
                self.new_needed.insert(v.clone());
            }
        }
    }

    /// Keeps everything the command reads: ordinary variables become needed,
    /// bytemaps must-take.
    fn blindly_add(&mut self) {
        if self.pass.destructive_annotations && matches!(self.cmd, Cmd::Annotation { .. }) {
            return;
        }
        for v in self.cmd.rhs_free_vars() {
            if v.is_bytemap() {
                self.mark_must_take(&v);
            } else {
                self.new_needed.insert(v);
            }
        }
    }

    fn delete(&mut self, stat: &'static str) -> Result<()> {
        tracing::debug!(loc = %self.loc, cmd = %self.cmd, stat, "deleting");
        self.pass.patch.delete(self.loc)?;
        self.pass.stats.bump(stat);
        Ok(())
    }

    fn replace(&mut self, new_cmd: Cmd, stat: &'static str) -> Result<()> {
        let self_assign = matches!(
            &new_cmd,
            Cmd::Assign { lhs, rhs } if rhs.as_var() == Some(lhs)
        );
        if self_assign && self.erasable {
            self.delete("lhs=rhs")?;
        } else {
            tracing::debug!(loc = %self.loc, from = %self.cmd, to = %new_cmd, stat, "replacing");
            self.pass.patch.replace(self.loc, new_cmd)?;
        }
        self.pass.stats.bump(stat);
        Ok(())
    }

    fn term_of(&self, sym: &Symbol) -> Option<Term> {
        self.pass.tf.rhs_term(self.loc, sym)
    }
}

impl BytemapCmdHandler for ConeStep<'_, '_> {
    type Output = ();

    fn copy(&mut self, _lhs: &Var, rhs: &Var) -> Result<Option<()>> {
        if !self.are_queries() && self.erasable {
            self.delete("simple")?;
        } else {
            let queries = self.own_queries();
            self.add_queries_to(&[rhs], queries);
        }
        done()
    }

    fn ite(&mut self, _lhs: &Var, cond: &Symbol, then: &Var, els: &Var) -> Result<Option<()>> {
        if !self.are_queries() && self.erasable {
            self.delete("ite")?;
        } else {
            let queries = self.own_queries();
            self.add_queries_to(&[then, els], queries);
            self.add_needed(&[cond]);
        }
        done()
    }

    fn load(&mut self, lhs: &Var, base: &Var, loc: &Symbol) -> Result<Option<()>> {
        if !self.needed.contains(lhs) && self.erasable {
            self.delete("load")?;
            return done();
        }
        match self.term_of(loc) {
            Some(term) => {
                let query = Query::new(self.loc, term);
                self.add_queries_to(&[base], BTreeSet::from([query]));
            }
            None => self.mark_must_take(base),
        }
        self.new_needed.remove(lhs);
        self.add_needed(&[loc]);
        done()
    }

    fn store_single(
        &mut self,
        _lhs: &Var,
        _base: &Var,
        loc: &Symbol,
        value: &Symbol,
    ) -> Result<Option<()>> {
        if !self.are_queries() && self.erasable {
            self.delete("single_store")?;
        } else {
            self.blindly_add();
            self.add_needed(&[loc, value]);
        }
        done()
    }

    fn store(&mut self, lhs: &Var, base: &Var, loc: &Symbol, value: &Symbol) -> Result<Option<()>> {
        if self.is_must_take() || !self.erasable {
            let queries = self.own_queries();
            self.add_queries_to(&[base], queries);
            self.add_needed(&[loc, value]);
            return done();
        }

        let loc_term = self.term_of(loc);
        // some query may read the stored value
        let mut may_match = false;
        // queries that may read past the store
        let mut not_matching = BTreeSet::new();
        for query in self.own_queries() {
            let equal = match &loc_term {
                Some(t) => self.pass.tf.are_equal(self.loc, t, query.loc, &query.term)?,
                None => None,
            };
            match equal {
                Some(true) => may_match = true,
                Some(false) => {
                    not_matching.insert(query);
                }
                None => {
                    may_match = true;
                    not_matching.insert(query);
                }
            }
        }

        if !not_matching.is_empty() {
            self.add_queries_to(&[base], not_matching);
            if may_match {
                self.add_needed(&[loc, value]);
            } else {
                self.replace(Cmd::assign(lhs, base), "store->assign")?;
            }
        } else if may_match {
            // every query reads the stored value, the base is not needed
            self.add_needed(&[loc, value]);
        } else {
            self.delete("store")?;
        }
        done()
    }

    fn long_copy(&mut self, copy: &LongCopy<'_>) -> Result<Option<()>> {
        if self.is_must_take() {
            self.blindly_add();
            return done();
        }
        let terms = (
            self.term_of(copy.length),
            self.term_of(copy.src_offset),
            self.term_of(copy.dst_offset),
        );
        let (Some(length), Some(src_off), Some(dst_off)) = terms else {
            self.blindly_add();
            return done();
        };
        let dst_end = &dst_off + &length;

        let mut src = BTreeSet::new();
        let mut dst = BTreeSet::new();
        for query in self.own_queries() {
            let inside =
                self.pass
                    .tf
                    .is_inside(query.loc, &query.term, self.loc, &dst_off, &dst_end)?;
            match inside {
                Some(true) => {
                    src.insert(query);
                }
                Some(false) => {
                    dst.insert(query);
                }
                None => {
                    src.insert(query.clone());
                    dst.insert(query);
                }
            }
        }

        let (src_empty, dst_empty) = (src.is_empty(), dst.is_empty());
        let shift = &src_off - &dst_off;
        self.add_queries_to(&[copy.dst_map], dst);
        self.add_queries_to(
            &[copy.src_map],
            src.iter().map(|q| q.shift(&shift)).collect(),
        );

        let operands = [copy.src_offset, copy.dst_offset, copy.length];
        if !self.erasable {
            self.add_needed(&operands);
        } else if src_empty && dst_empty {
            self.delete("longstore")?;
        } else if src_empty {
            self.replace(Cmd::assign(copy.lhs, copy.dst_map), "longstore->assign")?;
        } else if dst_empty {
            let zero = self.pass.zero_map()?;
            let src_only = Expr::long_store(
                &zero,
                copy.dst_offset.clone(),
                copy.src_map,
                copy.src_offset.clone(),
                copy.length.clone(),
            );
            self.replace(Cmd::assign(copy.lhs, src_only), "longstore->src_only")?;
            self.add_needed(&operands);
        } else {
            self.add_needed(&operands);
        }
        done()
    }

    fn map_def(&mut self, _lhs: &Var, _param: &Var, _body: &Expr) -> Result<Option<()>> {
        if self.are_queries() || !self.erasable {
            self.blindly_add();
        } else {
            self.delete("map_def")?;
        }
        done()
    }

    fn havoc(&mut self, _lhs: &Var) -> Result<Option<()>> {
        if !self.are_queries() && self.erasable {
            self.delete("havoc")?;
        }
        done()
    }

    fn fallthrough(&mut self) -> Result<Option<()>> {
        let cmd = self.cmd;
        match cmd.lhs() {
            Some(lhs) if lhs.is_bytemap() => {
                if self.are_queries() || !self.erasable {
                    return Err(BytemapError::UnexpectedBytemapAssignment(cmd.to_string()));
                }
                self.delete("other")?;
            }
            Some(lhs) if !self.needed.contains(lhs) && self.erasable => self.delete("other")?,
            lhs => {
                if let Some(lhs) = lhs {
                    self.new_needed.remove(lhs);
                }
                // bytemaps read here are inside something not understood,
                // e.g. a quantified expression
                self.blindly_add();
            }
        }
        done()
    }
}

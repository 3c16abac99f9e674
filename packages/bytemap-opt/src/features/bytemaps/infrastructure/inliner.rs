/*
 * Bytemap Inliner
 *
 * Forward sweep doing two things at once:
 * - Value numbering: every word assignment gets a linear term, and a
 *   right-hand side is replaced by a constant, by a variable already holding
 *   the same term, or by a `var + const` form of its term
 * - Load resolution: a load walks back along the store chain of its bytemap
 *   looking for a store whose index surely equals the load index
 *
 * Representatives are kept per term and intersected at joins, so a variable
 * is only reused when it holds the term on every path.
 */

use crate::config::BytemapConfig;
use crate::errors::{BytemapError, Result};
use crate::features::bytemaps::domain::{PassOutput, Query, Term};
use crate::features::bytemaps::infrastructure::cmd_handler::{BytemapCmdHandler, LongCopy};
use crate::features::bytemaps::infrastructure::term_factory::{same_value, TermFactory};
use crate::features::bytemaps::ports::Erasability;
use crate::features::data_flow::{concrete_sites, forward_dag_dataflow, AnalysisCache};
use crate::features::intervals::{IntervalAnalysis, IntervalOracle};
use crate::features::patching::{PatchingProgram, RewriteStats};
use crate::shared::models::{Block, Cmd, Expr, Loc, Program, Sort, Symbol, Var};
use primitive_types::U256;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};

/// Variables known to hold each term
type Reps = BTreeMap<Term, BTreeSet<Var>>;

fn intersect(ins: Vec<&Reps>) -> Reps {
    let mut ins = ins.into_iter();
    let Some(first) = ins.next() else {
        return Reps::new();
    };
    let mut reps = first.clone();
    for other in ins {
        reps = reps
            .into_iter()
            .filter_map(|(term, vars)| {
                let common: BTreeSet<Var> = other.get(&term)?.intersection(&vars).cloned().collect();
                (!common.is_empty()).then_some((term, common))
            })
            .collect();
    }
    reps
}

pub struct BytemapInliner<'a> {
    cache: &'a AnalysisCache<'a>,
    erasability: &'a dyn Erasability,
    patch: PatchingProgram<'a>,
    tf: TermFactory<'a>,
    stats: RewriteStats,
}

impl<'a> BytemapInliner<'a> {
    /// Run the pass on `program`. Cheap mode goes without intervals.
    pub fn go(
        program: &Program,
        config: &BytemapConfig,
        erasability: &dyn Erasability,
    ) -> Result<PassOutput> {
        let cache = AnalysisCache::build(program)?;
        let intervals = if config.use_intervals && !config.cheap {
            Some(IntervalAnalysis::new(&cache)?)
        } else {
            None
        };
        Self::go_with_oracle(
            &cache,
            intervals.as_ref().map(|i| i as &dyn IntervalOracle),
            erasability,
        )
    }

    pub fn go_with_oracle(
        cache: &AnalysisCache<'_>,
        oracle: Option<&dyn IntervalOracle>,
        erasability: &dyn Erasability,
    ) -> Result<PassOutput> {
        BytemapInliner {
            cache,
            erasability,
            patch: PatchingProgram::new(cache.program),
            tf: TermFactory::new(cache, oracle),
            stats: RewriteStats::new(),
        }
        .rewrite()
    }

    fn rewrite(mut self) -> Result<PassOutput> {
        let cache = self.cache;
        forward_dag_dataflow(cache.program, &cache.graph, |block, ins: Vec<&Reps>| {
            self.handle_block(block, intersect(ins))
        })?;

        tracing::info!(stats = %self.stats, oracle = self.tf.has_oracle(), "BytemapInliner");
        let stats = self.stats;
        let program = self.patch.commit();
        tracing::trace!("BytemapInliner result:\n{}", program);
        Ok(PassOutput { program, stats })
    }

    fn handle_block(&mut self, block: &Block, mut reps: Reps) -> Result<Reps> {
        for (loc, cmd) in block.located_cmds() {
            let Some(lhs) = cmd.lhs() else {
                continue;
            };
            let new_term = RhsTerm { pass: self, loc }.handle(cmd)?;
            if let Some(term) = &new_term {
                self.tf.set_lhs_term(loc, term.clone());
            }

            // terms are mod 2^256, only 256-bit words can stand for them
            if lhs.sort != Sort::BIT256 || !self.erasability.is_inlineable(lhs) {
                continue;
            }
            if let Some(term) = &new_term {
                if let Some((new_rhs, stat)) = self.new_rhs(loc, cmd, term, &reps)? {
                    self.rewrite_rhs(loc, cmd, lhs, new_rhs, stat)?;
                }
            }

            // `lhs` no longer holds the term it was a representative of. It can
            // only have been one for the term at its (single) reaching def.
            let old_term = self
                .cache
                .concrete_def_sites(lhs, loc)
                .first()
                .and_then(|def| self.tf.lhs_term(*def));
            if let Some(old_term) = old_term {
                if let Some(vars) = reps.get_mut(&old_term) {
                    vars.remove(lhs);
                    if vars.is_empty() {
                        reps.remove(&old_term);
                    }
                }
            }
            if let Some(term) = new_term {
                reps.entry(term).or_default().insert(lhs.clone());
            }
        }
        Ok(reps)
    }

    fn new_rhs(
        &mut self,
        loc: Loc,
        cmd: &Cmd,
        term: &Term,
        reps: &Reps,
    ) -> Result<Option<(Expr, &'static str)>> {
        let old_rhs = match cmd {
            Cmd::Assign { rhs, .. } => Some(rhs),
            _ => None,
        };
        if old_rhs.is_some_and(Expr::is_const) {
            return Ok(None);
        }
        if let Some(c) = term.as_const() {
            return Ok(Some((Expr::num(c), "const")));
        }
        if old_rhs.is_some_and(Expr::is_var) {
            return Ok(None);
        }
        // the greatest, for determinism
        if let Some(rep) = reps.get(term).and_then(|vars| vars.last()) {
            return Ok(Some((Expr::from(rep), "rep")));
        }
        // `x + c` only replaces something more complicated
        if term.is_var() || (term.support_len() == 1 && old_rhs.is_none()) {
            return Ok(self.to_expr(loc, term)?.map(|e| (e, "term")));
        }
        Ok(None)
    }

    fn rewrite_rhs(
        &mut self,
        loc: Loc,
        cmd: &Cmd,
        lhs: &Var,
        new_rhs: Expr,
        stat: &'static str,
    ) -> Result<()> {
        if new_rhs.as_var() == Some(lhs) && self.erasability.is_erasable(cmd) {
            tracing::debug!(%loc, %cmd, "deleting self assignment");
            self.patch.delete(loc)?;
            self.stats.bump("lhs=rhs");
        } else {
            let new_cmd = Cmd::assign(lhs, new_rhs);
            tracing::debug!(%loc, from = %cmd, to = %new_cmd, stat, "inlining");
            self.patch.replace(loc, new_cmd)?;
        }
        self.stats.bump(stat);
        Ok(())
    }

    /// `v` or `v + c` evaluating to `term` at `loc`, or `None` for anything
    /// more complicated.
    ///
    /// When `v` was reassigned on the way to `loc`, its old value is copied
    /// into a fresh `bypass` variable right after each of its definitions.
    fn to_expr(&mut self, loc: Loc, term: &Term) -> Result<Option<Expr>> {
        if let Some(c) = term.as_const() {
            return Ok(Some(Expr::num(c)));
        }
        let mut lits = term.literals();
        let (Some((u, coef)), None) = (lits.next(), lits.next()) else {
            return Ok(None);
        };
        if coef != U256::one() {
            return Ok(None);
        }

        let current = self.cache.def_sites(&u.var, loc);
        let var_expr = if u.defs.is_superset(&current) {
            Expr::from(&u.var)
        } else {
            let temp = self.patch.new_temp_var("bypass", u.var.sort);
            let copy = vec![Cmd::assign(&temp, &u.var)];
            for def in u.defs.iter() {
                match def {
                    Some(def) => self.patch.insert_after(*def, copy.clone())?,
                    None => self
                        .patch
                        .prepend_to_block(self.cache.program.root(), copy.clone())?,
                }
            }
            tracing::debug!(var = %u.var, %temp, "bypassing reassigned variable");
            self.stats.bump("bypass");
            Expr::from(&temp)
        };

        Ok(Some(if term.c().is_zero() {
            var_expr
        } else {
            Expr::add(var_expr, Expr::num(term.c()))
        }))
    }
}

/// Term of the right-hand side of one command, resolving loads through the
/// store chain
struct RhsTerm<'s, 'a> {
    pass: &'s BytemapInliner<'a>,
    loc: Loc,
}

impl BytemapCmdHandler for RhsTerm<'_, '_> {
    type Output = Term;

    fn load(&mut self, _lhs: &Var, base: &Var, loc: &Symbol) -> Result<Option<Term>> {
        let tf = &self.pass.tf;
        let Some(index) = tf.rhs_term(self.loc, loc) else {
            return Ok(None);
        };
        let query = Query::new(self.loc, index);
        let Some(defs) = concrete_sites(&self.pass.cache.def_sites(base, self.loc)) else {
            return Ok(None);
        };

        let mut walk = StoreChainWalk::new(self.pass.cache, tf);
        let mut results = Vec::with_capacity(defs.len());
        for def in defs {
            results.push(walk.resolve(def, query.clone())?);
        }
        let resolved = same_value(results.into_iter());
        if let Some(term) = &resolved {
            tracing::debug!(loc = %self.loc, %term, "load resolved");
        }
        Ok(resolved)
    }

    fn fallthrough(&mut self) -> Result<Option<Term>> {
        let cmd = self.pass.cache.program.cmd_at(self.loc)?;
        Ok(match cmd {
            Cmd::Assign { rhs, .. } => self.pass.tf.expr(self.loc, rhs),
            _ => None,
        })
    }
}

/// Outcome of looking at one bytemap definition
enum Step {
    Done(Option<Term>),
    /// Ask the same of these definitions, the answer is theirs if they agree
    Continue(Vec<(Loc, Query)>),
}

/// What the bytemap defined at `at` holds at the index of `query`
struct ChainStep<'s, 'a> {
    cache: &'s AnalysisCache<'a>,
    tf: &'s TermFactory<'a>,
    at: Loc,
    query: &'s Query,
}

impl ChainStep<'_, '_> {
    /// Continue into the definitions of `base` reaching `at`. Nothing is known
    /// of a bytemap coming from the function entry.
    fn nexts_into(&self, base: &Var, query: Query) -> Option<Vec<(Loc, Query)>> {
        let defs = concrete_sites(&self.cache.def_sites(base, self.at))?;
        Some(defs.into_iter().map(|def| (def, query.clone())).collect())
    }

    fn continue_into(&self, base: &Var, query: Query) -> Step {
        self.nexts_into(base, query).map_or(Step::Done(None), Step::Continue)
    }

    fn term(&self, sym: &Symbol) -> Option<Term> {
        self.tf.rhs_term(self.at, sym)
    }
}

impl BytemapCmdHandler for ChainStep<'_, '_> {
    type Output = Step;

    fn copy(&mut self, _lhs: &Var, rhs: &Var) -> Result<Option<Step>> {
        Ok(Some(self.continue_into(rhs, self.query.clone())))
    }

    fn ite(&mut self, _lhs: &Var, cond: &Symbol, then: &Var, els: &Var) -> Result<Option<Step>> {
        let step = match cond.as_const() {
            Some(c) if c.is_zero() => self.continue_into(els, self.query.clone()),
            Some(_) => self.continue_into(then, self.query.clone()),
            None => match (
                self.nexts_into(then, self.query.clone()),
                self.nexts_into(els, self.query.clone()),
            ) {
                (Some(mut nexts), Some(more)) => {
                    nexts.extend(more);
                    Step::Continue(nexts)
                }
                _ => Step::Done(None),
            },
        };
        Ok(Some(step))
    }

    fn store(&mut self, _lhs: &Var, base: &Var, loc: &Symbol, value: &Symbol) -> Result<Option<Step>> {
        let Some(loc_term) = self.term(loc) else {
            return Ok(Some(Step::Done(None)));
        };
        let step = match self
            .tf
            .are_equal(self.at, &loc_term, self.query.loc, &self.query.term)?
        {
            Some(true) => Step::Done(self.term(value)),
            Some(false) => self.continue_into(base, self.query.clone()),
            None => Step::Done(None),
        };
        Ok(Some(step))
    }

    fn long_copy(&mut self, copy: &LongCopy<'_>) -> Result<Option<Step>> {
        let Some(length) = self.term(copy.length) else {
            return Ok(Some(Step::Done(None)));
        };
        if length.as_const() == Some(U256::zero()) {
            return Ok(Some(self.continue_into(copy.dst_map, self.query.clone())));
        }
        let (Some(src_off), Some(dst_off)) = (self.term(copy.src_offset), self.term(copy.dst_offset))
        else {
            return Ok(Some(Step::Done(None)));
        };
        let dst_end = &dst_off + &length;
        let inside =
            self.tf
                .is_inside(self.query.loc, &self.query.term, self.at, &dst_off, &dst_end)?;
        let step = match inside {
            Some(true) => {
                let shifted = self.query.shift(&(&src_off - &dst_off));
                self.continue_into(copy.src_map, shifted)
            }
            Some(false) => self.continue_into(copy.dst_map, self.query.clone()),
            None => Step::Done(None),
        };
        Ok(Some(step))
    }

    fn map_def(&mut self, _lhs: &Var, _param: &Var, body: &Expr) -> Result<Option<Step>> {
        Ok(Some(Step::Done(body.as_const().map(Term::constant))))
    }

    fn fallthrough(&mut self) -> Result<Option<Step>> {
        Ok(Some(Step::Done(None)))
    }
}

enum Frame {
    Enter(Loc, Query),
    /// All of `nexts` are resolved, combine them
    Exit(Loc, Query, Vec<(Loc, Query)>),
}

/// Memoized walk back along store chains, on an explicit stack.
///
/// Lives for a single load, so its tables stay small.
struct StoreChainWalk<'s, 'a> {
    cache: &'s AnalysisCache<'a>,
    tf: &'s TermFactory<'a>,
    memo: FxHashMap<(Loc, Query), Option<Term>>,
    in_progress: FxHashSet<(Loc, Query)>,
}

impl<'s, 'a> StoreChainWalk<'s, 'a> {
    fn new(cache: &'s AnalysisCache<'a>, tf: &'s TermFactory<'a>) -> Self {
        Self {
            cache,
            tf,
            memo: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    fn step(&self, at: Loc, query: &Query) -> Result<Step> {
        let cmd = self.cache.program.cmd_at(at)?;
        let mut step = ChainStep {
            cache: self.cache,
            tf: self.tf,
            at,
            query,
        };
        Ok(step.handle(cmd)?.unwrap_or(Step::Done(None)))
    }

    /// Value the bytemap defined at `at` holds at `query`
    fn resolve(&mut self, at: Loc, query: Query) -> Result<Option<Term>> {
        let root = (at, query);
        let mut stack = vec![Frame::Enter(root.0, root.1.clone())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(at, query) => {
                    let key = (at, query);
                    if self.memo.contains_key(&key) {
                        continue;
                    }
                    // only a descendant of `key` can be above its exit frame
                    if !self.in_progress.insert(key.clone()) {
                        return Err(BytemapError::StoreChainCycle(at));
                    }
                    match self.step(at, &key.1)? {
                        Step::Done(term) => {
                            self.in_progress.remove(&key);
                            self.memo.insert(key, term);
                        }
                        Step::Continue(mut nexts) => {
                            nexts.sort();
                            nexts.dedup();
                            let pending: Vec<Frame> = nexts
                                .iter()
                                .filter(|next| !self.memo.contains_key(*next))
                                .map(|(l, q)| Frame::Enter(*l, q.clone()))
                                .collect();
                            stack.push(Frame::Exit(key.0, key.1, nexts));
                            stack.extend(pending);
                        }
                    }
                }
                Frame::Exit(at, query, nexts) => {
                    let term = same_value(
                        nexts
                            .iter()
                            .map(|next| self.memo.get(next).cloned().flatten()),
                    );
                    let key = (at, query);
                    self.in_progress.remove(&key);
                    self.memo.insert(key, term);
                }
            }
        }

        Ok(self.memo.get(&root).cloned().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::features::bytemaps::ports::{EraseAll, PreservedVars};
    use crate::shared::models::{BinaryOp, NaryOp};

    fn n(x: u64) -> U256 {
        U256::from(x)
    }

    fn observe(x: &Var) -> Cmd {
        Cmd::Annotation {
            label: "observe".to_string(),
            syms: vec![x.sym()],
        }
    }

    fn store(map: &Var, loc: impl Into<Expr>, value: impl Into<Expr>) -> Cmd {
        Cmd::assign(map, Expr::store(map, loc, value))
    }

    fn const_map(map: &Var, value: u64) -> Cmd {
        Cmd::assign(map, Expr::map_def(Var::bits256("k"), Expr::num(value)))
    }

    fn inline(program: &Program) -> Program {
        BytemapInliner::go(program, &BytemapConfig::default(), &EraseAll)
            .unwrap()
            .program
    }

    /// Rhs of the assignment at `loc` after inlining
    fn rhs_at(program: &Program, loc: Loc) -> Expr {
        match inline(program).cmd_at(loc).unwrap() {
            Cmd::Assign { rhs, .. } => rhs.clone(),
            other => panic!("not an assignment: {}", other),
        }
    }

    /// root -> {b1, b2} -> b3
    fn diamond(b0: Vec<Cmd>, b1: Vec<Cmd>, b2: Vec<Cmd>, b3: Vec<Cmd>) -> Program {
        Program::new(
            0,
            vec![
                Block::new(0, b0, vec![1, 2]),
                Block::new(1, b1, vec![3]),
                Block::new(2, b2, vec![3]),
                Block::new(3, b3, vec![]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_constant() {
        let (a, b, c) = (Var::bits256("a"), Var::bits256("b"), Var::bits256("c"));
        let program = Program::single_block(vec![
            Cmd::assign(&b, Expr::add(&a, Expr::num(3u64))),
            Cmd::assign(&c, Expr::sub(&b, &a)),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 1)), Expr::num(3u64));
    }

    #[test]
    fn test_load_through_store_to_representative() {
        let (a, b, c) = (Var::bits256("a"), Var::bits256("b"), Var::bits256("c"));
        let m = Var::bytemap("m");
        let program = Program::single_block(vec![
            Cmd::assign(&b, Expr::add(&a, Expr::num(3u64))),
            store(&m, &b, &b),
            Cmd::assign(&c, Expr::select(&m, &b)),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 2)), Expr::from(&b));
    }

    #[test]
    fn test_simple_var() {
        let (a, b, c) = (Var::bits256("a"), Var::bits256("b"), Var::bits256("c"));
        let program = Program::single_block(vec![
            Cmd::havoc(&a),
            Cmd::assign(&b, Expr::add(&a, Expr::num(3u64))),
            Cmd::assign(&c, Expr::sub(&b, Expr::num(3u64))),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 2)), Expr::from(&a));
    }

    #[test]
    fn test_load_through_copy() {
        let (b, c) = (Var::bits256("b"), Var::bits256("c"));
        let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
        let program = Program::single_block(vec![
            const_map(&m1, 0),
            store(&m1, Expr::num(0x12au64), &b),
            Cmd::assign(&m2, &m1),
            Cmd::assign(&c, Expr::select(&m2, Expr::num(0x12au64))),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 3)), Expr::from(&b));
    }

    #[test]
    fn test_load_of_stored_representative() {
        let (a, b, c) = (Var::bits256("a"), Var::bits256("b"), Var::bits256("c"));
        let m = Var::bytemap("m");
        let program = Program::single_block(vec![
            const_map(&m, 0),
            Cmd::assign(&b, Expr::add(&a, Expr::num(1u64))),
            store(&m, Expr::num(0x12au64), &b),
            Cmd::assign(&c, Expr::select(&m, Expr::num(0x12au64))),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 3)), Expr::from(&b));
    }

    #[test]
    fn test_map_definition() {
        let (b, c) = (Var::bits256("b"), Var::bits256("c"));
        let m = Var::bytemap("m");
        let program = Program::single_block(vec![
            const_map(&m, 1),
            Cmd::assign(&c, Expr::select(&m, &b)),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 1)), Expr::num(1u64));
    }

    #[test]
    fn test_long_store() {
        let b = Var::bits256("b");
        let (m1, m2, m3) = (Var::bytemap("m1"), Var::bytemap("m2"), Var::bytemap("m3"));
        let queries = [2u64, 9, 10, 39, 40, 50, 15];
        let mut cmds = vec![
            const_map(&m1, 1),
            const_map(&m2, 2),
            store(&m2, Expr::num(25u64), Expr::num(3u64)),
            Cmd::assign(
                &m3,
                Expr::long_store(&m1, Expr::num(10u64), &m2, Expr::num(20u64), Expr::num(30u64)),
            ),
        ];
        cmds.extend(
            queries
                .iter()
                .map(|q| Cmd::assign(&b, Expr::select(&m3, Expr::num(*q)))),
        );
        let program = Program::single_block(cmds);

        let out = inline(&program);
        let rhs: Vec<Expr> = (4..11)
            .map(|pos| match out.cmd_at(Loc::new(0, pos)).unwrap() {
                Cmd::Assign { rhs, .. } => rhs.clone(),
                other => panic!("not an assignment: {}", other),
            })
            .collect();
        let expected: Vec<Expr> = [1u64, 1, 2, 2, 1, 1, 3].into_iter().map(Expr::num).collect();
        assert_eq!(rhs, expected);
    }

    #[test]
    fn test_long_store_needs_intervals() {
        let b = Var::bits256("b");
        let (m1, m2, m3) = (Var::bytemap("m1"), Var::bytemap("m2"), Var::bytemap("m3"));
        let program = Program::single_block(vec![
            const_map(&m1, 1),
            const_map(&m2, 2),
            Cmd::assign(
                &m3,
                Expr::long_store(&m1, Expr::num(10u64), &m2, Expr::num(20u64), Expr::num(30u64)),
            ),
            Cmd::assign(&b, Expr::select(&m3, Expr::num(2u64))),
        ]);
        let cheap = BytemapConfig::preset(Preset::Cheap);
        let out = BytemapInliner::go(&program, &cheap, &EraseAll).unwrap();
        assert_eq!(out.program, program);
    }

    #[test]
    fn test_control_flow() {
        let (c, d) = (Var::bits256("c"), Var::bits256("d"));
        let m = Var::bytemap("m");
        let program = diamond(
            vec![const_map(&m, 0)],
            vec![Cmd::assign(&c, Expr::select(&m, Expr::num(1u64)))],
            vec![Cmd::assign(&c, Expr::select(&m, Expr::num(3u64)))],
            vec![Cmd::assign(&d, Expr::add(&c, Expr::num(1u64)))],
        );
        assert_eq!(rhs_at(&program, Loc::new(3, 0)), Expr::num(1u64));
    }

    #[test]
    fn test_dont_miss() {
        let (c, d) = (Var::bits256("c"), Var::bits256("d"));
        let i = Var::int("i");
        let m = Var::bytemap("m");
        let program = Program::single_block(vec![
            const_map(&m, 0),
            store(&m, Expr::num(0x100u64), Expr::num(3u64)),
            Cmd::Assume(Expr::land(vec![
                Expr::binary(BinaryOp::Ge, &i, Expr::konst(n(0), Sort::Int)),
                Expr::binary(BinaryOp::Le, &i, Expr::konst(n(0xfffff), Sort::Int)),
            ])),
            Cmd::assign(
                &c,
                Expr::add(
                    Expr::num(0x200u64),
                    Expr::narrow(Expr::int_mul(Expr::konst(n(32), Sort::Int), &i)),
                ),
            ),
            Cmd::assign(&d, Expr::select(&m, &c)),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 4)), Expr::num(0u64));
    }

    #[test]
    fn test_overridden_def_is_bypassed() {
        let (a, b) = (Var::bits256("a"), Var::bits256("b"));
        let m = Var::bytemap("m");
        let program = diamond(
            vec![const_map(&m, 0)],
            vec![Cmd::assign(&a, Expr::num(1u64))],
            vec![Cmd::assign(&a, Expr::num(2u64))],
            vec![
                store(&m, Expr::num(100u64), &a),
                Cmd::assign(&a, Expr::num(4u64)),
                Cmd::assign(&b, Expr::select(&m, Expr::num(100u64))),
            ],
        );

        let out = inline(&program);
        let bypass = Var::bits256("bypass!0");
        assert_eq!(
            out.block(3).unwrap().cmds[2],
            Cmd::assign(&b, &bypass)
        );
        for block in [1, 2] {
            assert_eq!(out.block(block).unwrap().cmds[1], Cmd::assign(&bypass, &a));
        }
    }

    #[test]
    fn test_int_stuff() {
        let (b, c) = (Var::bits256("b"), Var::bits256("c"));
        let i = Var::int("i");
        let program = Program::single_block(vec![
            Cmd::Assume(Expr::land(vec![
                Expr::binary(BinaryOp::Ge, &i, Expr::konst(n(0), Sort::Int)),
                Expr::binary(BinaryOp::Le, &i, Expr::konst(n(0xfffff), Sort::Int)),
            ])),
            Cmd::assign(&b, Expr::narrow(&i)),
            Cmd::assign(&c, &b),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 2)), Expr::from(&b));
    }

    #[test]
    fn test_int_sum_is_left_alone() {
        let (a, b, c) = (Var::bits256("a"), Var::bits256("b"), Var::bits256("c"));
        let i = Var::int("i");
        let program = Program::single_block(vec![
            Cmd::assign(&i, Expr::int_add(&a, &b)),
            Cmd::Assume(Expr::binary(BinaryOp::Le, &i, Expr::num(U256::MAX))),
            Cmd::assign(&c, Expr::narrow(&i)),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 2)), Expr::narrow(&i));
    }

    #[test]
    fn test_understand_branching() {
        let (a, e) = (Var::bits256("a"), Var::bits256("e"));
        let m = Var::bytemap("m");
        let program = diamond(
            vec![const_map(&m, 0)],
            vec![
                Cmd::assign(&a, Expr::num(200u64)),
                store(&m, Expr::num(100u64), Expr::num(1u64)),
            ],
            vec![
                Cmd::assign(&a, Expr::num(100u64)),
                store(&m, Expr::num(200u64), Expr::num(2u64)),
            ],
            vec![Cmd::assign(&e, Expr::select(&m, &a))],
        );
        assert_eq!(rhs_at(&program, Loc::new(3, 0)), Expr::num(0u64));
    }

    #[test]
    fn test_reassigned_index_is_not_resolved() {
        // b0: a := 200 -> {b1, b2}; b1: m[100] := 1; a := 100 -> b2; b2: e := m[a]
        let (a, e) = (Var::bits256("a"), Var::bits256("e"));
        let m = Var::bytemap("m");
        let program = Program::new(
            0,
            vec![
                Block::new(0, vec![const_map(&m, 0), Cmd::assign(&a, Expr::num(200u64))], vec![1, 2]),
                Block::new(
                    1,
                    vec![
                        store(&m, Expr::num(100u64), Expr::num(1u64)),
                        Cmd::assign(&a, Expr::num(100u64)),
                    ],
                    vec![2],
                ),
                Block::new(2, vec![Cmd::assign(&e, Expr::select(&m, &a))], vec![]),
            ],
        )
        .unwrap();
        assert_eq!(rhs_at(&program, Loc::new(2, 0)), Expr::select(&m, &a));
    }

    #[test]
    fn test_havoced_map_is_not_resolved() {
        let (a, b, c) = (Var::bits256("a"), Var::bits256("b"), Var::bits256("c"));
        let m = Var::bytemap("m");
        let times32 = Expr::mul(&a, Expr::num(32u64));
        let program = Program::single_block(vec![
            Cmd::havoc(&m),
            Cmd::assign(&c, times32.clone()),
            Cmd::assign(&a, Expr::select(&m, Expr::num(100u64))),
            Cmd::assign(&b, times32.clone()),
        ]);
        assert_eq!(rhs_at(&program, Loc::new(0, 3)), times32);
    }

    #[test]
    fn test_calculate_consts() {
        let (a, b, c, d) = (
            Var::bits256("a"),
            Var::bits256("b"),
            Var::bits256("c"),
            Var::bits256("d"),
        );
        let program = Program::single_block(vec![
            Cmd::assign(&a, &b),
            Cmd::assign(&c, Expr::sub(&a, &b)),
            Cmd::assign(&d, Expr::binary(BinaryOp::Exp, Expr::num(3u64), &c)),
        ]);
        let out = inline(&program);
        assert_eq!(out.block(0).unwrap().cmds[1], Cmd::assign(&c, Expr::num(0u64)));
        assert_eq!(out.block(0).unwrap().cmds[2], Cmd::assign(&d, Expr::num(1u64)));
    }

    #[test]
    fn test_ite_branches_must_agree() {
        let (x, y) = (Var::bits256("x"), Var::bits256("y"));
        let p = Var::boolean("p");
        let (m1, m2, m3) = (Var::bytemap("m1"), Var::bytemap("m2"), Var::bytemap("m3"));
        let program = Program::single_block(vec![
            Cmd::havoc(&p),
            const_map(&m1, 7),
            const_map(&m2, 7),
            Cmd::assign(&m3, Expr::ite(&p, &m1, &m2)),
            Cmd::assign(&x, Expr::select(&m3, Expr::num(1u64))),
            store(&m2, Expr::num(1u64), Expr::num(8u64)),
            Cmd::assign(&m3, Expr::ite(&p, &m1, &m2)),
            Cmd::assign(&y, Expr::select(&m3, Expr::num(1u64))),
        ]);
        let out = inline(&program);
        assert_eq!(out.block(0).unwrap().cmds[4], Cmd::assign(&x, Expr::num(7u64)));
        assert_eq!(
            out.block(0).unwrap().cmds[7],
            Cmd::assign(&y, Expr::select(&m3, Expr::num(1u64)))
        );
    }

    #[test]
    fn test_map_from_entry_is_not_resolved() {
        let x = Var::bits256("x");
        let m = Var::bytemap("m");
        let program = Program::single_block(vec![Cmd::assign(&x, Expr::select(&m, Expr::num(1u64)))]);
        assert_eq!(inline(&program), program);
    }

    #[test]
    fn test_representative_replaces_complex_rhs() {
        let (a, b, c) = (Var::bits256("a"), Var::bits256("b"), Var::bits256("c"));
        let sum = Expr::Nary(NaryOp::Add, vec![Expr::from(&a), Expr::from(&b)]);
        let program = Program::single_block(vec![
            Cmd::havoc(&a),
            Cmd::havoc(&b),
            Cmd::assign(&c, sum.clone()),
            Cmd::assign(&Var::bits256("d"), sum),
            observe(&c),
        ]);
        let out = BytemapInliner::go(&program, &BytemapConfig::default(), &EraseAll).unwrap();
        assert_eq!(
            out.program.block(0).unwrap().cmds[3],
            Cmd::assign(&Var::bits256("d"), &c)
        );
        assert_eq!(out.stats.get("rep"), 1);
    }

    #[test]
    fn test_repeated_assignment_is_deleted() {
        let (a, c) = (Var::bits256("a"), Var::bits256("c"));
        let program = Program::single_block(vec![
            Cmd::havoc(&a),
            Cmd::assign(&c, Expr::mul(&a, Expr::num(2u64))),
            Cmd::assign(&c, Expr::mul(&a, Expr::num(2u64))),
        ]);
        let out = BytemapInliner::go(&program, &BytemapConfig::default(), &EraseAll).unwrap();
        assert_eq!(out.program.block(0).unwrap().cmds.len(), 2);
        assert_eq!(out.stats.get("lhs=rhs"), 1);

        let preserved = PreservedVars::new(["c"]);
        let kept = BytemapInliner::go(&program, &BytemapConfig::default(), &preserved).unwrap();
        assert_eq!(kept.program, program);
    }

    #[test]
    fn test_constant_condition_picks_one_branch() {
        let (x, y) = (Var::bits256("x"), Var::bits256("y"));
        let (m1, m2, m3, m4) = (
            Var::bytemap("m1"),
            Var::bytemap("m2"),
            Var::bytemap("m3"),
            Var::bytemap("m4"),
        );
        let program = Program::single_block(vec![
            const_map(&m1, 1),
            const_map(&m2, 2),
            Cmd::assign(&m3, Expr::ite(Expr::num(1u64), &m1, &m2)),
            Cmd::assign(&x, Expr::select(&m3, Expr::num(5u64))),
            Cmd::assign(&m4, Expr::ite(Expr::num(0u64), &m1, &m2)),
            Cmd::assign(&y, Expr::select(&m4, Expr::num(5u64))),
        ]);
        let out = inline(&program);
        assert_eq!(out.block(0).unwrap().cmds[3], Cmd::assign(&x, Expr::num(1u64)));
        assert_eq!(out.block(0).unwrap().cmds[5], Cmd::assign(&y, Expr::num(2u64)));
    }

    #[test]
    fn test_load_through_single_store_is_not_resolved() {
        let x = Var::bits256("x");
        let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
        let program = Program::single_block(vec![
            const_map(&m1, 0),
            Cmd::ByteStoreSingle {
                lhs: m2.clone(),
                base: m1,
                loc: Symbol::num(5u64),
                value: Symbol::num(9u64),
            },
            Cmd::assign(&x, Expr::select(&m2, Expr::num(5u64))),
        ]);
        let out = inline(&program);
        assert_eq!(
            out.block(0).unwrap().cmds[2],
            Cmd::assign(&x, Expr::select(&m2, Expr::num(5u64)))
        );
    }
}

/*
 * Term Factory
 *
 * Computes linear terms for symbols and expressions, and compares terms
 * anchored at different locations.
 *
 * Terms are the mod 2^256 value of a variable. For an `Int` variable that may
 * not be its actual value, but once the value lands in a word variable it has
 * been reduced, so word terms are always exact. Division does not commute with
 * the reduction and is never given a term.
 *
 * `lhs_term` is filled by the passes as they go. `rhs_term` and `expr` read it
 * through reaching definitions, so they are only asked about locations whose
 * reaching definitions were already handled.
 */

use crate::errors::{BytemapError, Result};
use crate::features::bytemaps::domain::{Term, UniqueVar};
use crate::features::data_flow::{concrete_sites, AnalysisCache, DefSites};
use crate::features::intervals::{Interval, IntervalOracle, WrappedInterval};
use crate::shared::models::{BinaryOp, Expr, Loc, NaryOp, Symbol, Var};
use primitive_types::U256;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::Arc;

pub struct TermFactory<'a> {
    cache: &'a AnalysisCache<'a>,
    oracle: Option<&'a dyn IntervalOracle>,
    lhs_terms: RefCell<FxHashMap<Loc, Term>>,
    rhs_memo: RefCell<FxHashMap<(Loc, Symbol), Option<Term>>>,
    atoms: RefCell<FxHashMap<(Var, DefSites), Term>>,
}

fn is_pow2(x: U256) -> bool {
    !x.is_zero() && (x & (x - U256::one())).is_zero()
}

/// `t % m` for a power of two `m`, only when the result is a constant
fn mod_if_const(t: &Term, m: U256) -> Option<Term> {
    Some(t.mod_pow2(m)).filter(Term::is_const)
}

/// Every item is `Some` of one same value
pub(crate) fn same_value<T: PartialEq>(mut items: impl Iterator<Item = Option<T>>) -> Option<T> {
    let first = items.next()??;
    for item in items {
        if item? != first {
            return None;
        }
    }
    Some(first)
}

impl<'a> TermFactory<'a> {
    pub fn new(cache: &'a AnalysisCache<'a>, oracle: Option<&'a dyn IntervalOracle>) -> Self {
        Self {
            cache,
            oracle,
            lhs_terms: RefCell::default(),
            rhs_memo: RefCell::default(),
            atoms: RefCell::default(),
        }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn lhs_term(&self, loc: Loc) -> Option<Term> {
        self.lhs_terms.borrow().get(&loc).cloned()
    }

    pub fn set_lhs_term(&self, loc: Loc, term: Term) {
        self.lhs_terms.borrow_mut().insert(loc, term);
    }

    /// The atomic term of `var` with these def sites, shared between all callers
    pub fn atom(&self, var: &Var, defs: DefSites) -> Term {
        let key = (var.clone(), defs);
        if let Some(t) = self.atoms.borrow().get(&key) {
            return t.clone();
        }
        let term = Term::atom(UniqueVar::new(var.clone(), Arc::new(key.1.clone())));
        self.atoms.borrow_mut().insert(key, term.clone());
        term
    }

    /// Term of `sym` as read by the command at `loc`
    pub fn rhs_term(&self, loc: Loc, sym: &Symbol) -> Option<Term> {
        if !sym.sort().is_term_sort() {
            return None;
        }
        let key = (loc, sym.clone());
        if let Some(t) = self.rhs_memo.borrow().get(&key) {
            return t.clone();
        }
        let term = match sym {
            Symbol::Const { value, .. } => Some(Term::constant(*value)),
            Symbol::Var(v) => {
                let defs = self.cache.def_sites(v, loc);
                concrete_sites(&defs)
                    .and_then(|sites| same_value(sites.iter().map(|s| self.lhs_term(*s))))
                    // int atoms would not be exact, wait for them to be narrowed
                    .or_else(|| v.sort.is_bits().then(|| self.atom(v, defs)))
            }
        };
        self.rhs_memo.borrow_mut().insert(key, term.clone());
        term
    }

    /// Term of `e` as evaluated by the command at `loc`, or `None` outside the
    /// supported grammar
    pub fn expr(&self, loc: Loc, e: &Expr) -> Option<Term> {
        let operands = |args: &[Expr]| -> Option<Vec<Term>> {
            args.iter().map(|a| self.expr(loc, a)).collect()
        };

        match e {
            Expr::Sym(s) => self.rhs_term(loc, s),

            Expr::Nary(NaryOp::Add | NaryOp::IntAdd, args) => {
                let terms = operands(args)?;
                terms.iter().try_fold(Term::zero(), |acc, t| Some(&acc + t))
            }

            Expr::Nary(NaryOp::Mul | NaryOp::IntMul, args) => {
                let terms = operands(args)?;
                let (consts, others): (Vec<_>, Vec<_>) =
                    terms.into_iter().partition(Term::is_const);
                let coef = consts
                    .iter()
                    .fold(U256::one(), |acc, t| acc.overflowing_mul(t.c()).0);
                match others.as_slice() {
                    [] => Some(Term::constant(coef)),
                    [t] => Some(t * coef),
                    _ => None,
                }
            }

            Expr::Binary(op, a, b) => {
                let (t1, t2) = (&self.expr(loc, a)?, &self.expr(loc, b)?);
                match op {
                    BinaryOp::Sub | BinaryOp::IntSub => Some(t1 - t2),
                    BinaryOp::ShiftLeft => {
                        let k = t2.as_const().filter(|k| *k <= U256::from(256u32))?;
                        if k == U256::from(256u32) {
                            Some(Term::zero())
                        } else {
                            Some(t1 * (U256::one() << k.as_usize()))
                        }
                    }
                    BinaryOp::Mod => {
                        let m = t2.as_const().filter(|m| is_pow2(*m))?;
                        mod_if_const(t1, m)
                    }
                    BinaryOp::BwAnd => match (t1.as_const(), t2.as_const()) {
                        (Some(x), Some(y)) => Some(Term::constant(x & y)),
                        (None, Some(mask)) => Self::masked(t1, mask),
                        (Some(mask), None) => Self::masked(t2, mask),
                        (None, None) => None,
                    },
                    BinaryOp::Exp => {
                        let (base, exp) = (t1.as_const()?, t2.as_const()?);
                        Some(Term::constant(base.overflowing_pow(exp).0))
                    }
                    _ => None,
                }
            }

            Expr::Annotated { inner, .. } => self.expr(loc, inner),

            Expr::Apply { func, args } if func.is_value_preserving() => match args.as_slice() {
                [arg] => self.expr(loc, arg),
                _ => None,
            },

            _ => None,
        }
    }

    /// `t & mask` for a non-constant `t`
    fn masked(t: &Term, mask: U256) -> Option<Term> {
        if mask == U256::MAX {
            return Some(t.clone());
        }
        // 0x0..01..1
        if is_pow2(mask + U256::one()) {
            return mod_if_const(t, mask + U256::one());
        }
        // 0xf..f0..0, clears the low bits: `t - t % 2^low`
        let low = mask.trailing_zeros() as usize;
        if mask == U256::MAX << low {
            let rem = mod_if_const(t, U256::one() << low)?;
            return Some(t - &rem);
        }
        None
    }

    /// Range of the values the atom `u` takes when read at `loc1` and at `loc2`
    fn atom_range(&self, oracle: &dyn IntervalOracle, loc1: Loc, loc2: Loc, u: &UniqueVar) -> Interval {
        let v = &u.var;
        let defs1 = self.cache.def_sites(v, loc1);
        let defs2 = self.cache.def_sites(v, loc2);

        // `v` at loc1 (loc2) is the value `u` stands for
        let relevant1 = defs1.is_superset(&u.defs);
        let relevant2 = defs2.is_superset(&u.defs);

        // no assignment to `v` between the two locations, so both read the same value
        let none_between = defs2
            .iter()
            .flatten()
            .all(|d| !self.cache.can_reach(loc1, *d));

        let at1 = || oracle.range_at(loc1, v);
        let at2 = || oracle.range_at(loc2, v);
        let default = || {
            concrete_sites(&u.defs)
                .and_then(|sites| {
                    sites
                        .iter()
                        .map(|s| oracle.lhs_range(*s))
                        .try_fold(Interval::empty(), |acc, r| r.map(|r| acc.hull(&r)))
                })
                .unwrap_or_else(|| Interval::of_sort(v.sort))
        };

        match (none_between, relevant1, relevant2) {
            (true, true, _) | (true, _, true) | (false, true, true) => at1().intersect(&at2()),
            (false, true, false) => at1(),
            (false, false, true) => at2(),
            _ => default(),
        }
    }

    /// The possible values of `t1 - t2`, with `t1` read at `loc1` and `t2` at `loc2`.
    ///
    /// `loc2` must be reachable from `loc1`.
    pub fn diff(&self, loc1: Loc, t1: &Term, loc2: Loc, t2: &Term) -> Result<WrappedInterval> {
        if !self.cache.can_reach(loc1, loc2) {
            return Err(BytemapError::Unreachable {
                from: loc1,
                to: loc2,
            });
        }
        let mut acc = WrappedInterval::point(t1.c().overflowing_sub(t2.c()).0);
        let mut support: Vec<&UniqueVar> = t1.support().chain(t2.support()).collect();
        support.sort();
        support.dedup();

        for u in support {
            let (k1, k2) = (t1.coef(u), t2.coef(u));
            if k1 == k2 {
                continue;
            }
            let range = match self.oracle {
                Some(oracle) => self.atom_range(oracle, loc1, loc2, u),
                None => Interval::of_sort(u.var.sort),
            };
            let scaled = WrappedInterval::from(range).scale(k1.overflowing_sub(k2).0);
            acc = acc.add(&scaled);
        }
        Ok(acc)
    }

    /// `Some(true)` if surely equal, `Some(false)` if surely different
    pub fn are_equal(&self, loc1: Loc, t1: &Term, loc2: Loc, t2: &Term) -> Result<Option<bool>> {
        if self.oracle.is_none() {
            return Ok((t1 - t2).as_const().map(|c| c.is_zero()));
        }
        let d = self.diff(loc1, t1, loc2, t2)?;
        Ok(if d.as_const() == Some(U256::zero()) {
            Some(true)
        } else if !d.contains(U256::zero()) {
            Some(false)
        } else {
            None
        })
    }

    /// Whether `query` (read at `query_loc`) lies in `[low, high)` (read at `range_loc`)
    pub fn is_inside(
        &self,
        query_loc: Loc,
        query: &Term,
        range_loc: Loc,
        low: &Term,
        high: &Term,
    ) -> Result<Option<bool>> {
        if self.oracle.is_none() {
            return Ok(None);
        }
        let low_minus_query = self.diff(range_loc, low, query_loc, query)?;
        let high_minus_query = self.diff(range_loc, high, query_loc, query)?;
        Ok(
            if low_minus_query.neg().is_non_neg() && high_minus_query.is_pos() {
                Some(true)
            } else if low_minus_query.is_pos() || high_minus_query.neg().is_non_neg() {
                Some(false)
            } else {
                None
            },
        )
    }
}

//! Linear terms over 256-bit words
//!
//! A term is `c + k1*a1 + ... + kn*an (mod 2^256)`. Atoms are variables paired
//! with the definitions reaching them, so two atoms with the same variable and
//! the same def sites denote the same value on a loop-free program.

use crate::features::data_flow::DefSites;
use crate::shared::models::{Loc, Var};
use primitive_types::U256;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UniqueVar {
    pub var: Var,
    pub defs: Arc<DefSites>,
}

impl UniqueVar {
    pub fn new(var: Var, defs: impl Into<Arc<DefSites>>) -> Self {
        Self {
            var,
            defs: defs.into(),
        }
    }
}

impl fmt::Display for UniqueVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.var)
    }
}

/// `c + Σ coef·atom`, coefficients never zero
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    c: U256,
    lits: BTreeMap<UniqueVar, U256>,
}

impl Term {
    pub fn constant(c: U256) -> Self {
        Self {
            c,
            lits: BTreeMap::new(),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn atom(u: UniqueVar) -> Self {
        Self {
            c: U256::zero(),
            lits: BTreeMap::from([(u, U256::one())]),
        }
    }

    /// The constant part
    pub fn c(&self) -> U256 {
        self.c
    }

    pub fn coef(&self, u: &UniqueVar) -> U256 {
        self.lits.get(u).copied().unwrap_or_default()
    }

    pub fn literals(&self) -> impl Iterator<Item = (&UniqueVar, U256)> {
        self.lits.iter().map(|(u, k)| (u, *k))
    }

    pub fn support(&self) -> impl Iterator<Item = &UniqueVar> {
        self.lits.keys()
    }

    pub fn support_len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_const(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn as_const(&self) -> Option<U256> {
        self.is_const().then_some(self.c)
    }

    /// The atom, when the term is exactly `1·atom`
    pub fn as_atom(&self) -> Option<&UniqueVar> {
        match self.lits.iter().next() {
            Some((u, k)) if self.lits.len() == 1 && *k == U256::one() && self.c.is_zero() => {
                Some(u)
            }
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        self.as_atom().is_some()
    }

    /// `self + k·other`
    fn add_scaled(&self, other: &Term, k: U256) -> Term {
        let mut out = self.clone();
        out.c = out.c.overflowing_add(other.c.overflowing_mul(k).0).0;
        for (u, coef) in &other.lits {
            let delta = coef.overflowing_mul(k).0;
            let sum = out.coef(u).overflowing_add(delta).0;
            if sum.is_zero() {
                out.lits.remove(u);
            } else {
                out.lits.insert(u.clone(), sum);
            }
        }
        out
    }

    pub fn scale(&self, k: U256) -> Term {
        Term::zero().add_scaled(self, k)
    }

    pub fn plus_const(&self, k: U256) -> Term {
        let mut out = self.clone();
        out.c = out.c.overflowing_add(k).0;
        out
    }

    /// Reduce modulo `m`, a power of two
    pub fn mod_pow2(&self, m: U256) -> Term {
        let mask = m.overflowing_sub(U256::one()).0;
        Term {
            c: self.c & mask,
            lits: self
                .lits
                .iter()
                .map(|(u, k)| (u.clone(), *k & mask))
                .filter(|(_, k)| !k.is_zero())
                .collect(),
        }
    }
}

impl Add<&Term> for &Term {
    type Output = Term;

    fn add(self, rhs: &Term) -> Term {
        self.add_scaled(rhs, U256::one())
    }
}

impl Sub<&Term> for &Term {
    type Output = Term;

    fn sub(self, rhs: &Term) -> Term {
        self.add_scaled(rhs, U256::MAX)
    }
}

impl Neg for &Term {
    type Output = Term;

    fn neg(self) -> Term {
        self.scale(U256::MAX)
    }
}

impl Mul<U256> for &Term {
    type Output = Term;

    fn mul(self, k: U256) -> Term {
        self.scale(k)
    }
}

fn fmt_word(f: &mut fmt::Formatter<'_>, x: U256) -> fmt::Result {
    if x > U256::from(0xffffu32) {
        write!(f, "{:#x}", x)
    } else {
        write!(f, "{}", x)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if !self.c.is_zero() || self.lits.is_empty() {
            fmt_word(f, self.c)?;
            first = false;
        }
        for (u, k) in &self.lits {
            if !first {
                f.write_str(" + ")?;
            }
            first = false;
            if *k != U256::one() {
                fmt_word(f, *k)?;
                f.write_str("*")?;
            }
            write!(f, "{}", u)?;
        }
        Ok(())
    }
}

/// The index term of a load, together with the load's location.
///
/// Shifted when it travels backwards through a long-copy with different offsets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Query {
    pub loc: Loc,
    pub term: Term,
}

impl Query {
    pub fn new(loc: Loc, term: Term) -> Self {
        Self { loc, term }
    }

    pub fn shift(&self, by: &Term) -> Query {
        if by.as_const() == Some(U256::zero()) {
            self.clone()
        } else {
            Query::new(self.loc, &self.term + by)
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.term, self.loc)
    }
}

//! Non-wrapping integer ranges
//!
//! Finite bounds are words in `[0, 2^256)`. Anything below zero is `NegInf`,
//! anything at or above `2^256` is `PosInf`. Lower bounds round down and
//! upper bounds round up, so every operation over-approximates.

use crate::shared::models::Sort;
use primitive_types::U256;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    NegInf,
    Finite(U256),
    PosInf,
}

impl Bound {
    pub fn as_finite(&self) -> Option<U256> {
        match self {
            Bound::Finite(x) => Some(*x),
            _ => None,
        }
    }

    fn add(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::Finite(a), Bound::Finite(b)) => match a.overflowing_add(b) {
                (sum, false) => Bound::Finite(sum),
                (_, true) => Bound::PosInf,
            },
        }
    }

    /// `self - other`, a negative result becomes `below_zero`
    fn sub(self, other: Bound, below_zero: Bound) -> Bound {
        match (self, other) {
            (Bound::NegInf, _) | (_, Bound::PosInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::NegInf) => Bound::PosInf,
            (Bound::Finite(a), Bound::Finite(b)) if a >= b => Bound::Finite(a - b),
            (Bound::Finite(_), Bound::Finite(_)) => below_zero,
        }
    }

    fn mul(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), _) | (_, Bound::Finite(a)) if a.is_zero() => Bound::Finite(a),
            (Bound::Finite(a), Bound::Finite(b)) => match a.overflowing_mul(b) {
                (p, false) => Bound::Finite(p),
                (_, true) => Bound::PosInf,
            },
            _ => Bound::PosInf,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-inf"),
            Bound::Finite(x) if *x > U256::from(0xffffu32) => write!(f, "{:#x}", x),
            Bound::Finite(x) => write!(f, "{}", x),
            Bound::PosInf => write!(f, "+inf"),
        }
    }
}

/// Closed range `[lo, hi]`, empty when `lo > hi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    lo: Bound,
    hi: Bound,
}

impl Interval {
    pub fn new(lo: Bound, hi: Bound) -> Self {
        if lo > hi {
            Self::empty()
        } else {
            Self { lo, hi }
        }
    }

    pub fn empty() -> Self {
        Self {
            lo: Bound::PosInf,
            hi: Bound::NegInf,
        }
    }

    pub fn full() -> Self {
        Self {
            lo: Bound::NegInf,
            hi: Bound::PosInf,
        }
    }

    pub fn point(x: U256) -> Self {
        Self::range(x, x)
    }

    pub fn range(lo: U256, hi: U256) -> Self {
        Self::new(Bound::Finite(lo), Bound::Finite(hi))
    }

    pub fn at_most(hi: U256) -> Self {
        Self::new(Bound::NegInf, Bound::Finite(hi))
    }

    pub fn at_least(lo: U256) -> Self {
        Self::new(Bound::Finite(lo), Bound::PosInf)
    }

    pub fn boolean() -> Self {
        Self::range(U256::zero(), U256::one())
    }

    /// Every value a variable of `sort` can hold
    pub fn of_sort(sort: Sort) -> Self {
        match sort.max_value() {
            Some(max) => Self::range(U256::zero(), max),
            None => Self::full(),
        }
    }

    pub fn lo(&self) -> Bound {
        self.lo
    }

    pub fn hi(&self) -> Bound {
        self.hi
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Lower bound is a word, so no value is negative
    pub fn is_non_neg(&self) -> bool {
        matches!(self.lo, Bound::Finite(_))
    }

    pub fn contains(&self, x: U256) -> bool {
        self.lo <= Bound::Finite(x) && Bound::Finite(x) <= self.hi
    }

    pub fn as_const(&self) -> Option<U256> {
        match (self.lo, self.hi) {
            (Bound::Finite(a), Bound::Finite(b)) if a == b => Some(a),
            _ => None,
        }
    }

    pub fn hull(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval::new(self.lo.min(other.lo), self.hi.max(other.hi))
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(self.lo.max(other.lo), self.hi.min(other.hi))
    }

    pub fn add(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        Interval::new(self.lo.add(other.lo), self.hi.add(other.hi))
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        Interval::new(
            self.lo.sub(other.hi, Bound::NegInf),
            self.hi.sub(other.lo, Bound::Finite(U256::zero())),
        )
    }

    /// Product, precise only for non-negative operands
    pub fn mul(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        if !self.is_non_neg() || !other.is_non_neg() {
            if self.as_const() == Some(U256::zero()) || other.as_const() == Some(U256::zero()) {
                return Interval::point(U256::zero());
            }
            return Interval::full();
        }
        Interval::new(self.lo.mul(other.lo), self.hi.mul(other.hi))
    }

    pub fn mul_const(&self, k: U256) -> Interval {
        self.mul(&Interval::point(k))
    }

    pub fn shr(&self, k: usize) -> Interval {
        if self.is_empty() {
            return *self;
        }
        let shift = |b: Bound| match b {
            Bound::Finite(x) => Bound::Finite(x >> k),
            other => other,
        };
        if !self.is_non_neg() {
            return Interval::full();
        }
        Interval::new(shift(self.lo), shift(self.hi))
    }

    /// Word division, where `x / 0 = 0`
    pub fn div(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        if other.as_const() == Some(U256::zero()) {
            return Interval::point(U256::zero());
        }
        match (self.lo, self.hi, other.lo, other.hi) {
            (Bound::Finite(a_lo), a_hi, Bound::Finite(b_lo), b_hi) if !b_lo.is_zero() => {
                let lo = match b_hi {
                    Bound::Finite(b) => Bound::Finite(a_lo / b),
                    _ => Bound::Finite(U256::zero()),
                };
                let hi = match a_hi {
                    Bound::Finite(a) => Bound::Finite(a / b_lo),
                    other => other,
                };
                Interval::new(lo, hi)
            }
            (Bound::Finite(_), a_hi, Bound::Finite(_), _) => {
                Interval::new(Bound::Finite(U256::zero()), a_hi)
            }
            _ => Interval::full(),
        }
    }

    /// Word remainder, where `x % 0 = 0`
    pub fn rem(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        match (other.lo, other.hi) {
            (Bound::Finite(_), Bound::Finite(m)) if m.is_zero() => Interval::point(U256::zero()),
            (Bound::Finite(_), Bound::Finite(m)) => {
                let below = Interval::range(U256::zero(), m - U256::one());
                if self.is_non_neg() && other.as_const().is_some() && below.hull(self) == below {
                    *self
                } else if self.is_non_neg() {
                    below.intersect(&Interval::new(Bound::Finite(U256::zero()), self.hi))
                } else {
                    below
                }
            }
            _ => Interval::full(),
        }
    }

    pub fn bw_and(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        let zero = Bound::Finite(U256::zero());
        match (self.is_non_neg(), other.is_non_neg()) {
            (true, true) => Interval::new(zero, self.hi.min(other.hi)),
            (true, false) => Interval::new(zero, self.hi),
            (false, true) => Interval::new(zero, other.hi),
            (false, false) => Interval::full(),
        }
    }

    /// Reinterpret as a value of `sort`: a bounded word that may have escaped its
    /// range wrapped around, so only the full word range is sound.
    pub fn clamp_to(&self, sort: Sort) -> Interval {
        if self.is_empty() {
            return *self;
        }
        match sort.max_value() {
            None => *self,
            Some(max) => match (self.lo, self.hi) {
                (Bound::Finite(_), Bound::Finite(hi)) if hi <= max => *self,
                _ => Interval::range(U256::zero(), max),
            },
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{}, {}]", self.lo, self.hi)
        }
    }
}

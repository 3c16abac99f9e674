//! Arcs on the ring of 256-bit words
//!
//! `Arc { start, len }` holds `start, start + 1, ..., start + len`, all mod 2^256.
//! Linear combinations of ranges are computed here, where wrap-around is exact.

use super::interval::{Bound, Interval};
use primitive_types::U256;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrappedInterval {
    Empty,
    Top,
    Arc { start: U256, len: U256 },
}

/// 2^255 - 1, the largest non-negative value when read as signed
fn max_signed() -> U256 {
    U256::MAX >> 1usize
}

impl WrappedInterval {
    pub fn point(x: U256) -> Self {
        WrappedInterval::Arc {
            start: x,
            len: U256::zero(),
        }
    }

    fn arc(start: U256, len: U256) -> Self {
        if len == U256::MAX {
            WrappedInterval::Top
        } else {
            WrappedInterval::Arc { start, len }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, WrappedInterval::Empty)
    }

    pub fn contains(&self, x: U256) -> bool {
        match self {
            WrappedInterval::Empty => false,
            WrappedInterval::Top => true,
            WrappedInterval::Arc { start, len } => x.overflowing_sub(*start).0 <= *len,
        }
    }

    pub fn as_const(&self) -> Option<U256> {
        match self {
            WrappedInterval::Arc { start, len } if len.is_zero() => Some(*start),
            _ => None,
        }
    }

    pub fn add(&self, other: &WrappedInterval) -> WrappedInterval {
        use WrappedInterval::*;
        match (self, other) {
            (Empty, _) | (_, Empty) => Empty,
            (Top, _) | (_, Top) => Top,
            (Arc { start: s1, len: l1 }, Arc { start: s2, len: l2 }) => {
                match l1.overflowing_add(*l2) {
                    (_, true) => Top,
                    (len, false) => Self::arc(s1.overflowing_add(*s2).0, len),
                }
            }
        }
    }

    /// Multiply every element by `k`, reading `k` as whichever of `k` and `k - 2^256`
    /// is smaller in magnitude
    pub fn scale(&self, k: U256) -> WrappedInterval {
        use WrappedInterval::*;
        if k.is_zero() {
            return match self {
                Empty => Empty,
                _ => Self::point(U256::zero()),
            };
        }
        match self {
            Empty => Empty,
            // only multiples of k, but an arc cannot say that
            Top => Top,
            Arc { start, len } => {
                if k <= max_signed() + U256::one() {
                    match len.overflowing_mul(k) {
                        (_, true) => Top,
                        (l, false) => Self::arc(start.overflowing_mul(k).0, l),
                    }
                } else {
                    let d = k.overflowing_neg().0;
                    match len.overflowing_mul(d) {
                        (_, true) => Top,
                        (l, false) => {
                            let end = start.overflowing_add(*len).0;
                            Self::arc(end.overflowing_mul(k).0, l)
                        }
                    }
                }
            }
        }
    }

    pub fn neg(&self) -> WrappedInterval {
        match self {
            WrappedInterval::Arc { start, len } => {
                let end = start.overflowing_add(*len).0;
                WrappedInterval::Arc {
                    start: end.overflowing_neg().0,
                    len: *len,
                }
            }
            other => *other,
        }
    }

    /// Every element lies in `[0, 2^255)`
    pub fn is_non_neg(&self) -> bool {
        match self {
            WrappedInterval::Arc { start, len } => match start.overflowing_add(*len) {
                (end, false) => end <= max_signed(),
                (_, true) => false,
            },
            _ => false,
        }
    }

    /// Every element lies in `(0, 2^255)`
    pub fn is_pos(&self) -> bool {
        self.is_non_neg() && !self.contains(U256::zero())
    }
}

impl From<Interval> for WrappedInterval {
    fn from(i: Interval) -> Self {
        if i.is_empty() {
            return WrappedInterval::Empty;
        }
        match (i.lo(), i.hi()) {
            (Bound::Finite(lo), Bound::Finite(hi)) => WrappedInterval::arc(lo, hi - lo),
            _ => WrappedInterval::Top,
        }
    }
}

impl fmt::Display for WrappedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrappedInterval::Empty => write!(f, "[empty]"),
            WrappedInterval::Top => write!(f, "[top]"),
            WrappedInterval::Arc { start, len } => {
                let end = start.overflowing_add(*len).0;
                write!(f, "[{}, {}]", start, end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(start: u64, len: u64) -> WrappedInterval {
        WrappedInterval::Arc {
            start: U256::from(start),
            len: U256::from(len),
        }
    }

    fn minus(x: u64) -> U256 {
        U256::from(x).overflowing_neg().0
    }

    #[test]
    fn test_contains_across_wrap() {
        let w = WrappedInterval::Arc {
            start: minus(2),
            len: U256::from(4),
        };
        assert!(w.contains(U256::zero()));
        assert!(w.contains(U256::from(2)));
        assert!(!w.contains(U256::from(3)));
        assert!(!w.is_non_neg());
    }

    #[test]
    fn test_add() {
        assert_eq!(arc(1, 2).add(&arc(10, 3)), arc(11, 5));
        assert_eq!(
            WrappedInterval::Top.add(&WrappedInterval::Empty),
            WrappedInterval::Empty
        );
    }

    #[test]
    fn test_scale_by_negative_one() {
        let w = arc(100, 100).scale(U256::MAX);
        assert_eq!(
            w,
            WrappedInterval::Arc {
                start: minus(200),
                len: U256::from(100)
            }
        );
        assert_eq!(w, arc(100, 100).neg());
    }

    #[test]
    fn test_scale_overflow_is_top() {
        let wide = WrappedInterval::Arc {
            start: U256::zero(),
            len: U256::one() << 200usize,
        };
        assert_eq!(wide.scale(U256::one() << 60usize), WrappedInterval::Top);
    }

    #[test]
    fn test_sign_predicates() {
        assert!(arc(0, 5).is_non_neg());
        assert!(!arc(0, 5).is_pos());
        assert!(arc(1, 5).is_pos());
        assert!(!WrappedInterval::point(minus(1)).is_non_neg());
        assert!(!WrappedInterval::Top.is_non_neg());
        assert!(!WrappedInterval::Empty.is_non_neg());
    }

    #[test]
    fn test_from_interval() {
        assert_eq!(
            WrappedInterval::from(Interval::range(U256::from(3), U256::from(7))),
            arc(3, 4)
        );
        assert_eq!(WrappedInterval::from(Interval::full()), WrappedInterval::Top);
        assert_eq!(
            WrappedInterval::from(Interval::empty()),
            WrappedInterval::Empty
        );
    }
}

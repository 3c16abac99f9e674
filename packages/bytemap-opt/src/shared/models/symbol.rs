//! Sorts, variables and symbols

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Type of a variable or constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sort {
    /// Map from word index to word value
    ByteMap,
    /// Bounded machine word of the given bit width
    Bits(u16),
    /// Unbounded mathematical integer
    Int,
    /// Conditions only
    Bool,
}

impl Sort {
    pub const BIT256: Sort = Sort::Bits(256);

    pub fn is_bytemap(&self) -> bool {
        matches!(self, Sort::ByteMap)
    }

    pub fn is_bits(&self) -> bool {
        matches!(self, Sort::Bits(_))
    }

    /// Sorts a linear term can be computed for
    pub fn is_term_sort(&self) -> bool {
        matches!(self, Sort::Bits(_) | Sort::Int)
    }

    /// Largest value of a bounded sort
    pub fn max_value(&self) -> Option<U256> {
        match self {
            Sort::Bits(w) if *w >= 256 => Some(U256::MAX),
            Sort::Bits(w) => Some((U256::one() << usize::from(*w)) - U256::one()),
            Sort::Bool => Some(U256::one()),
            Sort::ByteMap | Sort::Int => None,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::ByteMap => write!(f, "bytemap"),
            Sort::Bits(w) => write!(f, "bv{}", w),
            Sort::Int => write!(f, "int"),
            Sort::Bool => write!(f, "bool"),
        }
    }
}

/// A program variable
///
/// Cloning is cheap: the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Var {
    pub name: Arc<str>,
    pub sort: Sort,
}

impl Var {
    pub fn new(name: impl AsRef<str>, sort: Sort) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            sort,
        }
    }

    pub fn bits256(name: impl AsRef<str>) -> Self {
        Self::new(name, Sort::BIT256)
    }

    pub fn bytemap(name: impl AsRef<str>) -> Self {
        Self::new(name, Sort::ByteMap)
    }

    pub fn int(name: impl AsRef<str>) -> Self {
        Self::new(name, Sort::Int)
    }

    pub fn boolean(name: impl AsRef<str>) -> Self {
        Self::new(name, Sort::Bool)
    }

    pub fn is_bytemap(&self) -> bool {
        self.sort.is_bytemap()
    }

    pub fn sym(&self) -> Symbol {
        Symbol::Var(self.clone())
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Variable or constant operand
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Var(Var),
    Const { value: U256, sort: Sort },
}

impl Symbol {
    /// A 256-bit word constant
    pub fn num(value: impl Into<U256>) -> Self {
        Symbol::Const {
            value: value.into(),
            sort: Sort::BIT256,
        }
    }

    pub fn int_const(value: impl Into<U256>) -> Self {
        Symbol::Const {
            value: value.into(),
            sort: Sort::Int,
        }
    }

    pub fn sort(&self) -> Sort {
        match self {
            Symbol::Var(v) => v.sort,
            Symbol::Const { sort, .. } => *sort,
        }
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Symbol::Var(v) => Some(v),
            Symbol::Const { .. } => None,
        }
    }

    pub fn as_const(&self) -> Option<U256> {
        match self {
            Symbol::Const { value, .. } => Some(*value),
            Symbol::Var(_) => None,
        }
    }
}

impl From<Var> for Symbol {
    fn from(v: Var) -> Self {
        Symbol::Var(v)
    }
}

impl From<&Var> for Symbol {
    fn from(v: &Var) -> Self {
        Symbol::Var(v.clone())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Var(v) => write!(f, "{}", v),
            Symbol::Const { value, .. } if *value > U256::from(0xffffu32) => {
                write!(f, "{:#x}", value)
            }
            Symbol::Const { value, .. } => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_value() {
        assert_eq!(Sort::Bits(8).max_value(), Some(U256::from(255)));
        assert_eq!(Sort::BIT256.max_value(), Some(U256::MAX));
        assert_eq!(Sort::Int.max_value(), None);
    }

    #[test]
    fn test_var_identity_is_name_and_sort() {
        let a = Var::bits256("a");
        assert_eq!(a, Var::bits256("a"));
        assert_ne!(a, Var::int("a"));
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::num(5u64).to_string(), "5");
        assert_eq!(Symbol::num(0x12345u64).to_string(), "0x12345");
        assert_eq!(Var::bytemap("m").sym().to_string(), "m");
    }
}

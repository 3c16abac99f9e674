//! Right-hand-side expressions

use super::symbol::{Sort, Symbol, Var};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Operators taking any number of operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NaryOp {
    Add,
    IntAdd,
    Mul,
    IntMul,
    LAnd,
    LOr,
}

/// Operators taking exactly two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Sub,
    IntSub,
    Div,
    Mod,
    IntMod,
    Exp,
    ShiftLeft,
    ShiftRight,
    BwAnd,
    BwOr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

/// Built-in functions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltIn {
    /// Int to word, the value is known to fit
    SafeMathNarrow,
    /// Word to int
    SafeMathPromotion,
    UnsignedPromotion,
    SafeUnsignedNarrow,
    /// Anything else, treated as opaque
    Other(String),
}

impl BuiltIn {
    /// Functions that return their single argument unchanged as a number
    pub fn is_value_preserving(&self) -> bool {
        !matches!(self, BuiltIn::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Sym(Symbol),
    Nary(NaryOp, Vec<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Ite {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },
    /// Map read `base[loc]`
    Select { base: Box<Expr>, loc: Box<Expr> },
    /// Map write `base[loc := value]`
    Store {
        base: Box<Expr>,
        loc: Box<Expr>,
        value: Box<Expr>,
    },
    /// Map definition `param -> body`
    MapDef { param: Var, body: Box<Expr> },
    /// `dst_map` with `[dst_offset, dst_offset + length)` overwritten from `src_map` at `src_offset`
    LongStore {
        dst_map: Box<Expr>,
        dst_offset: Box<Expr>,
        src_map: Box<Expr>,
        src_offset: Box<Expr>,
        length: Box<Expr>,
    },
    Apply { func: BuiltIn, args: Vec<Expr> },
    Annotated { inner: Box<Expr>, note: String },
    Forall { vars: Vec<Var>, body: Box<Expr> },
}

impl Expr {
    pub fn sym(s: impl Into<Symbol>) -> Self {
        Expr::Sym(s.into())
    }

    /// A 256-bit word constant
    pub fn num(value: impl Into<U256>) -> Self {
        Expr::Sym(Symbol::num(value))
    }

    pub fn konst(value: U256, sort: Sort) -> Self {
        Expr::Sym(Symbol::Const { value, sort })
    }

    pub fn add(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Expr::Nary(NaryOp::Add, vec![a.into(), b.into()])
    }

    pub fn int_add(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Expr::Nary(NaryOp::IntAdd, vec![a.into(), b.into()])
    }

    pub fn mul(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Expr::Nary(NaryOp::Mul, vec![a.into(), b.into()])
    }

    pub fn int_mul(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Expr::Nary(NaryOp::IntMul, vec![a.into(), b.into()])
    }

    pub fn land(args: Vec<Expr>) -> Self {
        Expr::Nary(NaryOp::LAnd, args)
    }

    pub fn binary(op: BinaryOp, a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Expr::Binary(op, Box::new(a.into()), Box::new(b.into()))
    }

    pub fn sub(a: impl Into<Expr>, b: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Sub, a, b)
    }

    pub fn ite(cond: impl Into<Expr>, then: impl Into<Expr>, els: impl Into<Expr>) -> Self {
        Expr::Ite {
            cond: Box::new(cond.into()),
            then: Box::new(then.into()),
            els: Box::new(els.into()),
        }
    }

    pub fn select(base: impl Into<Expr>, loc: impl Into<Expr>) -> Self {
        Expr::Select {
            base: Box::new(base.into()),
            loc: Box::new(loc.into()),
        }
    }

    pub fn store(base: impl Into<Expr>, loc: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        Expr::Store {
            base: Box::new(base.into()),
            loc: Box::new(loc.into()),
            value: Box::new(value.into()),
        }
    }

    pub fn map_def(param: Var, body: impl Into<Expr>) -> Self {
        Expr::MapDef {
            param,
            body: Box::new(body.into()),
        }
    }

    pub fn long_store(
        dst_map: impl Into<Expr>,
        dst_offset: impl Into<Expr>,
        src_map: impl Into<Expr>,
        src_offset: impl Into<Expr>,
        length: impl Into<Expr>,
    ) -> Self {
        Expr::LongStore {
            dst_map: Box::new(dst_map.into()),
            dst_offset: Box::new(dst_offset.into()),
            src_map: Box::new(src_map.into()),
            src_offset: Box::new(src_offset.into()),
            length: Box::new(length.into()),
        }
    }

    pub fn apply(func: BuiltIn, args: Vec<Expr>) -> Self {
        Expr::Apply { func, args }
    }

    pub fn narrow(e: impl Into<Expr>) -> Self {
        Self::apply(BuiltIn::SafeMathNarrow, vec![e.into()])
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&Var> {
        self.as_symbol().and_then(Symbol::as_var)
    }

    pub fn as_const(&self) -> Option<U256> {
        self.as_symbol().and_then(Symbol::as_const)
    }

    pub fn is_var(&self) -> bool {
        self.as_var().is_some()
    }

    pub fn is_const(&self) -> bool {
        self.as_const().is_some()
    }

    /// Direct sub-expressions
    pub fn operands(&self) -> Vec<&Expr> {
        match self {
            Expr::Sym(_) => vec![],
            Expr::Nary(_, args) | Expr::Apply { args, .. } => args.iter().collect(),
            Expr::Binary(_, a, b) => vec![a, b],
            Expr::Not(e) | Expr::Annotated { inner: e, .. } => vec![e],
            Expr::Ite { cond, then, els } => vec![cond, then, els],
            Expr::Select { base, loc } => vec![base, loc],
            Expr::Store { base, loc, value } => vec![base, loc, value],
            Expr::MapDef { body, .. } | Expr::Forall { body, .. } => vec![body],
            Expr::LongStore {
                dst_map,
                dst_offset,
                src_map,
                src_offset,
                length,
            } => vec![dst_map, dst_offset, src_map, src_offset, length],
        }
    }

    /// Free variables, not counting those bound by map definitions and quantifiers
    pub fn free_vars(&self) -> BTreeSet<Var> {
        let mut out = BTreeSet::new();
        self.collect_free_vars(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free_vars<'e>(&'e self, bound: &mut Vec<&'e Var>, out: &mut BTreeSet<Var>) {
        match self {
            Expr::Sym(Symbol::Var(v)) => {
                if !bound.contains(&v) {
                    out.insert(v.clone());
                }
            }
            Expr::Sym(Symbol::Const { .. }) => {}
            Expr::MapDef { param, body } => {
                bound.push(param);
                body.collect_free_vars(bound, out);
                bound.pop();
            }
            Expr::Forall { vars, body } => {
                let depth = bound.len();
                bound.extend(vars.iter());
                body.collect_free_vars(bound, out);
                bound.truncate(depth);
            }
            _ => {
                for e in self.operands() {
                    e.collect_free_vars(bound, out);
                }
            }
        }
    }
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        Expr::Sym(s)
    }
}

impl From<Var> for Expr {
    fn from(v: Var) -> Self {
        Expr::Sym(Symbol::Var(v))
    }
}

impl From<&Var> for Expr {
    fn from(v: &Var) -> Self {
        Expr::Sym(Symbol::Var(v.clone()))
    }
}

impl fmt::Display for NaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NaryOp::Add => "+",
            NaryOp::IntAdd => "+int",
            NaryOp::Mul => "*",
            NaryOp::IntMul => "*int",
            NaryOp::LAnd => "&&",
            NaryOp::LOr => "||",
        };
        f.write_str(s)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Sub => "-",
            BinaryOp::IntSub => "-int",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::IntMod => "%int",
            BinaryOp::Exp => "**",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BwAnd => "&",
            BinaryOp::BwOr => "|",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
        };
        f.write_str(s)
    }
}

impl fmt::Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltIn::SafeMathNarrow => write!(f, "safe_math_narrow"),
            BuiltIn::SafeMathPromotion => write!(f, "safe_math_promotion"),
            BuiltIn::UnsignedPromotion => write!(f, "unsigned_promotion"),
            BuiltIn::SafeUnsignedNarrow => write!(f, "safe_unsigned_narrow"),
            BuiltIn::Other(name) => write!(f, "{}", name),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Sym(s) => write!(f, "{}", s),
            Expr::Nary(op, args) => {
                f.write_str("(")?;
                write_list(f, args, &format!(" {} ", op))?;
                f.write_str(")")
            }
            Expr::Binary(op, a, b) => write!(f, "({} {} {})", a, op, b),
            Expr::Not(e) => write!(f, "!{}", e),
            Expr::Ite { cond, then, els } => write!(f, "ite({}, {}, {})", cond, then, els),
            Expr::Select { base, loc } => write!(f, "{}[{}]", base, loc),
            Expr::Store { base, loc, value } => write!(f, "{}[{} := {}]", base, loc, value),
            Expr::MapDef { param, body } => write!(f, "({} -> {})", param, body),
            Expr::LongStore {
                dst_map,
                dst_offset,
                src_map,
                src_offset,
                length,
            } => write!(
                f,
                "longstore({}, {}, {}, {}, {})",
                dst_map, dst_offset, src_map, src_offset, length
            ),
            Expr::Apply { func, args } => {
                write!(f, "{}(", func)?;
                write_list(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::Annotated { inner, note } => write!(f, "{{{}: {}}}", note, inner),
            Expr::Forall { vars, body } => {
                f.write_str("forall ")?;
                write_list(f, vars, " ")?;
                write!(f, ". {}", body)
            }
        }
    }
}

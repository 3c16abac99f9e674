//! Three-address commands

use super::expr::Expr;
use super::symbol::{Symbol, Var};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cmd {
    /// `lhs := rhs`
    Assign { lhs: Var, rhs: Expr },
    /// `lhs := *`
    Havoc { lhs: Var },
    /// `lhs := base[loc]`
    ByteLoad { lhs: Var, base: Var, loc: Symbol },
    /// `lhs := base[loc := value]`
    ByteStore {
        lhs: Var,
        base: Var,
        loc: Symbol,
        value: Symbol,
    },
    /// Single-byte write into a word-indexed map
    ByteStoreSingle {
        lhs: Var,
        base: Var,
        loc: Symbol,
        value: Symbol,
    },
    /// memcpy: `dst_base := longstore(dst_base, dst_offset, src_base, src_offset, length)`
    ByteLongCopy {
        dst_base: Var,
        dst_offset: Symbol,
        src_base: Var,
        src_offset: Symbol,
        length: Symbol,
    },
    Assume(Expr),
    Assert { cond: Expr, msg: String },
    /// Opaque use of symbols (logging, snippets)
    Annotation { label: String, syms: Vec<Symbol> },
    /// Block terminator choosing a successor
    Branch { cond: Symbol },
}

impl Cmd {
    pub fn assign(lhs: &Var, rhs: impl Into<Expr>) -> Self {
        Cmd::Assign {
            lhs: lhs.clone(),
            rhs: rhs.into(),
        }
    }

    pub fn havoc(lhs: &Var) -> Self {
        Cmd::Havoc { lhs: lhs.clone() }
    }

    /// Variable written by this command
    pub fn lhs(&self) -> Option<&Var> {
        match self {
            Cmd::Assign { lhs, .. }
            | Cmd::Havoc { lhs }
            | Cmd::ByteLoad { lhs, .. }
            | Cmd::ByteStore { lhs, .. }
            | Cmd::ByteStoreSingle { lhs, .. } => Some(lhs),
            Cmd::ByteLongCopy { dst_base, .. } => Some(dst_base),
            Cmd::Assume(_) | Cmd::Assert { .. } | Cmd::Annotation { .. } | Cmd::Branch { .. } => {
                None
            }
        }
    }

    pub fn is_assigning(&self) -> bool {
        self.lhs().is_some()
    }

    /// Every variable read by this command.
    ///
    /// Includes the destination map of a long-copy, which keeps the bytes outside the copied range.
    pub fn rhs_free_vars(&self) -> BTreeSet<Var> {
        fn add(out: &mut BTreeSet<Var>, s: &Symbol) {
            if let Symbol::Var(v) = s {
                out.insert(v.clone());
            }
        }

        let mut out = BTreeSet::new();
        match self {
            Cmd::Assign { rhs, .. } => out = rhs.free_vars(),
            Cmd::Havoc { .. } => {}
            Cmd::ByteLoad { base, loc, .. } => {
                out.insert(base.clone());
                add(&mut out, loc);
            }
            Cmd::ByteStore {
                base, loc, value, ..
            }
            | Cmd::ByteStoreSingle {
                base, loc, value, ..
            } => {
                out.insert(base.clone());
                add(&mut out, loc);
                add(&mut out, value);
            }
            Cmd::ByteLongCopy {
                dst_base,
                dst_offset,
                src_base,
                src_offset,
                length,
            } => {
                out.insert(dst_base.clone());
                out.insert(src_base.clone());
                add(&mut out, dst_offset);
                add(&mut out, src_offset);
                add(&mut out, length);
            }
            Cmd::Assume(cond) | Cmd::Assert { cond, .. } => out = cond.free_vars(),
            Cmd::Annotation { syms, .. } => {
                for s in syms {
                    add(&mut out, s);
                }
            }
            Cmd::Branch { cond } => add(&mut out, cond),
        }
        out
    }

    /// Every variable mentioned, written or read
    pub fn vars(&self) -> BTreeSet<Var> {
        let mut out = self.rhs_free_vars();
        if let Some(lhs) = self.lhs() {
            out.insert(lhs.clone());
        }
        out
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Assign { lhs, rhs } => write!(f, "{} := {}", lhs, rhs),
            Cmd::Havoc { lhs } => write!(f, "havoc {}", lhs),
            Cmd::ByteLoad { lhs, base, loc } => write!(f, "{} := load {}[{}]", lhs, base, loc),
            Cmd::ByteStore {
                lhs,
                base,
                loc,
                value,
            } => write!(f, "{} := store {}[{} := {}]", lhs, base, loc, value),
            Cmd::ByteStoreSingle {
                lhs,
                base,
                loc,
                value,
            } => write!(f, "{} := store8 {}[{} := {}]", lhs, base, loc, value),
            Cmd::ByteLongCopy {
                dst_base,
                dst_offset,
                src_base,
                src_offset,
                length,
            } => write!(
                f,
                "longcopy {}[{}..] <- {}[{}..] len {}",
                dst_base, dst_offset, src_base, src_offset, length
            ),
            Cmd::Assume(e) => write!(f, "assume {}", e),
            Cmd::Assert { cond, msg } => write!(f, "assert {} \"{}\"", cond, msg),
            Cmd::Annotation { label, syms } => {
                write!(f, "annotation {}", label)?;
                for s in syms {
                    write!(f, " {}", s)?;
                }
                Ok(())
            }
            Cmd::Branch { cond } => write!(f, "branch {}", cond),
        }
    }
}

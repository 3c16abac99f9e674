//! Dispatch over the commands that create or read bytemaps
//!
//! Bytemap commands are expected unfolded: every operand of a bytemap shape is
//! a bare symbol. `BytemapCmd::classify` fails with `NotUnfolded` otherwise.

use crate::errors::{BytemapError, Result};
use crate::shared::models::{Cmd, Expr, Symbol, Var};

/// A long-copy, either the `ByteLongCopy` command or a `LongStore` assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongCopy<'c> {
    pub lhs: &'c Var,
    pub src_offset: &'c Symbol,
    pub dst_offset: &'c Symbol,
    pub src_map: &'c Var,
    pub dst_map: &'c Var,
    pub length: &'c Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytemapCmd<'c> {
    /// `lhs := rhs` between bytemaps
    Copy { lhs: &'c Var, rhs: &'c Var },
    Ite {
        lhs: &'c Var,
        cond: &'c Symbol,
        then: &'c Var,
        els: &'c Var,
    },
    Load {
        lhs: &'c Var,
        base: &'c Var,
        loc: &'c Symbol,
    },
    Store {
        lhs: &'c Var,
        base: &'c Var,
        loc: &'c Symbol,
        value: &'c Symbol,
    },
    StoreSingle {
        lhs: &'c Var,
        base: &'c Var,
        loc: &'c Symbol,
        value: &'c Symbol,
    },
    Havoc { lhs: &'c Var },
    MapDef {
        lhs: &'c Var,
        param: &'c Var,
        body: &'c Expr,
    },
    LongCopy(LongCopy<'c>),
    Other,
}

fn sym<'c>(cmd: &Cmd, e: &'c Expr) -> Result<&'c Symbol> {
    e.as_symbol().ok_or_else(|| BytemapError::not_unfolded(cmd))
}

fn var<'c>(cmd: &Cmd, e: &'c Expr) -> Result<&'c Var> {
    e.as_var().ok_or_else(|| BytemapError::not_unfolded(cmd))
}

impl<'c> BytemapCmd<'c> {
    pub fn classify(cmd: &'c Cmd) -> Result<Self> {
        Ok(match cmd {
            Cmd::Assign { lhs, rhs } => {
                let lhs_map = lhs.is_bytemap();
                match rhs {
                    Expr::Sym(_) if lhs_map => BytemapCmd::Copy {
                        lhs,
                        rhs: var(cmd, rhs)?,
                    },
                    Expr::Ite { cond, then, els } if lhs_map => BytemapCmd::Ite {
                        lhs,
                        cond: sym(cmd, cond)?,
                        then: var(cmd, then)?,
                        els: var(cmd, els)?,
                    },
                    Expr::Select { base, loc } => match base.as_ref() {
                        Expr::Sym(Symbol::Var(b)) if b.is_bytemap() => BytemapCmd::Load {
                            lhs,
                            base: b,
                            loc: sym(cmd, loc)?,
                        },
                        Expr::Sym(_) => BytemapCmd::Other,
                        _ => return Err(BytemapError::not_unfolded(cmd)),
                    },
                    Expr::Store { base, loc, value } if lhs_map => BytemapCmd::Store {
                        lhs,
                        base: var(cmd, base)?,
                        loc: sym(cmd, loc)?,
                        value: sym(cmd, value)?,
                    },
                    Expr::MapDef { param, body } if lhs_map => BytemapCmd::MapDef {
                        lhs,
                        param,
                        body: &**body,
                    },
                    Expr::LongStore {
                        dst_map,
                        dst_offset,
                        src_map,
                        src_offset,
                        length,
                    } => BytemapCmd::LongCopy(LongCopy {
                        lhs,
                        src_offset: sym(cmd, src_offset)?,
                        dst_offset: sym(cmd, dst_offset)?,
                        src_map: var(cmd, src_map)?,
                        dst_map: var(cmd, dst_map)?,
                        length: sym(cmd, length)?,
                    }),
                    _ => BytemapCmd::Other,
                }
            }
            Cmd::ByteLongCopy {
                dst_base,
                dst_offset,
                src_base,
                src_offset,
                length,
            } => BytemapCmd::LongCopy(LongCopy {
                lhs: dst_base,
                src_offset,
                dst_offset,
                src_map: src_base,
                dst_map: dst_base,
                length,
            }),
            Cmd::ByteStore {
                lhs,
                base,
                loc,
                value,
            } => BytemapCmd::Store {
                lhs,
                base,
                loc,
                value,
            },
            Cmd::ByteStoreSingle {
                lhs,
                base,
                loc,
                value,
            } => BytemapCmd::StoreSingle {
                lhs,
                base,
                loc,
                value,
            },
            Cmd::ByteLoad { lhs, base, loc } => BytemapCmd::Load { lhs, base, loc },
            Cmd::Havoc { lhs } if lhs.is_bytemap() => BytemapCmd::Havoc { lhs },
            _ => BytemapCmd::Other,
        })
    }
}

/// Per-shape callbacks. Every callback defaults to "no opinion" (`Ok(None)`),
/// and "no opinion" ends in `fallthrough`.
pub trait BytemapCmdHandler {
    type Output;

    fn copy(&mut self, _lhs: &Var, _rhs: &Var) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn ite(
        &mut self,
        _lhs: &Var,
        _cond: &Symbol,
        _then: &Var,
        _els: &Var,
    ) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn load(&mut self, _lhs: &Var, _base: &Var, _loc: &Symbol) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn store(
        &mut self,
        _lhs: &Var,
        _base: &Var,
        _loc: &Symbol,
        _value: &Symbol,
    ) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn store_single(
        &mut self,
        _lhs: &Var,
        _base: &Var,
        _loc: &Symbol,
        _value: &Symbol,
    ) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn havoc(&mut self, _lhs: &Var) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn map_def(&mut self, _lhs: &Var, _param: &Var, _body: &Expr) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn long_copy(&mut self, _copy: &LongCopy<'_>) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn fallthrough(&mut self) -> Result<Option<Self::Output>> {
        Ok(None)
    }

    fn handle(&mut self, cmd: &Cmd) -> Result<Option<Self::Output>> {
        let out = match BytemapCmd::classify(cmd)? {
            BytemapCmd::Copy { lhs, rhs } => self.copy(lhs, rhs)?,
            BytemapCmd::Ite {
                lhs,
                cond,
                then,
                els,
            } => self.ite(lhs, cond, then, els)?,
            BytemapCmd::Load { lhs, base, loc } => self.load(lhs, base, loc)?,
            BytemapCmd::Store {
                lhs,
                base,
                loc,
                value,
            } => self.store(lhs, base, loc, value)?,
            BytemapCmd::StoreSingle {
                lhs,
                base,
                loc,
                value,
            } => self.store_single(lhs, base, loc, value)?,
            BytemapCmd::Havoc { lhs } => self.havoc(lhs)?,
            BytemapCmd::MapDef { lhs, param, body } => self.map_def(lhs, param, body)?,
            BytemapCmd::LongCopy(copy) => self.long_copy(&copy)?,
            BytemapCmd::Other => None,
        };
        match out {
            Some(out) => Ok(Some(out)),
            None => self.fallthrough(),
        }
    }
}

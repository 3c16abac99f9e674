//! Which commands may be deleted, and which variables may be rewritten

use crate::shared::models::{Cmd, Var};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Classifies commands with side effects a pass must keep
pub trait Erasability: Send + Sync {
    /// Only asked about commands that assign a variable
    fn is_erasable(&self, cmd: &Cmd) -> bool;

    /// Whether value numbering may rewrite the assignment of `var`
    fn is_inlineable(&self, _var: &Var) -> bool {
        true
    }
}

impl<T: Erasability + ?Sized> Erasability for &T {
    fn is_erasable(&self, cmd: &Cmd) -> bool {
        (**self).is_erasable(cmd)
    }

    fn is_inlineable(&self, var: &Var) -> bool {
        (**self).is_inlineable(var)
    }
}

/// Every assignment may go
#[derive(Debug, Clone, Copy, Default)]
pub struct EraseAll;

impl Erasability for EraseAll {
    fn is_erasable(&self, _cmd: &Cmd) -> bool {
        true
    }
}

/// Assignments of the named variables are kept as they are
#[derive(Debug, Clone)]
pub struct PreservedVars<E = EraseAll> {
    names: FxHashSet<Arc<str>>,
    inner: E,
}

impl PreservedVars {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::over(EraseAll, names)
    }
}

impl<E: Erasability> PreservedVars<E> {
    /// Preserve `names` on top of another classifier
    pub fn over<I, S>(inner: E, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|s| Arc::from(s.as_ref())).collect(),
            inner,
        }
    }

    fn preserves(&self, var: &Var) -> bool {
        self.names.contains(&var.name)
    }
}

impl<E: Erasability> Erasability for PreservedVars<E> {
    fn is_erasable(&self, cmd: &Cmd) -> bool {
        !cmd.lhs().is_some_and(|v| self.preserves(v)) && self.inner.is_erasable(cmd)
    }

    fn is_inlineable(&self, var: &Var) -> bool {
        !self.preserves(var) && self.inner.is_inlineable(var)
    }
}

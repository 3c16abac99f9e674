//! Patching domain: staged edits and rewrite counters

use crate::shared::models::Cmd;
use std::collections::BTreeMap;
use std::fmt;

/// What happens to the original command at a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Delete,
    Replace(Cmd),
}

/// All staged edits for one location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocEdits {
    pub before: Vec<Cmd>,
    pub action: Option<EditAction>,
    pub after: Vec<Cmd>,
}

impl LocEdits {
    /// Commands that take the place of `original`
    pub fn apply(self, original: &Cmd, out: &mut Vec<Cmd>) {
        out.extend(self.before);
        match self.action {
            None => out.push(original.clone()),
            Some(EditAction::Delete) => {}
            Some(EditAction::Replace(cmd)) => out.push(cmd),
        }
        out.extend(self.after);
    }
}

/// Per-category rewrite counts of one pass run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteStats {
    counts: BTreeMap<&'static str, usize>,
}

impl RewriteStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&mut self, category: &'static str) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    pub fn get(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Add the counts of another run
    pub fn merge(&mut self, other: &RewriteStats) {
        for (category, n) in &other.counts {
            *self.counts.entry(category).or_insert(0) += n;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}

impl fmt::Display for RewriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return write!(f, "no rewrites");
        }
        for (i, (category, n)) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", category, n)?;
        }
        Ok(())
    }
}

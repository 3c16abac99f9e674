//! Program locations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Block identifier
pub type BlockId = u32;

/// Position of a command: block plus index inside the block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub block: BlockId,
    pub pos: usize,
}

impl Loc {
    pub fn new(block: BlockId, pos: usize) -> Self {
        Self { block, pos }
    }

    /// First command of `block`
    pub fn start_of(block: BlockId) -> Self {
        Self { block, pos: 0 }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}:{}", self.block, self.pos)
    }
}

//! Result of one pass or of the whole driver

use crate::features::patching::RewriteStats;
use crate::shared::models::Program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutput {
    pub program: Program,
    pub stats: RewriteStats,
}

impl PassOutput {
    /// The program as it came in, nothing rewritten
    pub fn unchanged(program: &Program) -> Self {
        Self {
            program: program.clone(),
            stats: RewriteStats::new(),
        }
    }
}

//! Hook for the scalarization pass run between the two cone-of-influence passes

use crate::errors::Result;
use crate::shared::models::Program;

pub trait Scalarizer: Send + Sync {
    fn scalarize(&self, program: Program) -> Result<Program>;
}

/// Leaves bytemaps as they are
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScalarization;

impl Scalarizer for NoScalarization {
    fn scalarize(&self, program: Program) -> Result<Program> {
        Ok(program)
    }
}

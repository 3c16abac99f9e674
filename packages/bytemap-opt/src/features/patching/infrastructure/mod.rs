//! Patching infrastructure

pub mod patching_program;

pub use patching_program::PatchingProgram;

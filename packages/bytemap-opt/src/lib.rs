/*
 * Bytemap Optimizer
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : The three-address IR (Program, Block, Cmd, Expr)
 * - features/    : Vertical slices (data_flow → intervals → patching → bytemaps)
 * - config/      : Presets and YAML configuration
 *
 * Passes over loop-free programs with byte-addressable maps:
 * - BytemapInliner: resolves loads to the stored value, value-numbers words
 * - BytemapConeOfInf: drops stores and copies no load can observe
 */

#![allow(clippy::type_complexity)] // Nested dataflow maps
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use config::{BytemapConfig, Preset};
pub use errors::{BytemapError, Result};
pub use features::bytemaps::{
    optimize_bytemaps, optimize_bytemaps_with, BytemapConeOfInf, BytemapInliner, EraseAll,
    Erasability, NoScalarization, PassOutput, PreservedVars, Scalarizer,
};
pub use features::patching::RewriteStats;
pub use shared::models::{Block, BlockId, Cmd, Expr, Loc, Program, Sort, Symbol, Var};

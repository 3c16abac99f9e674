/*
 * Bytemaps
 *
 * Optimizations of byte-addressable memory over a loop-free program.
 *
 * Architecture:
 * - Domain: Term (linear, mod 2^256), UniqueVar, Query, PassOutput
 * - Ports: Erasability, Scalarizer
 * - Infrastructure: TermFactory, BytemapCmdHandler, BytemapInliner, BytemapConeOfInf
 * - Application: optimize_bytemaps driver
 *
 * Both passes read one program snapshot and stage their edits in a
 * PatchingProgram, committed once at the end.
 */

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{optimize_bytemaps, optimize_bytemaps_with};
pub use domain::{PassOutput, Query, Term, UniqueVar};
pub use infrastructure::{
    BytemapCmd, BytemapCmdHandler, BytemapConeOfInf, BytemapInliner, LongCopy, TermFactory,
};
pub use ports::{EraseAll, Erasability, NoScalarization, PreservedVars, Scalarizer};

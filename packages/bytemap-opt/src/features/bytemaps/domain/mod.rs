//! Bytemap domain: linear terms, load queries and pass results

mod pass_output;
mod term;

pub use pass_output::PassOutput;
pub use term::{Query, Term, UniqueVar};

//! Shared models: the three-address IR the passes read and rewrite

mod cmd;
mod expr;
mod location;
mod program;
mod symbol;

pub use cmd::Cmd;
pub use expr::{BinaryOp, BuiltIn, Expr, NaryOp};
pub use location::{BlockId, Loc};
pub use program::{Block, Program};
pub use symbol::{Sort, Symbol, Var};

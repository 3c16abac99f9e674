/*
 * Bytemap Infrastructure
 *
 * - TermFactory: terms of symbols and expressions, three-valued comparisons
 * - cmd_handler: closed dispatch over the bytemap command shapes
 * - BytemapConeOfInf: backward pass deleting unobserved commands
 * - BytemapInliner: forward pass resolving loads and reusing values
 */

pub mod cmd_handler;
pub mod cone_of_influence;
pub mod inliner;
pub mod term_factory;

pub use cmd_handler::{BytemapCmd, BytemapCmdHandler, LongCopy};
pub use cone_of_influence::BytemapConeOfInf;
pub use inliner::BytemapInliner;
pub use term_factory::TermFactory;

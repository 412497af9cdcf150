//! metaL parser: pulls tokens from the lexer and reduces them into
//! operator trees allocated in the node graph, one top-level statement at
//! a time.

mod parse_expr;
mod parser;

pub use parse_expr::MAX_NESTING_DEPTH;
pub use parser::{is_incomplete, Parser, Statement};

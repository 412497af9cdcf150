//! metaL tree-walking evaluator.
//!
//! Executes operator trees straight out of the node graph against a live
//! VM environment, one statement at a time, the moment the parser
//! completes it.

mod builtins;
mod classes;
mod evaluator;
mod vm;

pub use builtins::STACK_COMMANDS;
pub use classes::CLASSES;
pub use evaluator::{apply, evaluate};
pub use vm::{Flow, Outcome, Replay, Vm, VM_NAME};

//! Shared types for the metaL engine.
//!
//! This crate defines the node arena that carries metaL syntax, values and
//! environments alike, the dump serializer, source spans, and the error
//! types used across all stages.

mod dump;
mod error;
mod graph;
mod span;
pub mod node;

pub use dump::DumpMode;
pub use error::{ErrorCategory, ErrorCode, MetalError, NodeError, NodeResult};
pub use graph::Graph;
pub use node::{Kind, NativeFn, Node, NodeId, Payload, Scalar};
pub use span::{SourceFile, Span};

//! Canonical indented-text dump of a node subtree.
//!
//! ```text
//! \n<vm:metaL> @0
//! \n\tvm = <vm:metaL> @0 _/
//! \n\tdup = <command:dup> @1
//! \n\t0 = <integer:1> @9
//! ```
//!
//! Each node is a newline, one tab per depth level, an optional prefix
//! (`key = ` for slots, `index = ` for sequence elements) and a
//! `<kind:value>` header. Slots come first in insertion order, then the
//! sequence. A node already rendered anywhere earlier in the same dump is
//! closed with ` _/` and not expanded again, so cyclic graphs terminate.

use crate::node::NodeId;
use crate::Graph;
use std::collections::HashSet;

/// Whether identity handles appear in headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    /// Headers carry the node's `@id`.
    Full,
    /// No ids: reproducible output for golden comparisons.
    Test,
}

impl Graph {
    /// Dump the subtree rooted at `id`.
    pub fn dump(&self, id: NodeId, mode: DumpMode) -> String {
        let mut out = String::new();
        let mut done = HashSet::new();
        // explicit work stack: runtime graphs can nest arbitrarily deep
        let mut pending = vec![(id, 0, String::new())];
        while let Some((id, depth, prefix)) = pending.pop() {
            out.push('\n');
            out.extend(std::iter::repeat('\t').take(depth));
            out.push_str(&self.head(id, &prefix, mode));
            if !done.insert(id) {
                out.push_str(" _/");
                continue;
            }
            let node = self.node(id);
            let slots = node
                .slots
                .iter()
                .map(|(key, child)| (*child, depth + 1, format!("{key} = ")));
            let sequence = node
                .sequence
                .iter()
                .enumerate()
                .map(|(idx, child)| (*child, depth + 1, format!("{idx} = ")));
            let children: Vec<_> = slots.chain(sequence).collect();
            pending.extend(children.into_iter().rev());
        }
        out
    }

    /// Shorthand for a [`DumpMode::Test`] dump.
    pub fn test_dump(&self, id: NodeId) -> String {
        self.dump(id, DumpMode::Test)
    }

    /// `<kind:value>` header, prefixed, without the leading newline/padding.
    pub fn head(&self, id: NodeId, prefix: &str, mode: DumpMode) -> String {
        let node = self.node(id);
        let mut header = format!("{prefix}<{}:{}>", node.kind(), node.display_value());
        if mode == DumpMode::Full {
            header.push(' ');
            header.push_str(&id.to_string());
        }
        header
    }
}

//! Node arena plus the slot and stack operations every node supports.

use crate::node::{Kind, NativeFn, Node, NodeId, Payload, Scalar};
use crate::{NodeError, NodeResult};

/// Owner of every node. Nodes refer to each other by [`NodeId`] only.
///
/// Nodes unreachable from a root are reclaimed by [`Graph::collect`]; their
/// ids go on a free list and are handed out again by later allocations.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    /// Reclaimed ids, reused last-in first-out.
    free: Vec<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a plain node of `kind`.
    pub fn alloc(&mut self, kind: Kind, value: impl Into<Scalar>) -> NodeId {
        self.insert(Node::new(kind, value.into(), Payload::None))
    }

    /// Allocate a Command node named `name` wrapping `f`.
    pub fn command(&mut self, name: &str, f: NativeFn) -> NodeId {
        self.insert(Node::new(Kind::Command, name.into(), Payload::Native(f)))
    }

    /// Allocate a Class node constructing nodes of `kind`, named by its tag.
    pub fn class(&mut self, kind: Kind) -> NodeId {
        self.insert(Node::new(Kind::Class, kind.tag().into(), Payload::Class(kind)))
    }

    /// Allocate a fresh node of `kind` with the same scalar as `source`.
    pub fn alloc_like(&mut self, kind: Kind, source: NodeId) -> NodeId {
        let value = self.node(source).value.clone();
        self.alloc(kind, value)
    }

    fn insert(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots the arena has grown to, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Reclaim every node not reachable from `root` through slots and
    /// sequences. Returns how many nodes were freed.
    ///
    /// Ids of reachable nodes are unchanged. Any other id held by the caller
    /// is stale afterwards and may name a different node once reused.
    pub fn collect(&mut self, root: NodeId) -> usize {
        let mut live = vec![false; self.nodes.len()];
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if std::mem::replace(&mut live[id.index()], true) {
                continue;
            }
            let node = &self.nodes[id.index()];
            pending.extend(node.slots.iter().map(|(_, child)| *child));
            pending.extend(node.sequence.iter().copied());
        }
        for id in &self.free {
            live[id.index()] = true;
        }
        let dead: Vec<NodeId> = (0..self.nodes.len())
            .rev()
            .filter(|&i| !live[i])
            .map(NodeId)
            .collect();
        for id in &dead {
            self.nodes[id.index()] = Node::new(Kind::Object, Scalar::Empty, Payload::None);
        }
        self.free.extend(&dead);
        dead.len()
    }

    /// Borrow a node.
    ///
    /// Ids are only minted by this arena, so an id stays valid until a
    /// [`Graph::collect`] finds its node unreachable.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> Kind {
        self.node(id).kind()
    }

    // ── Slots ─────────────────────────────────────────────────────────────

    /// `node[key]`.
    pub fn get(&self, id: NodeId, key: &str) -> NodeResult<NodeId> {
        self.node(id)
            .slot(key)
            .ok_or_else(|| NodeError::MissingKey(key.to_string()))
    }

    /// `node[key] = child`. Overwriting keeps the key's original position.
    pub fn set(&mut self, id: NodeId, key: &str, child: NodeId) -> NodeId {
        let slots = &mut self.node_mut(id).slots;
        match slots.iter().position(|(k, _)| k == key) {
            Some(at) => slots[at].1 = child,
            None => slots.push((key.to_string(), child)),
        }
        id
    }

    /// Store `child` under its own kind tag.
    pub fn tag_store(&mut self, id: NodeId, child: NodeId) -> NodeId {
        let key = self.kind(child).tag();
        self.set(id, key, child)
    }

    /// Store `child` under its own scalar value.
    pub fn named_store(&mut self, id: NodeId, child: NodeId) -> NodeId {
        let key = self.node(child).key();
        self.set(id, &key, child)
    }

    // ── Sequence / stack ─────────────────────────────────────────────────

    /// Append `child` to the sequence.
    pub fn push(&mut self, id: NodeId, child: NodeId) -> NodeId {
        self.node_mut(id).sequence.push(child);
        id
    }

    fn require(&self, id: NodeId, op: &'static str, needed: usize) -> NodeResult<usize> {
        let found = self.node(id).sequence.len();
        if found < needed {
            Err(NodeError::EmptyStack { op, needed, found })
        } else {
            Ok(found)
        }
    }

    /// Peek at the last element.
    pub fn top(&self, id: NodeId) -> NodeResult<NodeId> {
        let len = self.require(id, "top", 1)?;
        Ok(self.node(id).sequence[len - 1])
    }

    /// Peek at the element below the top.
    pub fn second(&self, id: NodeId) -> NodeResult<NodeId> {
        let len = self.require(id, "second", 2)?;
        Ok(self.node(id).sequence[len - 2])
    }

    /// Remove and return the last element.
    pub fn pop(&mut self, id: NodeId) -> NodeResult<NodeId> {
        self.require(id, "pop", 1)?;
        self.node_mut(id)
            .sequence
            .pop()
            .ok_or(NodeError::EmptyStack { op: "pop", needed: 1, found: 0 })
    }

    /// Remove and return the element below the top.
    pub fn pop_second(&mut self, id: NodeId) -> NodeResult<NodeId> {
        let len = self.require(id, "pop_second", 2)?;
        Ok(self.node_mut(id).sequence.remove(len - 2))
    }

    /// `a b -- a b b`
    pub fn dup(&mut self, id: NodeId) -> NodeResult<NodeId> {
        let top = self.top(id)?;
        Ok(self.push(id, top))
    }

    /// `a b -- a`
    pub fn drop(&mut self, id: NodeId) -> NodeResult<NodeId> {
        self.pop(id)?;
        Ok(id)
    }

    /// `a b -- b a`
    pub fn swap(&mut self, id: NodeId) -> NodeResult<NodeId> {
        self.require(id, "swap", 2)?;
        let second = self.pop_second(id)?;
        Ok(self.push(id, second))
    }

    /// `a b -- a b a`
    pub fn over(&mut self, id: NodeId) -> NodeResult<NodeId> {
        let second = self.second(id)?;
        Ok(self.push(id, second))
    }

    /// `a b -- b`
    pub fn press(&mut self, id: NodeId) -> NodeResult<NodeId> {
        self.require(id, "press", 2)?;
        self.pop_second(id)?;
        Ok(id)
    }

    /// Empty the sequence. Never fails.
    pub fn clear(&mut self, id: NodeId) -> NodeId {
        self.node_mut(id).sequence.clear();
        id
    }
}

//! The VM: root environment, top-level stack, and REPL driver.
//!
//! A [`Vm`] owns the node graph. Its root node is at once the symbol
//! environment (slots) and the result stack (sequence), and it stores
//! itself under `vm`. Source chunks are replayed through [`Vm::execute`]:
//! every statement runs as soon as the parser completes it.

use metal_parser::{Parser, Statement};
use metal_types::{DumpMode, Graph, Kind, MetalError, NodeId, NodeResult, SourceFile};

use crate::evaluator::evaluate;
use crate::{builtins, classes};

/// Name of every fresh VM.
pub const VM_NAME: &str = "metaL";

/// How a chunk reacts to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// A runtime error skips the failing statement; a lexical or syntax
    /// error drops the rest of the chunk. The session goes on either way.
    Interactive,
    /// The first error of any kind stops the run.
    Batch,
}

/// Whether the session should keep going after a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// `??` or `.end` was executed.
    Exit,
}

/// Result of replaying one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub flow: Flow,
    /// Diagnostics, in the order they were raised.
    pub errors: Vec<MetalError>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A live metaL session.
#[derive(Debug, Clone)]
pub struct Vm {
    graph: Graph,
    root: NodeId,
    /// Dumps produced by `?` / `??`, waiting for the host to collect them.
    output: Vec<String>,
}

impl Vm {
    /// A fresh VM named [`VM_NAME`] with the stack commands and classes
    /// registered and the `vm` self-reference in place.
    pub fn new() -> Self {
        let mut graph = Graph::new();
        let root = graph.alloc(Kind::Vm, VM_NAME);
        graph.tag_store(root, root);
        builtins::install(&mut graph, root);
        classes::install(&mut graph, root);
        Self {
            graph,
            root,
            output: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The VM's result stack, bottom first.
    pub fn stack(&self) -> &[NodeId] {
        &self.graph.node(self.root).sequence
    }

    // ── Replay ────────────────────────────────────────────────────────────

    /// Parse and run `source` statement by statement.
    ///
    /// Statements ahead of a malformed one have already run when the error
    /// is reported; nothing is rolled back. Once the chunk is done, nodes no
    /// longer reachable from the root are reclaimed, so ids the host kept
    /// for such nodes go stale.
    pub fn execute(&mut self, source: &SourceFile, replay: Replay) -> Outcome {
        let outcome = self.replay(source, replay);
        self.graph.collect(self.root);
        outcome
    }

    fn replay(&mut self, source: &SourceFile, replay: Replay) -> Outcome {
        let mut parser = Parser::new(source);
        let mut errors = Vec::new();
        loop {
            let statement = match parser.next_statement(&mut self.graph) {
                Ok(Some(statement)) => statement,
                Ok(None) => break,
                Err(err) => {
                    errors.push(err);
                    break;
                }
            };
            match self.step(statement) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    return Outcome {
                        flow: Flow::Exit,
                        errors,
                    }
                }
                Err(err) => {
                    errors.push(MetalError::runtime(source, &err, statement.span()));
                    if replay == Replay::Batch {
                        break;
                    }
                }
            }
        }
        Outcome {
            flow: Flow::Continue,
            errors,
        }
    }

    /// Shorthand for [`Vm::execute`] on a named string.
    pub fn run(&mut self, name: &str, text: &str, replay: Replay) -> Outcome {
        self.execute(&SourceFile::new(name, text), replay)
    }

    /// Run one statement against the root.
    fn step(&mut self, statement: Statement) -> NodeResult<Flow> {
        match statement {
            Statement::Expr { node, .. } => {
                let result = evaluate(&mut self.graph, node, self.root)?;
                if self.graph.kind(result) == Kind::Command {
                    // a command handed back as a value runs on the VM
                    evaluate(&mut self.graph, result, self.root)?;
                } else {
                    self.graph.push(self.root, result);
                }
            }
            Statement::Clear(_) => {
                self.graph.clear(self.root);
            }
            Statement::Print(_) => self.print(),
            Statement::PrintExit(_) => {
                self.print();
                return Ok(Flow::Exit);
            }
            Statement::End(_) => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn print(&mut self) {
        let dump = self.graph.test_dump(self.root);
        self.output.push(dump);
    }

    /// Take everything printed so far.
    pub fn drain_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    // ── Lookup & rendering ────────────────────────────────────────────────

    /// The root's binding for `name`.
    pub fn get(&self, name: &str) -> NodeResult<NodeId> {
        self.graph.get(self.root, name)
    }

    /// Follow a slash-separated path of slot keys from the root:
    /// `IP`, `vm/vm/PORT`. Empty segments are skipped.
    pub fn resolve(&self, path: &str) -> NodeResult<NodeId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root, |node, key| self.graph.get(node, key))
    }

    /// Test-mode dump of `node` (no identity handles).
    pub fn dump(&self, node: NodeId) -> String {
        self.graph.test_dump(node)
    }

    /// Full dump of `node`, identity handles included: the hook hosts use
    /// to display a value.
    pub fn render(&self, node: NodeId) -> String {
        self.graph.dump(node, DumpMode::Full)
    }

    /// `<kind:value>` header of `node`.
    pub fn head(&self, node: NodeId) -> String {
        self.graph.head(node, "", DumpMode::Test)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_vm_header_and_self_reference() {
        let vm = Vm::new();
        assert_eq!(vm.head(vm.root()), "<vm:metaL>");
        assert_eq!(vm.get("vm"), Ok(vm.root()));
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_fresh_vm_slot_order() {
        let vm = Vm::new();
        let keys: Vec<_> = vm
            .graph()
            .node(vm.root())
            .slots
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(
            keys,
            [
                "vm", "dup", "drop", "swap", "over", "press", "dropall", "file", "ip", "port",
                "url", "email", "vector", "dict", "stack", "queue", "set",
            ]
        );
    }

    #[test]
    fn test_render_carries_ids() {
        let vm = Vm::new();
        let dup = vm.get("dup").unwrap();
        assert!(vm.render(dup).starts_with("\n<command:dup> @"));
        assert_eq!(vm.dump(dup), "\n<command:dup>");
    }

    #[test]
    fn test_resolve_through_self_reference() {
        let vm = Vm::new();
        assert_eq!(vm.resolve("vm/vm/dup"), vm.get("dup"));
        assert_eq!(vm.resolve(""), Ok(vm.root()));
        assert!(vm.resolve("vm/missing").is_err());
    }

    #[test]
    fn test_arena_stays_bounded_across_chunks() {
        let mut vm = Vm::new();
        vm.run("t", "x = 1 ;", Replay::Interactive);
        let settled = vm.graph().len();
        for _ in 0..1000 {
            let outcome = vm.run("t", "x = 1 ;", Replay::Interactive);
            assert!(outcome.is_ok());
        }
        assert_eq!(vm.graph().len(), settled);
        assert!(vm.graph().capacity() <= settled + 3);
        assert_eq!(vm.dump(vm.get("x").unwrap()), "\n<integer:1>");
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_collect_keeps_stack_and_bindings() {
        let mut vm = Vm::new();
        vm.run("t", "v = [a b]\n`(p // q)\n1", Replay::Batch);
        let before: Vec<_> = vm.stack().iter().map(|&n| vm.dump(n)).collect();
        let v = vm.get("v").unwrap();
        vm.run("t", "", Replay::Batch);
        assert_eq!(vm.get("v"), Ok(v));
        let after: Vec<_> = vm.stack().iter().map(|&n| vm.dump(n)).collect();
        assert_eq!(before, after);
        assert_eq!(
            after[1],
            "\n<op://>\n\t0 = <symbol:p>\n\t1 = <symbol:q>"
        );
    }

    #[test]
    fn test_drain_output_empties_buffer() {
        let mut vm = Vm::new();
        vm.run("t", "?", Replay::Batch);
        assert_eq!(vm.drain_output().len(), 1);
        assert!(vm.drain_output().is_empty());
    }
}

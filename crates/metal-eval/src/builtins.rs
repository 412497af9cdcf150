//! Native stack commands registered in every fresh VM.
//!
//! Evaluated bare (`dup`), a command works on the VM's own stack. Applied
//! (`dup : s`), it works on the operand's sequence instead. Either way it
//! returns the stack it changed.

use metal_types::{Graph, NativeFn, NodeId, NodeResult};

/// Name and native function of every stack command, in registration order.
pub static STACK_COMMANDS: &[(&str, NativeFn)] = &[
    ("dup", dup_top),
    ("drop", drop_top),
    ("swap", swap_top2),
    ("over", copy_second),
    ("press", drop_second),
    ("dropall", drop_all),
];

/// Register every stack command in `vm`, keyed by name.
pub(crate) fn install(graph: &mut Graph, vm: NodeId) {
    for &(name, f) in STACK_COMMANDS {
        let command = graph.command(name, f);
        graph.named_store(vm, command);
    }
}

fn dup_top(graph: &mut Graph, env: NodeId, target: Option<NodeId>) -> NodeResult<NodeId> {
    graph.dup(target.unwrap_or(env))
}

fn drop_top(graph: &mut Graph, env: NodeId, target: Option<NodeId>) -> NodeResult<NodeId> {
    graph.drop(target.unwrap_or(env))
}

fn swap_top2(graph: &mut Graph, env: NodeId, target: Option<NodeId>) -> NodeResult<NodeId> {
    graph.swap(target.unwrap_or(env))
}

fn copy_second(graph: &mut Graph, env: NodeId, target: Option<NodeId>) -> NodeResult<NodeId> {
    graph.over(target.unwrap_or(env))
}

fn drop_second(graph: &mut Graph, env: NodeId, target: Option<NodeId>) -> NodeResult<NodeId> {
    graph.press(target.unwrap_or(env))
}

fn drop_all(graph: &mut Graph, env: NodeId, target: Option<NodeId>) -> NodeResult<NodeId> {
    Ok(graph.clear(target.unwrap_or(env)))
}

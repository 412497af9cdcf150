//! Per-kind `evaluate` and `apply`.

use metal_types::{Graph, Kind, NodeError, NodeId, NodeResult, Payload};

/// Evaluate `node` against the environment `env`.
///
/// Primitives and containers are values already; a Symbol resolves through
/// the environment's slots; an Op node runs its operator; a Command runs
/// its native function with no operand. Everything else has no
/// evaluation rule.
pub fn evaluate(graph: &mut Graph, node: NodeId, env: NodeId) -> NodeResult<NodeId> {
    match graph.kind(node) {
        Kind::Symbol => lookup(graph, node, env),
        kind if kind.is_primitive() || kind.is_container() => Ok(node),
        Kind::Op => eval_op(graph, node, env),
        Kind::Command => {
            let payload = graph.node(node).payload();
            match payload {
                Payload::Native(f) => f(graph, env, None),
                _ => Err(not_evaluable(graph, node)),
            }
        }
        _ => Err(not_evaluable(graph, node)),
    }
}

/// Apply `callee` to `operand`: the `:` operator.
///
/// A Command runs its native function on the operand; a Class builds a
/// fresh node of its kind carrying the operand's scalar.
pub fn apply(graph: &mut Graph, callee: NodeId, operand: NodeId, env: NodeId) -> NodeResult<NodeId> {
    let payload = graph.node(callee).payload();
    match payload {
        Payload::Native(f) => f(graph, env, Some(operand)),
        Payload::Class(kind) => Ok(graph.alloc_like(kind, operand)),
        Payload::None => Err(NodeError::NotApplicable(describe(graph, callee))),
    }
}

fn lookup(graph: &Graph, symbol: NodeId, env: NodeId) -> NodeResult<NodeId> {
    let name = graph.node(symbol).key();
    graph
        .node(env)
        .slot(&name)
        .ok_or(NodeError::UnboundSymbol(name))
}

fn eval_op(graph: &mut Graph, op: NodeId, env: NodeId) -> NodeResult<NodeId> {
    let glyph = graph.node(op).key();
    let operands = graph.node(op).sequence.clone();
    match (glyph.as_str(), operands.as_slice()) {
        // quote: hand back the operand untouched
        ("`", [operand]) => Ok(*operand),
        ("=", [target, value]) => {
            let name = target_name(graph, *target, env)?;
            let value = evaluate(graph, *value, env)?;
            graph.set(env, &name, value);
            Ok(value)
        }
        (glyph @ ("//" | "<<" | ">>" | ":"), [left, right]) => {
            let left = evaluate(graph, *left, env)?;
            let right = evaluate(graph, *right, env)?;
            match glyph {
                "//" => Ok(graph.push(left, right)),
                "<<" => Ok(graph.tag_store(left, right)),
                ">>" => Ok(graph.named_store(left, right)),
                _ => apply(graph, left, right, env),
            }
        }
        _ => Err(NodeError::UnknownOperator(glyph.clone())),
    }
}

/// The key an `=` binds: a bare symbol names itself, anything else is
/// evaluated and its scalar becomes the key.
fn target_name(graph: &mut Graph, target: NodeId, env: NodeId) -> NodeResult<String> {
    if graph.kind(target) == Kind::Symbol {
        return Ok(graph.node(target).key());
    }
    let named = evaluate(graph, target, env)?;
    Ok(graph.node(named).key())
}

fn not_evaluable(graph: &Graph, node: NodeId) -> NodeError {
    NodeError::NotEvaluable(describe(graph, node))
}

/// `kind:value`, the dump header without its brackets.
fn describe(graph: &Graph, node: NodeId) -> String {
    let node = graph.node(node);
    format!("{}:{}", node.kind(), node.display_value())
}

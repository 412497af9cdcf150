//! The universal graph node and its variant tags.
//!
//! Every metaL datum (source syntax, runtime value, environment) is a
//! [`Node`] living in a [`Graph`] arena and addressed by a [`NodeId`].
//! Children are referenced by id, so a node may be shared between many
//! slots and sequences, and cycles (the VM storing itself) cost nothing
//! at the ownership level.

use crate::{Graph, NodeResult};
use std::fmt;

/// Stable handle of a node inside its [`Graph`].
///
/// Two distinct nodes never share an id; ids are the identity used for
/// cycle detection in dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index of the node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{:x}", self.0)
    }
}

/// Variant tag of a node. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Bare node: no evaluation rule.
    Object,

    // ── Primitives ──
    Symbol,
    String,
    Number,
    Integer,
    Hex,
    Bin,

    // ── Containers ──
    Vector,
    Dict,
    Stack,
    Queue,
    Set,

    // ── Active ──
    Command,
    Op,
    Vm,

    // ── Meta ──
    Class,

    // ── IO / Net ──
    File,
    Ip,
    Port,
    Url,
    Email,
}

/// Every kind, in declaration order.
pub const ALL_KINDS: &[Kind] = &[
    Kind::Object,
    Kind::Symbol,
    Kind::String,
    Kind::Number,
    Kind::Integer,
    Kind::Hex,
    Kind::Bin,
    Kind::Vector,
    Kind::Dict,
    Kind::Stack,
    Kind::Queue,
    Kind::Set,
    Kind::Command,
    Kind::Op,
    Kind::Vm,
    Kind::Class,
    Kind::File,
    Kind::Ip,
    Kind::Port,
    Kind::Url,
    Kind::Email,
];

impl Kind {
    /// The textual tag: dump header prefix and `<<` slot key.
    pub fn tag(self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Symbol => "symbol",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::Hex => "hex",
            Kind::Bin => "bin",
            Kind::Vector => "vector",
            Kind::Dict => "dict",
            Kind::Stack => "stack",
            Kind::Queue => "queue",
            Kind::Set => "set",
            Kind::Command => "command",
            Kind::Op => "op",
            Kind::Vm => "vm",
            Kind::Class => "class",
            Kind::File => "file",
            Kind::Ip => "ip",
            Kind::Port => "port",
            Kind::Url => "url",
            Kind::Email => "email",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Kind> {
        ALL_KINDS.iter().copied().find(|k| k.tag() == tag)
    }

    /// Self-evaluating leaves (Symbol is a primitive too, but resolves by lookup).
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Kind::Symbol
                | Kind::String
                | Kind::Number
                | Kind::Integer
                | Kind::Hex
                | Kind::Bin
                | Kind::Ip
                | Kind::Port
                | Kind::Url
                | Kind::Email
        )
    }

    pub fn is_container(self) -> bool {
        matches!(
            self,
            Kind::Vector | Kind::Dict | Kind::Stack | Kind::Queue | Kind::Set
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The scalar payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Empty => Ok(()),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

/// Render a float as the shortest round-trip decimal, keeping a `.0` on
/// integral values and switching to `e+NN` / `e-NN` outside
/// `1e-4 <= |x| < 1e16`.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = x.abs();
    if x != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{x:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => text,
        };
    }
    if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

fn format_radix(n: i64, prefix: &str, digits: impl Fn(u64) -> String) -> String {
    let sign = if n < 0 { "-" } else { "" };
    format!("{sign}{prefix}{}", digits(n.unsigned_abs()))
}

/// Native function bound to a Command node.
///
/// Called with the graph, the environment node, and the operand when the
/// command is applied with `:` (`None` when it is evaluated bare).
pub type NativeFn = fn(&mut Graph, NodeId, Option<NodeId>) -> NodeResult<NodeId>;

/// Behavior attached to Active and Meta nodes.
#[derive(Clone, Copy)]
pub enum Payload {
    None,
    /// Command: the wrapped native function.
    Native(NativeFn),
    /// Class: the kind it constructs.
    Class(Kind),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::None => write!(f, "None"),
            Payload::Native(_) => write!(f, "Native(<fn>)"),
            Payload::Class(kind) => write!(f, "Class({kind})"),
        }
    }
}

/// A graph node: scalar value, keyed slots, ordered sequence.
#[derive(Debug, Clone)]
pub struct Node {
    kind: Kind,
    pub value: Scalar,
    /// Named children, in insertion order. Keys are unique.
    pub slots: Vec<(String, NodeId)>,
    /// Ordered children: AST operands, vector elements, stack contents.
    pub sequence: Vec<NodeId>,
    payload: Payload,
}

impl Node {
    pub(crate) fn new(kind: Kind, value: Scalar, payload: Payload) -> Self {
        Self {
            kind,
            value,
            slots: Vec::new(),
            sequence: Vec::new(),
            payload,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn payload(&self) -> Payload {
        self.payload
    }

    /// Slot lookup without the error path.
    pub fn slot(&self, key: &str) -> Option<NodeId> {
        self.slots.iter().find(|(k, _)| k == key).map(|(_, id)| *id)
    }

    /// The scalar as a slot key (`=` targets, `>>` keys).
    pub fn key(&self) -> String {
        self.value.to_string()
    }

    /// The value as shown in a dump header.
    pub fn display_value(&self) -> String {
        match (self.kind, &self.value) {
            (Kind::String, Scalar::Text(s)) => escape_controls(s),
            (Kind::Hex, Scalar::Int(n)) => format_radix(*n, "0x", |u| format!("{u:x}")),
            (Kind::Bin, Scalar::Int(n)) => format_radix(*n, "0b", |u| format!("{u:b}")),
            (_, value) => value.to_string(),
        }
    }
}

fn escape_controls(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

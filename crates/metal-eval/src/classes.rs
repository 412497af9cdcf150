//! Class registry: the kinds a script may construct with `tag : value`.

use metal_types::{Graph, Kind, NodeId};

/// Every constructible kind. Each is registered in a fresh VM under its tag.
pub static CLASSES: &[Kind] = &[
    Kind::File,
    Kind::Ip,
    Kind::Port,
    Kind::Url,
    Kind::Email,
    Kind::Vector,
    Kind::Dict,
    Kind::Stack,
    Kind::Queue,
    Kind::Set,
];

/// Register a Class node for every entry of [`CLASSES`] in `vm`.
pub(crate) fn install(graph: &mut Graph, vm: NodeId) {
    for &kind in CLASSES {
        let class = graph.class(kind);
        graph.named_store(vm, class);
    }
}

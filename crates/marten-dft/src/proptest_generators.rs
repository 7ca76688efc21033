//! Proptest strategies for generating well-formed `FaultTree` instances.

use proptest::prelude::*;

use crate::tree::{BasicEvent, FaultTree, Gate, GateKind, Node, NodeId};

/// Strategy for a translatable gate kind.
pub fn arb_supported_gate_kind() -> impl Strategy<Value = GateKind> {
    prop_oneof![
        Just(GateKind::Or),
        Just(GateKind::And),
        Just(GateKind::PriorityAnd),
        Just(GateKind::WarmSpare),
    ]
}

/// Strategy for a well-formed fault tree suitable for property testing.
///
/// Generated trees have:
/// - 1–6 basic events (arena slots 0..n_be), each with a failure rate and
///   an optional repair rate
/// - 1–5 gates of supported kinds, appended after the basic events
/// - gate children drawn only from earlier arena slots, so the graph is
///   acyclic by construction; sharing arises naturally
/// - the last gate as top node
pub fn arb_fault_tree() -> impl Strategy<Value = FaultTree> {
    (1..=6usize, 1..=5usize)
        .prop_flat_map(|(n_be, n_gates)| {
            let rates = proptest::collection::vec(
                (1e-4..1.0f64, proptest::option::of(1e-3..1.0f64)),
                n_be,
            );
            let kinds = proptest::collection::vec(arb_supported_gate_kind(), n_gates);
            let raw_children = proptest::collection::vec(
                proptest::collection::vec(0..1000usize, 1..=3),
                n_gates,
            );
            (Just(n_be), rates, kinds, raw_children)
        })
        .prop_map(|(n_be, rates, kinds, raw_children)| {
            let mut nodes: Vec<Node> = Vec::new();
            for (i, (failure_rate, repair_rate)) in rates.into_iter().enumerate() {
                nodes.push(Node::Basic(BasicEvent {
                    name: format!("BE{i}"),
                    failure_rate,
                    repair_rate,
                    span: None,
                }));
            }
            for (i, (kind, raw)) in kinds.into_iter().zip(raw_children).enumerate() {
                // Children may only point at earlier slots.
                let limit = n_be + i;
                let mut children: Vec<NodeId> =
                    raw.into_iter().map(|c| c % limit).collect();
                children.sort_unstable();
                children.dedup();
                nodes.push(Node::Gate(Gate {
                    name: format!("G{i}"),
                    kind,
                    children,
                    span: None,
                }));
            }
            let top = nodes.len() - 1;
            FaultTree::new(nodes, top).expect("generated tree is structurally valid")
        })
}

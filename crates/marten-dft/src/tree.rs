use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A unique identifier for a node: its position in the tree's node arena.
pub type NodeId = usize;

/// Byte-offset span into the DFT source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The kind of a gate node.
///
/// Only a subset of the recognized kinds can currently be translated into
/// synchronization rules; the rest are kept so upstream passes can name
/// them precisely in diagnostics. Adding a variant forces a decision in
/// every exhaustive match over the kind, in particular in the rule
/// builder's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateKind {
    Or,
    And,
    PriorityAnd,
    /// Warm spare pool. The only kind with dynamic activation: claiming a
    /// shared child must be observable by the child's other parents.
    WarmSpare,
    PhasedOr,
    HotSpare,
    ColdSpare,
    Sequence,
    Voting,
    FunctionalDependency,
    Transfer,
}

impl GateKind {
    /// Short kind tag used in rule names and module references.
    pub fn tag(&self) -> &'static str {
        match self {
            GateKind::Or => "OR",
            GateKind::And => "AND",
            GateKind::PriorityAnd => "PAND",
            GateKind::WarmSpare => "WSP",
            GateKind::PhasedOr => "POR",
            GateKind::HotSpare => "HSP",
            GateKind::ColdSpare => "CSP",
            GateKind::Sequence => "SEQ",
            GateKind::Voting => "VOT",
            GateKind::FunctionalDependency => "FDEP",
            GateKind::Transfer => "TRANSFER",
        }
    }

    /// Whether activating a shared child of this gate must be broadcast to
    /// the child's other parents.
    pub fn uses_dynamic_activation(&self) -> bool {
        matches!(self, GateKind::WarmSpare)
    }

    /// Whether the rule builder can translate this kind.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            GateKind::Or | GateKind::And | GateKind::PriorityAnd | GateKind::WarmSpare
        )
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A leaf failure event, parameterized by a failure rate and, for
/// repairable leaves, a repair rate.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicEvent {
    pub name: String,
    pub failure_rate: f64,
    pub repair_rate: Option<f64>,
    pub span: Option<Span>,
}

/// An internal node combining child failure signals.
///
/// Children are shared, non-owning arena references: a child may be
/// referenced by more than one gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    pub name: String,
    pub kind: GateKind,
    pub children: Vec<NodeId>,
    pub span: Option<Span>,
}

/// A node in the fault tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Basic(BasicEvent),
    Gate(Gate),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Basic(be) => &be.name,
            Node::Gate(g) => &g.name,
        }
    }

    /// Kind tag used in rule names and module references. Basic events all
    /// share the `BE` tag; gates use their kind's tag.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Node::Basic(_) => "BE",
            Node::Gate(g) => g.kind.tag(),
        }
    }

    pub fn as_gate(&self) -> Option<&Gate> {
        match self {
            Node::Gate(g) => Some(g),
            Node::Basic(_) => None,
        }
    }
}

/// Structural faults rejected at tree construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("fault tree has no nodes")]
    Empty,
    #[error("top node ordinal {top} is outside the arena (size {len})")]
    UnresolvedTop { top: NodeId, len: usize },
    #[error("gate `{gate}` references node ordinal {child} outside the arena (size {len})")]
    UnresolvedChild {
        gate: String,
        child: NodeId,
        len: usize,
    },
}

/// A validated fault tree: the node arena plus the designated top node.
///
/// Construction checks that every reference resolves into the arena, so
/// downstream passes can index nodes infallibly. The arena and the ordinal
/// assignment are immutable afterwards; structural rewrite passes run
/// strictly before a tree reaches this type.
#[derive(Debug, Clone, PartialEq)]
pub struct FaultTree {
    nodes: Vec<Node>,
    top: NodeId,
}

impl FaultTree {
    pub fn new(nodes: Vec<Node>, top: NodeId) -> Result<Self, TreeError> {
        if nodes.is_empty() {
            return Err(TreeError::Empty);
        }
        if top >= nodes.len() {
            return Err(TreeError::UnresolvedTop {
                top,
                len: nodes.len(),
            });
        }
        for node in &nodes {
            if let Node::Gate(gate) = node {
                for &child in &gate.children {
                    if child >= nodes.len() {
                        return Err(TreeError::UnresolvedChild {
                            gate: gate.name.clone(),
                            child,
                            len: nodes.len(),
                        });
                    }
                }
            }
        }
        Ok(Self { nodes, top })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn top(&self) -> NodeId {
        self.top
    }

    /// Gates in arena order, paired with their ordinals.
    pub fn gates(&self) -> impl Iterator<Item = (NodeId, &Gate)> {
        self.nodes.iter().enumerate().filter_map(|(id, node)| match node {
            Node::Gate(g) => Some((id, g)),
            Node::Basic(_) => None,
        })
    }

    /// Total number of gate→child edges.
    pub fn edge_count(&self) -> usize {
        self.gates().map(|(_, g)| g.children.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be(name: &str) -> Node {
        Node::Basic(BasicEvent {
            name: name.into(),
            failure_rate: 0.001,
            repair_rate: None,
            span: None,
        })
    }

    fn gate(name: &str, kind: GateKind, children: Vec<NodeId>) -> Node {
        Node::Gate(Gate {
            name: name.into(),
            kind,
            children,
            span: None,
        })
    }

    // ---------------------------------------------------------------
    // GateKind capabilities
    // ---------------------------------------------------------------

    #[test]
    fn only_warm_spare_uses_dynamic_activation() {
        let all = [
            GateKind::Or,
            GateKind::And,
            GateKind::PriorityAnd,
            GateKind::WarmSpare,
            GateKind::PhasedOr,
            GateKind::HotSpare,
            GateKind::ColdSpare,
            GateKind::Sequence,
            GateKind::Voting,
            GateKind::FunctionalDependency,
            GateKind::Transfer,
        ];
        for kind in all {
            assert_eq!(
                kind.uses_dynamic_activation(),
                kind == GateKind::WarmSpare,
                "{kind}"
            );
        }
    }

    #[test]
    fn supported_kinds_are_exactly_the_translatable_four() {
        assert!(GateKind::Or.is_supported());
        assert!(GateKind::And.is_supported());
        assert!(GateKind::PriorityAnd.is_supported());
        assert!(GateKind::WarmSpare.is_supported());
        assert!(!GateKind::Voting.is_supported());
        assert!(!GateKind::ColdSpare.is_supported());
        assert!(!GateKind::Transfer.is_supported());
    }

    #[test]
    fn kind_tags() {
        assert_eq!(GateKind::PriorityAnd.tag(), "PAND");
        assert_eq!(GateKind::WarmSpare.tag(), "WSP");
        assert_eq!(GateKind::FunctionalDependency.tag(), "FDEP");
        assert_eq!(GateKind::And.to_string(), "AND");
    }

    #[test]
    fn basic_events_share_the_be_tag() {
        assert_eq!(be("X").kind_tag(), "BE");
        assert_eq!(gate("G", GateKind::Or, vec![]).kind_tag(), "OR");
    }

    // ---------------------------------------------------------------
    // FaultTree construction
    // ---------------------------------------------------------------

    #[test]
    fn empty_arena_is_rejected() {
        assert_eq!(FaultTree::new(vec![], 0), Err(TreeError::Empty));
    }

    #[test]
    fn top_out_of_range_is_rejected() {
        let err = FaultTree::new(vec![be("A")], 3).unwrap_err();
        assert_eq!(err, TreeError::UnresolvedTop { top: 3, len: 1 });
    }

    #[test]
    fn dangling_child_reference_is_rejected() {
        let nodes = vec![gate("G", GateKind::And, vec![1, 7]), be("A")];
        let err = FaultTree::new(nodes, 0).unwrap_err();
        assert_eq!(
            err,
            TreeError::UnresolvedChild {
                gate: "G".into(),
                child: 7,
                len: 2
            }
        );
    }

    #[test]
    fn shared_children_are_allowed() {
        let nodes = vec![
            gate("TOP", GateKind::Or, vec![1, 2]),
            gate("G1", GateKind::And, vec![3]),
            gate("G2", GateKind::And, vec![3]),
            be("A"),
        ];
        let tree = FaultTree::new(nodes, 0).unwrap();
        assert_eq!(tree.edge_count(), 4);
        assert_eq!(tree.gates().count(), 3);
        assert_eq!(tree.node(3).name(), "A");
    }
}

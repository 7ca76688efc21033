//! Rendezvous data types: sync items, sync rules, and the finished rule set.

use std::collections::BTreeMap;

use marten_dft::tree::NodeId;

/// One participant's role in a multi-way rendezvous.
///
/// The argument is `0` when the participant refers to itself and
/// `1 + child-index` when a gate refers to a specific child slot. The
/// sender flag on `Activate` marks the origin of the activation; it is
/// merge-lookup metadata only and does not appear in the rendered token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncItem {
    Activate { arg: usize, sender: bool },
    Fail { arg: usize },
}

impl SyncItem {
    pub fn activate(arg: usize, sender: bool) -> Self {
        SyncItem::Activate { arg, sender }
    }

    pub fn fail(arg: usize) -> Self {
        SyncItem::Fail { arg }
    }

    pub fn arg(&self) -> usize {
        match self {
            SyncItem::Activate { arg, .. } | SyncItem::Fail { arg } => *arg,
        }
    }

    /// Whether this participant is the origin of the activation. Fail
    /// items propagate symmetrically and are never senders.
    pub fn is_sender(&self) -> bool {
        match self {
            SyncItem::Activate { sender, .. } => *sender,
            SyncItem::Fail { .. } => false,
        }
    }

    /// Textual sub-label, e.g. `A !1` or `F !0`.
    pub fn render(&self) -> String {
        match self {
            SyncItem::Activate { arg, .. } => format!("A !{arg}"),
            SyncItem::Fail { arg } => format!("F !{arg}"),
        }
    }

    /// Quoted token as it appears in the synchronization table.
    pub fn render_quoted(&self) -> String {
        format!("\"{}\"", self.render())
    }
}

/// A named rendezvous among a sparse set of nodes.
///
/// Participants are keyed by node ordinal, so iteration is strictly
/// increasing and a node never participates twice. `anchor` is the node
/// the rule was created to synchronize on; it is used only while building,
/// to detect sharing, and never reaches the emitted artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRule {
    pub name: String,
    pub hidden: bool,
    pub items: BTreeMap<NodeId, SyncItem>,
    pub anchor: Option<NodeId>,
}

impl SyncRule {
    pub fn new(name: impl Into<String>, hidden: bool) -> Self {
        Self {
            name: name.into(),
            hidden,
            items: BTreeMap::new(),
            anchor: None,
        }
    }

    pub fn anchored(name: impl Into<String>, hidden: bool, anchor: NodeId) -> Self {
        Self {
            name: name.into(),
            hidden,
            items: BTreeMap::new(),
            anchor: Some(anchor),
        }
    }

    /// Insert a participant. The first insertion for a node wins; a later
    /// insert for the same ordinal leaves the rule unchanged.
    pub fn insert(&mut self, node: NodeId, item: SyncItem) {
        self.items.entry(node).or_insert(item);
    }

    /// The first participant marked as sender, with its slot argument.
    pub fn sender(&self) -> Option<(NodeId, usize)> {
        self.items
            .iter()
            .find(|(_, item)| item.is_sender())
            .map(|(&node, item)| (node, item.arg()))
    }

    /// Number of participants marked as sender.
    pub fn sender_count(&self) -> usize {
        self.items.values().filter(|item| item.is_sender()).count()
    }
}

/// The two ordered rule lists produced by the rule builder.
///
/// Append-only during construction; immutable once handed to the emitter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub activation: Vec<SyncRule>,
    pub fail: Vec<SyncRule>,
}

impl RuleSet {
    pub fn len(&self) -> usize {
        self.activation.len() + self.fail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activation.is_empty() && self.fail.is_empty()
    }

    /// All rules in emission order: activation rules first, then fail
    /// rules, each in construction order.
    pub fn iter(&self) -> impl Iterator<Item = &SyncRule> {
        self.activation.iter().chain(self.fail.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // SyncItem rendering
    // ---------------------------------------------------------------

    #[test]
    fn activate_renders_kind_and_argument_only() {
        assert_eq!(SyncItem::activate(0, false).render(), "A !0");
        assert_eq!(SyncItem::activate(3, true).render(), "A !3");
        assert_eq!(SyncItem::activate(1, true).render_quoted(), "\"A !1\"");
    }

    #[test]
    fn fail_renders_kind_and_argument() {
        assert_eq!(SyncItem::fail(2).render(), "F !2");
        assert_eq!(SyncItem::fail(0).render_quoted(), "\"F !0\"");
    }

    #[test]
    fn fail_is_never_a_sender() {
        assert!(!SyncItem::fail(1).is_sender());
        assert!(SyncItem::activate(1, true).is_sender());
        assert!(!SyncItem::activate(1, false).is_sender());
    }

    // ---------------------------------------------------------------
    // SyncRule participant map
    // ---------------------------------------------------------------

    #[test]
    fn first_insert_wins_for_a_node() {
        let mut rule = SyncRule::new("r", true);
        rule.insert(4, SyncItem::activate(1, true));
        rule.insert(4, SyncItem::activate(2, false));
        assert_eq!(rule.items[&4], SyncItem::activate(1, true));
        assert_eq!(rule.items.len(), 1);
    }

    #[test]
    fn sender_is_found_in_ordinal_order() {
        let mut rule = SyncRule::anchored("r", true, 9);
        rule.insert(9, SyncItem::activate(0, false));
        rule.insert(5, SyncItem::activate(2, true));
        rule.insert(1, SyncItem::activate(1, true));
        assert_eq!(rule.sender(), Some((1, 1)));
        assert_eq!(rule.sender_count(), 2);
    }

    #[test]
    fn participants_iterate_in_strictly_increasing_ordinal_order() {
        let mut rule = SyncRule::new("r", false);
        rule.insert(7, SyncItem::fail(1));
        rule.insert(0, SyncItem::fail(2));
        rule.insert(3, SyncItem::fail(0));
        let keys: Vec<usize> = rule.items.keys().copied().collect();
        assert_eq!(keys, [0, 3, 7]);
    }

    #[test]
    fn rule_set_iterates_activation_then_fail() {
        let set = RuleSet {
            activation: vec![SyncRule::new("A_A", false), SyncRule::new("a_x", true)],
            fail: vec![SyncRule::new("F_A", false)],
        };
        let names: Vec<&str> = set.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A_A", "a_x", "F_A"]);
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }
}

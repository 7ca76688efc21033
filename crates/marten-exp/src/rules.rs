//! Synchronization-rule generation for a validated fault tree.
//!
//! Walks every gate→child edge in tree order and produces the activation
//! and fail rendezvous rules that wire the per-node processes together.
//! A child referenced by several parents ends up in exactly one fail rule;
//! its activation wiring depends on whether a claiming parent uses dynamic
//! activation (warm spare pools) or not.

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;

use marten_dft::diagnostics::DiagnosticSink;
use marten_dft::tree::{FaultTree, Gate, GateKind, NodeId};

use crate::sync::{RuleSet, SyncItem, SyncRule};

/// Name of the externally observable top-node activation rendezvous.
pub const TOP_ACTIVATION_RULE: &str = "A_A";
/// Name of the externally observable top-node fail rendezvous.
pub const TOP_FAIL_RULE: &str = "F_A";

/// Diagnostic code reported for gates the builder cannot translate.
pub const UNSUPPORTED_GATE: &str = "marten::exp::unsupported_gate";

/// Internal-consistency faults.
///
/// These indicate a precondition violation by an upstream pass; the
/// current tree's translation stops immediately, because continuing would
/// silently produce an incorrect rendezvous network.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum TranslationError {
    #[error("more than one fail rule synchronizes on node `{node}` (ordinal {id})")]
    #[diagnostic(code(marten::exp::duplicate_fail_rule))]
    DuplicateFailRule { node: String, id: NodeId },

    #[error("activation rule `{rule}` has no sending participant")]
    #[diagnostic(code(marten::exp::missing_sender))]
    MissingSender { rule: String },
}

/// Build the activation and fail rule sets for `tree`.
///
/// Exactly two rules are left visible: the top node's `A_A` and `F_A`.
/// Every other rule encodes internal hand-off protocol and is hidden.
/// Gates of unsupported kinds are reported to `sink` and contribute no
/// rules; the rest of the tree is still translated. Callers must treat
/// the run as failed if `sink.has_errors()` afterwards.
pub fn build_rules(
    tree: &FaultTree,
    sink: &mut DiagnosticSink,
) -> Result<RuleSet, TranslationError> {
    RuleBuilder::new(tree).build(sink)
}

struct RuleBuilder<'a> {
    tree: &'a FaultTree,
    rules: RuleSet,
    /// Child ordinal → indices of activation rules anchored on it, in
    /// creation order.
    open_activation: HashMap<NodeId, Vec<usize>>,
    /// Child ordinal → index of the single fail rule anchored on it.
    open_fail: HashMap<NodeId, usize>,
}

impl<'a> RuleBuilder<'a> {
    fn new(tree: &'a FaultTree) -> Self {
        Self {
            tree,
            rules: RuleSet::default(),
            open_activation: HashMap::new(),
            open_fail: HashMap::new(),
        }
    }

    fn build(mut self, sink: &mut DiagnosticSink) -> Result<RuleSet, TranslationError> {
        self.top_rules();
        let tree = self.tree;
        for (gate_id, gate) in tree.gates() {
            self.gate_rules(gate_id, gate, sink)?;
        }
        Ok(self.rules)
    }

    /// The two distinguished rules binding the top node's external ports.
    /// Neither is anchored, so a gate edge into the top node still gets
    /// its own hand-off rules.
    fn top_rules(&mut self) {
        let top = self.tree.top();

        let mut activate = SyncRule::new(TOP_ACTIVATION_RULE, false);
        activate.insert(top, SyncItem::activate(0, false));
        self.rules.activation.push(activate);

        let mut fail = SyncRule::new(TOP_FAIL_RULE, false);
        fail.insert(top, SyncItem::fail(0));
        self.rules.fail.push(fail);
    }

    fn gate_rules(
        &mut self,
        gate_id: NodeId,
        gate: &Gate,
        sink: &mut DiagnosticSink,
    ) -> Result<(), TranslationError> {
        match gate.kind {
            // The supported kinds all resolve to the generic per-edge
            // protocol below; none adds kind-specific rules.
            GateKind::Or | GateKind::And | GateKind::PriorityAnd | GateKind::WarmSpare => {}
            GateKind::PhasedOr
            | GateKind::HotSpare
            | GateKind::ColdSpare
            | GateKind::Sequence
            | GateKind::Voting
            | GateKind::FunctionalDependency
            | GateKind::Transfer => {
                sink.error_at(
                    gate.span,
                    UNSUPPORTED_GATE,
                    format!("unsupported gate: {} (node `{}`)", gate.kind, gate.name),
                );
                return Ok(());
            }
        }

        for (n, &child_id) in gate.children.iter().enumerate() {
            self.edge_activation_rule(gate_id, gate, n, child_id)?;
            self.edge_fail_rule(gate_id, n, child_id)?;
        }
        Ok(())
    }

    /// Activation hand-off for one gate→child edge.
    fn edge_activation_rule(
        &mut self,
        gate_id: NodeId,
        gate: &Gate,
        n: usize,
        child_id: NodeId,
    ) -> Result<(), TranslationError> {
        let child = self.tree.node(child_id);
        let name = format!(
            "a_{}{}_{}{}",
            gate.kind.tag(),
            gate_id,
            child.kind_tag(),
            child_id
        );
        let mut rule = SyncRule::anchored(name, true, child_id);
        rule.insert(gate_id, SyncItem::activate(n + 1, true));

        // Any rule already anchored on this child means the child has
        // another parent.
        let open = self
            .open_activation
            .get(&child_id)
            .cloned()
            .unwrap_or_default();
        for idx in open {
            let other = &mut self.rules.activation[idx];
            tracing::debug!(
                rule = %other.name,
                child = child_id,
                "child already wired by another parent"
            );
            if gate.kind.uses_dynamic_activation() {
                // The claiming parent listens on the existing rendezvous,
                // and the existing sender listens on the new one. Both
                // parents observe each other's activation without either
                // rule gaining a second sender.
                other.insert(gate_id, SyncItem::activate(n + 1, false));
                let (sender_id, sender_arg) =
                    other.sender().ok_or_else(|| TranslationError::MissingSender {
                        rule: other.name.clone(),
                    })?;
                rule.insert(sender_id, SyncItem::activate(sender_arg, false));
            } else {
                // The claiming parent joins the existing rendezvous as a
                // second sender. Two independent senders can then
                // synchronize with each other; known soundness question,
                // kept as-is.
                tracing::warn!(
                    rule = %other.name,
                    node = gate_id,
                    "second sender merged into activation rule"
                );
                other.insert(gate_id, SyncItem::activate(n + 1, true));
            }
        }

        rule.insert(child_id, SyncItem::activate(0, false));
        self.open_activation
            .entry(child_id)
            .or_default()
            .push(self.rules.activation.len());
        self.rules.activation.push(rule);
        Ok(())
    }

    /// Fail hand-off for one gate→child edge. At most one fail rule may
    /// exist per child; later parents join it.
    fn edge_fail_rule(
        &mut self,
        gate_id: NodeId,
        n: usize,
        child_id: NodeId,
    ) -> Result<(), TranslationError> {
        if let Some(&idx) = self.open_fail.get(&child_id) {
            self.rules.fail[idx].insert(gate_id, SyncItem::fail(n + 1));
            return Ok(());
        }

        let child = self.tree.node(child_id);
        let mut rule = SyncRule::anchored(
            format!("f_{}{}", child.kind_tag(), child_id),
            true,
            child_id,
        );
        rule.insert(gate_id, SyncItem::fail(n + 1));
        rule.insert(child_id, SyncItem::fail(0));
        if self
            .open_fail
            .insert(child_id, self.rules.fail.len())
            .is_some()
        {
            return Err(TranslationError::DuplicateFailRule {
                node: child.name().to_string(),
                id: child_id,
            });
        }
        self.rules.fail.push(rule);
        Ok(())
    }
}

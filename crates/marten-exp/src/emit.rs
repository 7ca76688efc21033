//! EXP document emission for a finished rule set.
//!
//! The document has three regions: a hide list of every internal rule
//! name, a synchronization table with one row per rule and one column per
//! node in ordinal order, and the parallel composition of one precompiled
//! process per node. Row and column order are fixed, so re-running the
//! translation on an unchanged tree yields a byte-identical document.

use indexmap::IndexSet;

use marten_dft::tree::{BasicEvent, FaultTree, Node};

use crate::sync::{RuleSet, SyncRule};

/// Resolution of per-node process references, supplied by the external
/// node builder. Gate modules are keyed by kind tag and child count; all
/// basic events of a kind share one generic leaf module, parameterized by
/// rate renaming at the use site.
pub trait ProcessCatalog {
    fn gate_module(&self, tag: &str, children: usize) -> String;
    fn leaf_module(&self, tag: &str) -> String;
}

/// Default catalog: precompiled BCG modules named `<TAG>_<children>.bcg`
/// for gates and `<TAG>.bcg` for leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcgCatalog;

impl ProcessCatalog for BcgCatalog {
    fn gate_module(&self, tag: &str, children: usize) -> String {
        format!("{tag}_{children}.bcg")
    }

    fn leaf_module(&self, tag: &str) -> String {
        format!("{tag}.bcg")
    }
}

/// Serialize the rule sets and the per-node process terms into the EXP
/// textual form.
pub fn emit(tree: &FaultTree, rules: &RuleSet, catalog: &dyn ProcessCatalog) -> String {
    let columns = tree.len();
    let widths = column_widths(columns, rules);
    let mut out = String::new();

    out.push_str(&format!("(* Number of rules: {} *)\n", rules.len()));

    out.push_str("hide\n");
    let hidden: Vec<&str> = rules
        .iter()
        .filter(|r| r.hidden)
        .map(|r| r.name.as_str())
        .collect();
    for (i, name) in hidden.iter().enumerate() {
        out.push_str("  ");
        out.push_str(name);
        if i + 1 < hidden.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("in\n");

    out.push_str("  label par\n");
    out.push_str("  (*  ");
    for (id, node) in tree.nodes().iter().enumerate() {
        if id > 0 {
            out.push_str("   ");
        }
        out.push_str(&pad(&format!("{}{}", node.kind_tag(), id), widths[id]));
    }
    out.push_str(" *)\n");

    let total = rules.len();
    for (i, rule) in rules.iter().enumerate() {
        out.push_str("    ");
        out.push_str(&sync_line(rule, &widths));
        if i + 1 < total {
            out.push(',');
        }
        out.push('\n');
    }

    out.push_str("  in\n");
    for (id, node) in tree.nodes().iter().enumerate() {
        if id > 0 {
            out.push_str("    ||\n");
        }
        out.push_str("    ");
        out.push_str(&process_term(node, catalog));
        out.push('\n');
    }
    out.push_str("  end par\n");
    out.push_str("end hide\n");
    out
}

/// One-line reduction script for the emitted network, to be run after the
/// composition: minimizes the generated state space before analysis.
pub fn emit_reduction_script(bcg: &str, exp: &str) -> String {
    format!("\"{bcg}\" = smart stochastic branching reduction of \"{exp}\"\n")
}

/// The process modules the emitted document references, in first-use
/// order. The external node builder precompiles exactly these.
pub fn needed_modules(tree: &FaultTree, catalog: &dyn ProcessCatalog) -> IndexSet<String> {
    let mut modules = IndexSet::new();
    for node in tree.nodes() {
        match node {
            Node::Gate(g) => {
                modules.insert(catalog.gate_module(g.kind.tag(), g.children.len()));
            }
            Node::Basic(_) => {
                modules.insert(catalog.leaf_module(node.kind_tag()));
            }
        }
    }
    modules
}

/// One synchronization-table row: the rule's quoted item per column, `_`
/// where the node does not participate, bound to the rule's name.
fn sync_line(rule: &SyncRule, widths: &[usize]) -> String {
    let mut cells = Vec::with_capacity(widths.len());
    for (column, &width) in widths.iter().enumerate() {
        let text = rule
            .items
            .get(&column)
            .map(|item| item.render_quoted())
            .unwrap_or_else(|| "_".to_string());
        cells.push(pad(&text, width));
    }
    format!("{} -> {}", cells.join(" * "), rule.name)
}

/// Per-column maximum rendered-item width, for table alignment.
fn column_widths(columns: usize, rules: &RuleSet) -> Vec<usize> {
    let mut widths = vec![0usize; columns];
    for rule in rules.iter() {
        for (&id, item) in &rule.items {
            widths[id] = widths[id].max(item.render_quoted().len());
        }
    }
    widths
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn process_term(node: &Node, catalog: &dyn ProcessCatalog) -> String {
    match node {
        Node::Gate(g) => format!("\"{}\"", catalog.gate_module(g.kind.tag(), g.children.len())),
        Node::Basic(be) => leaf_term(be, &catalog.leaf_module(node.kind_tag())),
    }
}

/// A basic event is the generic leaf module with its rates embedded by
/// renaming: failure rate always, repair rate only for repairable leaves.
fn leaf_term(be: &BasicEvent, module: &str) -> String {
    let mut renames = format!("\"FRATE !1 !2\" -> \"rate {}\"", be.failure_rate);
    if let Some(repair) = be.repair_rate {
        renames.push_str(&format!(", \"FRATE !1 !1\" -> \"rate {repair}\""));
    }
    format!("total rename {renames} in \"{module}\" end rename")
}

use std::collections::BTreeSet;

use bs_core::{node_value, Node, ScriptDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod checklist;
mod publish;

pub use checklist::{checklist, ChecklistItem, ChecklistResult, ChecklistStatus};
pub use publish::{plan_publish, PublishDecision};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    pub node: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    /// Published value, `null` when the field was absent.
    pub from: Value,
    /// Draft value, `null` when the field was removed.
    pub to: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedNode {
    pub id: String,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub total: usize,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn change_count(&self) -> usize {
        self.added + self.modified + self.removed
    }

    pub fn summary(&self) -> String {
        format!(
            "{} added, {} modified, {} removed",
            self.added, self.modified, self.removed
        )
    }
}

/// Node-level difference between a draft and the published snapshot. Every
/// list is sorted by node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub added: Vec<NodeEntry>,
    pub removed: Vec<NodeEntry>,
    pub modified: Vec<ModifiedNode>,
    pub unchanged: Vec<String>,
    pub stats: DiffStats,
}

impl DiffResult {
    /// Draft equals published.
    pub fn is_empty(&self) -> bool {
        self.stats.change_count() == 0
    }
}

/// Compares two documents. A missing document counts as empty.
pub fn compare(draft: Option<&ScriptDocument>, published: Option<&ScriptDocument>) -> DiffResult {
    let empty = ScriptDocument::new();
    let draft = draft.unwrap_or(&empty);
    let published = published.unwrap_or(&empty);

    let ids = draft
        .node_ids()
        .chain(published.node_ids())
        .collect::<BTreeSet<_>>();

    let mut result = DiffResult::default();
    for id in ids {
        match (draft.get(id), published.get(id)) {
            (Some(node), None) => result.added.push(entry(id, node)),
            (None, Some(node)) => result.removed.push(entry(id, node)),
            (Some(draft_node), Some(published_node)) => {
                let changes = diff_fields(&node_value(draft_node), &node_value(published_node));
                if changes.is_empty() {
                    result.unchanged.push(id.to_string());
                } else {
                    result.modified.push(ModifiedNode {
                        id: id.to_string(),
                        changes,
                    });
                }
            }
            (None, None) => {}
        }
    }

    result.stats = DiffStats {
        total: draft.len(),
        added: result.added.len(),
        modified: result.modified.len(),
        removed: result.removed.len(),
        unchanged: result.unchanged.len(),
    };
    result
}

fn entry(id: &str, node: &Node) -> NodeEntry {
    NodeEntry {
        id: id.to_string(),
        node: node_value(node),
    }
}

fn diff_fields(draft: &Value, published: &Value) -> Vec<FieldChange> {
    let fields = |value: &Value| {
        value
            .as_object()
            .map(|object| object.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default()
    };
    let names = fields(draft)
        .into_iter()
        .chain(fields(published))
        .collect::<BTreeSet<_>>();

    names
        .into_iter()
        .filter_map(|field| {
            let to = draft.get(&field).cloned().unwrap_or(Value::Null);
            let from = published.get(&field).cloned().unwrap_or(Value::Null);
            (from != to).then_some(FieldChange { field, from, to })
        })
        .collect()
}

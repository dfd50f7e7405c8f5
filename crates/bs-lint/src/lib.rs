use std::collections::BTreeSet;
use std::fmt;

use bs_core::{CardCatalog, ScriptDocument, ENTRY_NODE_ID};
use serde::{Deserialize, Serialize};

mod quiz;

pub use quiz::{quiz_stats, QuizStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Success,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

pub fn error_count(issues: &[Issue]) -> usize {
    issues
        .iter()
        .filter(|issue| issue.severity == Severity::Error)
        .count()
}

pub fn warning_count(issues: &[Issue]) -> usize {
    issues
        .iter()
        .filter(|issue| issue.severity == Severity::Warning)
        .count()
}

pub fn validate(document: &ScriptDocument) -> Vec<Issue> {
    validate_with_catalog(document, None)
}

/// Runs every structural check and returns the issues in check order. Card
/// references are only verified when a catalogue is supplied.
pub fn validate_with_catalog(
    document: &ScriptDocument,
    catalog: Option<&CardCatalog>,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    if document.is_empty() {
        issues.push(Issue::new(Severity::Warning, "document has no nodes"));
        return issues;
    }

    if !document.has_entry() {
        issues.push(Issue::new(
            Severity::Error,
            format!("missing entry node \"{}\"", ENTRY_NODE_ID),
        ));
    }

    check_reachability(document, &mut issues);
    check_references(document, &mut issues);
    check_content(document, &mut issues);
    check_endings(document, &mut issues);
    if let Some(catalog) = catalog {
        check_cards(document, catalog, &mut issues);
    }
    quiz::audit(document, &mut issues);

    if error_count(&issues) == 0 && warning_count(&issues) == 0 {
        issues.push(Issue::new(
            Severity::Success,
            format!("all {} nodes passed validation", document.len()),
        ));
    }
    issues
}

/// Score-agnostic reachable set. Choices shadow `next`; `fallbackNext` always counts.
pub fn reachable_from_start(document: &ScriptDocument) -> BTreeSet<String> {
    let mut reachable = BTreeSet::new();
    if !document.has_entry() {
        return reachable;
    }

    let mut stack = vec![ENTRY_NODE_ID.to_string()];
    while let Some(node_id) = stack.pop() {
        if reachable.contains(&node_id) {
            continue;
        }
        let Some(node) = document.get(&node_id) else {
            continue;
        };
        if node.choices.is_empty() {
            stack.extend(node.next_target().map(str::to_string));
        } else {
            stack.extend(
                node.choices
                    .iter()
                    .filter_map(|choice| choice.target())
                    .map(str::to_string),
            );
        }
        stack.extend(node.fallback_target().map(str::to_string));
        reachable.insert(node_id);
    }
    reachable
}

fn check_reachability(document: &ScriptDocument, issues: &mut Vec<Issue>) {
    let reachable = reachable_from_start(document);
    for node_id in document.node_ids() {
        if !reachable.contains(node_id) {
            issues.push(Issue::new(
                Severity::Warning,
                format!("node {} is unreachable from start", node_id),
            ));
        }
    }
}

fn dangling<'a>(document: &ScriptDocument, target: Option<&'a str>) -> Option<&'a str> {
    target.filter(|id| !document.contains(id))
}

fn check_references(document: &ScriptDocument, issues: &mut Vec<Issue>) {
    for (node_id, node) in document.iter() {
        if let Some(target) = dangling(document, node.next_target()) {
            issues.push(Issue::new(
                Severity::Error,
                format!("node {} next points to nonexistent {}", node_id, target),
            ));
        }
        if let Some(target) = dangling(document, node.fallback_target()) {
            issues.push(Issue::new(
                Severity::Error,
                format!("node {} fallbackNext points to nonexistent {}", node_id, target),
            ));
        }
        for (index, choice) in node.choices.iter().enumerate() {
            if let Some(target) = dangling(document, choice.target()) {
                issues.push(Issue::new(
                    Severity::Error,
                    format!(
                        "choice #{} of node {} points to nonexistent {}",
                        index + 1,
                        node_id,
                        target
                    ),
                ));
            }
        }
    }
}

fn check_content(document: &ScriptDocument, issues: &mut Vec<Issue>) {
    for (node_id, node) in document.iter() {
        if !node.has_text() && node.event_kind().is_none() {
            issues.push(Issue::new(
                Severity::Warning,
                format!("node {} has no dialogue and no event", node_id),
            ));
        }
        for (index, choice) in node.choices.iter().enumerate() {
            if choice.label().is_empty() {
                issues.push(Issue::new(
                    Severity::Warning,
                    format!("choice #{} of node {} has no text", index + 1, node_id),
                ));
            }
            if choice.target().is_none() {
                issues.push(Issue::new(
                    Severity::Warning,
                    format!("choice #{} of node {} has no target", index + 1, node_id),
                ));
            }
        }
    }
}

fn check_endings(document: &ScriptDocument, issues: &mut Vec<Issue>) {
    for (node_id, node) in document.iter() {
        if node.is_ending() {
            issues.push(Issue::new(
                Severity::Info,
                format!("node {} is an ending node (no next, no choices)", node_id),
            ));
        }
    }
}

fn check_cards(document: &ScriptDocument, catalog: &CardCatalog, issues: &mut Vec<Issue>) {
    for (node_id, node) in document.iter() {
        if let Some(card_id) = node.card().filter(|card_id| !catalog.contains(card_id)) {
            issues.push(Issue::new(
                Severity::Warning,
                format!("node {} unlocks unknown card {}", node_id, card_id),
            ));
        }
    }
}

#[cfg(test)]
mod tests;

use bs_core::ScriptDocument;
use bs_lint::{error_count, quiz_stats, validate};
use serde::{Deserialize, Serialize};

use crate::DiffResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub status: ChecklistStatus,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistResult {
    pub passed: bool,
    /// Validator errors in the draft.
    pub error_count: usize,
    pub warning_count: usize,
    pub items: Vec<ChecklistItem>,
}

/// Pre-publish report. Warnings never block; only validator errors do.
pub fn checklist(document: &ScriptDocument, diff: &DiffResult) -> ChecklistResult {
    let mut items = Vec::new();
    let mut push = |status, text: String| items.push(ChecklistItem { status, text });

    let errors = error_count(&validate(document));
    if errors == 0 {
        push(
            ChecklistStatus::Pass,
            format!("validation passed ({} nodes)", document.len()),
        );
    } else {
        push(
            ChecklistStatus::Fail,
            format!("validation found {} errors", errors),
        );
    }

    let stats = quiz_stats(document);
    if stats.quiz_count > 0 {
        if stats.is_balanced() {
            push(
                ChecklistStatus::Pass,
                format!("answer distribution balanced ({})", stats.balance_label()),
            );
        } else {
            push(
                ChecklistStatus::Warn,
                format!("answer distribution imbalanced ({})", stats.balance_label()),
            );
        }
    }

    if stats.missing_feedback == 0 {
        push(
            ChecklistStatus::Pass,
            "every quiz choice has feedback".to_string(),
        );
    } else {
        push(
            ChecklistStatus::Warn,
            format!("{} quiz choices are missing feedback", stats.missing_feedback),
        );
    }

    if diff.is_empty() {
        push(
            ChecklistStatus::Info,
            "no changes (draft matches published)".to_string(),
        );
    } else {
        push(
            ChecklistStatus::Pass,
            format!("{} changes ready to publish", diff.stats.change_count()),
        );
    }

    let warning_count = items
        .iter()
        .filter(|item| item.status == ChecklistStatus::Warn)
        .count();
    ChecklistResult {
        passed: errors == 0,
        error_count: errors,
        warning_count,
        items,
    }
}

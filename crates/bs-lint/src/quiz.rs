use bs_core::{Node, ScriptDocument};
use serde::{Deserialize, Serialize};

use crate::{Issue, Severity};

/// Answer tally over every quiz node of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStats {
    pub quiz_count: usize,
    /// Quizzes whose first choice is correct.
    pub first_correct: usize,
    /// Quizzes whose second choice is correct and the first is not.
    pub second_correct: usize,
    pub max_score: i64,
    pub missing_feedback: usize,
}

impl QuizStats {
    pub fn is_balanced(&self) -> bool {
        self.first_correct.abs_diff(self.second_correct) <= 1
    }

    pub fn balance_label(&self) -> String {
        format!(
            "A correct: {} | B correct: {}",
            self.first_correct, self.second_correct
        )
    }
}

pub fn quiz_stats(document: &ScriptDocument) -> QuizStats {
    let mut stats = QuizStats::default();
    for (_, node) in document.iter().filter(|(_, node)| node.is_quiz()) {
        stats.quiz_count += 1;
        stats.max_score = stats.max_score.saturating_add(best_score(node));
        if node.choices.first().is_some_and(|choice| choice.correct()) {
            stats.first_correct += 1;
        } else if node.choices.get(1).is_some_and(|choice| choice.correct()) {
            stats.second_correct += 1;
        }
        stats.missing_feedback += node
            .choices
            .iter()
            .filter(|choice| !choice.has_feedback())
            .count();
    }
    stats
}

fn best_score(node: &Node) -> i64 {
    node.choices
        .iter()
        .map(|choice| choice.score_value())
        .max()
        .unwrap_or(0)
}

pub(crate) fn audit(document: &ScriptDocument, issues: &mut Vec<Issue>) {
    for (node_id, node) in document.iter().filter(|(_, node)| node.is_quiz()) {
        for (index, choice) in node.choices.iter().enumerate() {
            let score = choice.score_value();
            if choice.correct() && score <= 0 {
                issues.push(Issue::new(
                    Severity::Error,
                    format!(
                        "choice #{} of node {} is marked correct but scores {}",
                        index + 1,
                        node_id,
                        score
                    ),
                ));
            }
            if !choice.correct() && score > 0 {
                issues.push(Issue::new(
                    Severity::Error,
                    format!(
                        "choice #{} of node {} is marked incorrect but scores {}",
                        index + 1,
                        node_id,
                        score
                    ),
                ));
            }
            if !choice.has_feedback() {
                issues.push(Issue::new(
                    Severity::Warning,
                    format!("choice #{} of node {} has no feedback", index + 1, node_id),
                ));
            }
        }
    }

    let stats = quiz_stats(document);
    if stats.quiz_count == 0 {
        return;
    }
    issues.push(Issue::new(
        Severity::Info,
        format!(
            "quiz stats: {} quizzes, max score {}",
            stats.quiz_count, stats.max_score
        ),
    ));
    if stats.is_balanced() {
        issues.push(Issue::new(
            Severity::Success,
            format!("answer distribution balanced: {}", stats.balance_label()),
        ));
    } else {
        issues.push(Issue::new(
            Severity::Warning,
            format!("answer distribution imbalanced: {}", stats.balance_label()),
        ));
    }
}

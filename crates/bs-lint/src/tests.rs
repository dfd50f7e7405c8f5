use std::collections::BTreeSet;

use bs_core::{CardCatalog, EngineOutput, PlaySnapshot, ScriptDocument};
use bs_runtime::ScriptEngine;
use serde_json::json;

use super::*;

fn doc(value: serde_json::Value) -> ScriptDocument {
    ScriptDocument::from_value(value).expect("document should parse")
}

fn of(issues: &[Issue], severity: Severity) -> Vec<&str> {
    issues
        .iter()
        .filter(|issue| issue.severity == severity)
        .map(|issue| issue.message.as_str())
        .collect()
}

#[test]
fn dangling_choice_is_the_only_error() {
    let issues = validate(&doc(json!({
        "start": {"text": "hi", "choices": [{"text": "a", "next": "missing"}, {"text": "b", "next": "end"}]},
        "end": {"text": "bye"}
    })));

    assert_eq!(
        of(&issues, Severity::Error),
        vec!["choice #1 of node start points to nonexistent missing"]
    );
    assert_eq!(
        of(&issues, Severity::Info),
        vec!["node end is an ending node (no next, no choices)"]
    );
    assert!(of(&issues, Severity::Success).is_empty());
}

#[test]
fn quiz_scoring_inconsistencies_are_errors() {
    let issues = validate(&doc(json!({
        "start": {"choices": [{"isCorrect": true, "score": 0}, {"isCorrect": false, "score": 50}]}
    })));

    assert_eq!(
        of(&issues, Severity::Error),
        vec![
            "choice #1 of node start is marked correct but scores 0",
            "choice #2 of node start is marked incorrect but scores 50",
        ]
    );
    assert_eq!(error_count(&issues), 2);
}

#[test]
fn empty_document_gets_one_warning() {
    let issues = validate(&ScriptDocument::new());
    assert_eq!(
        issues,
        vec![Issue::new(Severity::Warning, "document has no nodes")]
    );
}

#[test]
fn checks_run_in_category_order() {
    let issues = validate(&doc(json!({
        "intro": {"text": "orphan", "next": "nowhere"},
        "gate": {"condition": {"type": "score_gte", "value": 1}, "next": "intro", "fallbackNext": "gone"}
    })));
    let messages = issues
        .iter()
        .map(|issue| format!("{}: {}", issue.severity, issue.message))
        .collect::<Vec<_>>();

    assert_eq!(
        messages,
        vec![
            "error: missing entry node \"start\"",
            "warning: node gate is unreachable from start",
            "warning: node intro is unreachable from start",
            "error: node gate fallbackNext points to nonexistent gone",
            "error: node intro next points to nonexistent nowhere",
            "warning: node gate has no dialogue and no event",
        ]
    );
}

#[test]
fn fallback_branch_counts_as_reachable() {
    let issues = validate(&doc(json!({
        "start": {"condition": {"type": "score_gte", "value": 100}, "next": "high", "fallbackNext": "low"},
        "high": {"text": "high", "next": "end"},
        "low": {"text": "low", "next": "end"},
        "end": {"event": "chapter_complete"}
    })));
    assert!(!issues
        .iter()
        .any(|issue| issue.message.contains("unreachable")));
}

#[test]
fn unknown_cards_only_flagged_with_catalog() {
    let document = doc(json!({
        "start": {"text": "hi", "unlockCard": "ghost", "next": "end"},
        "end": {"event": "chapter_complete"}
    }));
    assert_eq!(warning_count(&validate(&document)), 0);

    let catalog = CardCatalog::from_ids(["brief"]);
    let issues = validate_with_catalog(&document, Some(&catalog));
    assert_eq!(
        of(&issues, Severity::Warning),
        vec!["node start unlocks unknown card ghost"]
    );
}

#[test]
fn balanced_quizzes_report_stats_and_success() {
    let document = doc(json!({
        "start": {"text": "q1", "choices": [
            {"text": "a", "next": "q2", "isCorrect": true, "score": 10, "feedback": "ok"},
            {"text": "b", "next": "q2", "isCorrect": false, "score": 0, "feedback": "no"}
        ]},
        "q2": {"text": "q2", "choices": [
            {"text": "a", "next": "end", "isCorrect": false, "feedback": "no"},
            {"text": "b", "next": "end", "isCorrect": true, "score": 20, "feedback": "ok"}
        ]},
        "end": {"event": "chapter_complete"}
    }));

    let stats = quiz_stats(&document);
    assert_eq!(stats.quiz_count, 2);
    assert_eq!(stats.first_correct, 1);
    assert_eq!(stats.second_correct, 1);
    assert_eq!(stats.max_score, 30);
    assert_eq!(stats.missing_feedback, 0);

    let issues = validate(&document);
    let messages = issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        messages,
        vec![
            "quiz stats: 2 quizzes, max score 30",
            "answer distribution balanced: A correct: 1 | B correct: 1",
            "all 3 nodes passed validation",
        ]
    );
}

#[test]
fn max_score_saturates_on_extreme_values() {
    let document = doc(json!({
        "start": {"text": "q1", "choices": [
            {"text": "a", "next": "q2", "isCorrect": true, "score": i64::MAX, "feedback": "ok"},
            {"text": "b", "next": "q2", "isCorrect": false, "feedback": "no"}
        ]},
        "q2": {"text": "q2", "choices": [
            {"text": "a", "next": "end", "isCorrect": false, "feedback": "no"},
            {"text": "b", "next": "end", "isCorrect": true, "score": i64::MAX, "feedback": "ok"}
        ]},
        "end": {"event": "chapter_complete"}
    }));

    assert_eq!(quiz_stats(&document).max_score, i64::MAX);
}

#[test]
fn imbalanced_answers_warn() {
    let quiz = |next: &str| {
        json!({"text": "q", "choices": [
            {"text": "a", "next": next, "isCorrect": true, "score": 10, "feedback": "ok"},
            {"text": "b", "next": next, "score": 0, "feedback": "no"}
        ]})
    };
    let document = doc(json!({
        "start": quiz("q2"),
        "q2": quiz("q3"),
        "q3": quiz("end"),
        "end": {"event": "chapter_complete"}
    }));
    let issues = validate(&document);
    assert_eq!(
        of(&issues, Severity::Warning),
        vec!["answer distribution imbalanced: A correct: 3 | B correct: 0"]
    );
}

#[test]
fn validation_is_deterministic() {
    let document = doc(json!({
        "start": {"text": "hi", "choices": [{"text": "", "next": ""}, {"text": "b", "next": "x"}]},
        "z": {"text": "z"},
        "a": {}
    }));
    assert_eq!(validate(&document), validate(&document));
}

fn frame_node(output: &EngineOutput) -> Option<&str> {
    match output {
        EngineOutput::Dialogue { node_id, .. } | EngineOutput::CardUnlocked { node_id, .. } => {
            Some(node_id)
        }
        _ => None,
    }
}

/// Explores every choice path of a chapter and records each node the engine
/// showed a frame for.
fn engine_visited(document: &ScriptDocument) -> BTreeSet<String> {
    let mut visited = BTreeSet::new();
    let mut engine = ScriptEngine::default();
    let first = engine.enter(document.clone(), "main_1");
    visited.extend(frame_node(&first).map(str::to_string));

    let mut pending: Vec<PlaySnapshot> = vec![engine.snapshot().expect("snapshot")];
    let mut seen = BTreeSet::new();
    while let Some(snapshot) = pending.pop() {
        let key = serde_json::to_string(&snapshot).expect("encode");
        if !seen.insert(key) || seen.len() > 500 {
            continue;
        }
        let state = snapshot.state.clone();
        if state.ended {
            continue;
        }

        let choice_count = state
            .current_node_id
            .as_deref()
            .and_then(|id| document.get(id))
            .map(|node| node.choices.len())
            .unwrap_or(0);
        let branches = if state.waiting_for_choice {
            choice_count
        } else {
            1
        };

        for index in 0..branches {
            let mut engine = ScriptEngine::default();
            engine
                .resume(document.clone(), snapshot.clone())
                .expect("resume");
            let output = if state.pending_unlock.is_some() {
                engine.resume_after_unlock().ok()
            } else if state.waiting_for_choice {
                engine.choose(index).ok().map(|outcome| outcome.output)
            } else {
                engine.advance()
            };
            if let Some(output) = output {
                visited.extend(frame_node(&output).map(str::to_string));
                pending.push(engine.snapshot().expect("snapshot"));
            }
        }
    }
    visited
}

#[test]
fn engine_never_visits_beyond_reachable_set() {
    let document = doc(json!({
        "start": {"text": "hi", "unlockCard": "c1", "choices": [
            {"text": "a", "next": "gate", "isCorrect": true, "score": 10},
            {"text": "b", "next": "gate", "score": 0},
            {"text": "c", "next": "missing"}
        ], "next": "shadowed"},
        "gate": {"condition": {"type": "score_gte", "value": 10}, "next": "win", "fallbackNext": "lose"},
        "win": {"text": "win", "next": "end"},
        "lose": {"condition": {"type": "card_unlocked", "cardId": "c1"}, "text": "lose"},
        "end": {"event": "chapter_complete"},
        "shadowed": {"text": "never shown"},
        "island": {"text": "alone"}
    }));

    let reachable = reachable_from_start(&document);
    let visited = engine_visited(&document);
    assert!(visited.contains("win"));
    assert!(visited.contains("lose"));
    assert!(
        visited.is_subset(&reachable),
        "visited {:?} reachable {:?}",
        visited,
        reachable
    );
    assert!(!reachable.contains("island"));
    assert!(!reachable.contains("shadowed"));
}

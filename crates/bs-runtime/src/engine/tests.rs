use std::sync::{Arc, Mutex};

use bs_core::{
    CompletionCause, EndingTable, EngineOutput, PlaySnapshot, RuntimeFallback, ScriptDocument,
};
use serde_json::json;

use crate::{EngineObserver, ObserverEvent, ScriptEngine, ScriptEngineOptions};

fn doc(value: serde_json::Value) -> ScriptDocument {
    ScriptDocument::from_value(value).expect("document should parse")
}

fn node_of(output: &EngineOutput) -> &str {
    match output {
        EngineOutput::Dialogue { node_id, .. } | EngineOutput::CardUnlocked { node_id, .. } => {
            node_id
        }
        other => panic!("expected a node frame, got {:?}", other),
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl EngineObserver for RecordingObserver {
    fn notify(&self, event: &ObserverEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

fn quiz_chapter() -> ScriptDocument {
    doc(json!({
        "start": {"speaker": "Perry", "text": "Welcome", "next": "quiz"},
        "quiz": {
            "text": "Which one?",
            "choices": [
                {"text": "Right", "next": "gate", "isCorrect": true, "score": 30, "feedback": "Yes"},
                {"text": "Wrong", "next": "gate", "isCorrect": false, "score": 0}
            ]
        },
        "gate": {"condition": {"type": "score_gte", "value": 30}, "next": "good", "fallbackNext": "bad"},
        "good": {"text": "Well done", "next": "done"},
        "bad": {"text": "Try harder", "next": "done"},
        "done": {"event": "chapter_complete"}
    }))
}

#[test]
fn plays_dialogue_then_choice_then_condition() {
    let mut engine = ScriptEngine::default();
    let first = engine.enter(quiz_chapter(), "main_1");
    assert!(matches!(
        &first,
        EngineOutput::Dialogue { node_id, speaker, choices, .. }
            if node_id == "start" && speaker.as_deref() == Some("Perry") && choices.is_empty()
    ));

    let quiz = engine.advance().expect("quiz frame");
    assert!(matches!(&quiz, EngineOutput::Dialogue { choices, .. } if choices.len() == 2));
    assert!(engine.is_waiting_for_choice());
    assert!(engine.advance().is_none(), "choices cannot be skipped");

    let outcome = engine.choose(0).expect("choose");
    assert_eq!(outcome.score_delta, 30);
    assert_eq!(outcome.is_correct, Some(true));
    assert_eq!(outcome.feedback.as_deref(), Some("Yes"));
    assert_eq!(node_of(&outcome.output), "good");

    let end = engine.advance().expect("end frame");
    assert_eq!(
        end,
        EngineOutput::ChapterComplete {
            chapter_key: "main_1".to_string(),
            chapter_score: 30,
            total_score: 30,
            cause: CompletionCause::Event {
                node_id: "done".to_string()
            },
        }
    );
    assert!(engine.is_ended());
    assert!(engine.advance().is_none());
    assert_eq!(engine.state().chapter_scores.get("main_1"), Some(&30));
    assert_eq!(engine.state().completed_chapters, vec!["main_1".to_string()]);
}

#[test]
fn failed_condition_takes_fallback_without_a_frame() {
    let mut engine = ScriptEngine::default();
    engine.enter(quiz_chapter(), "main_1");
    engine.advance().expect("quiz");
    let outcome = engine.choose(1).expect("choose");
    assert_eq!(outcome.score_delta, 0);
    assert_eq!(node_of(&outcome.output), "bad");
    assert!(engine.fallbacks().is_empty());
}

#[test]
fn unmet_condition_without_fallback_displays_the_node() {
    let mut engine = ScriptEngine::default();
    let output = engine.enter(
        doc(json!({
            "start": {"condition": {"type": "score_gte", "value": 5}, "text": "Locked", "next": "end"},
            "end": {"text": "bye"}
        })),
        "main_1",
    );
    assert_eq!(node_of(&output), "start");
    assert_eq!(
        engine.fallbacks(),
        &[RuntimeFallback::UnmetConditionWithoutFallback {
            node_id: "start".to_string()
        }]
    );
    assert_eq!(node_of(&engine.advance().expect("next")), "end");
}

#[test]
fn bare_condition_passes_through_when_met() {
    let mut engine = ScriptEngine::default();
    let output = engine.enter(
        doc(json!({
            "start": {"condition": {"type": "score_lt", "value": 5}, "next": "end", "fallbackNext": "other"},
            "end": {"text": "bye"},
            "other": {"text": "other"}
        })),
        "main_1",
    );
    assert_eq!(node_of(&output), "end");
}

#[test]
fn dangling_choice_ends_chapter_with_fallback() {
    let mut engine = ScriptEngine::default();
    engine.enter(
        doc(json!({
            "start": {"text": "hi", "choices": [{"text": "a", "next": "missing"}, {"text": "b", "next": "end"}]},
            "end": {"text": "bye"}
        })),
        "main_2",
    );
    let outcome = engine.choose(0).expect("choose");
    assert!(matches!(
        outcome.output,
        EngineOutput::ChapterComplete {
            cause: CompletionCause::Fallback {
                fallback: RuntimeFallback::MissingNode { ref node_id }
            },
            ..
        } if node_id == "missing"
    ));
    assert_eq!(engine.fallbacks().len(), 1);
}

#[test]
fn missing_next_completes_as_end_of_script() {
    let mut engine = ScriptEngine::default();
    engine.enter(doc(json!({"start": {"text": "only"}})), "main_1");
    assert!(matches!(
        engine.advance(),
        Some(EngineOutput::ChapterComplete {
            cause: CompletionCause::EndOfScript { .. },
            ..
        })
    ));
}

#[test]
fn missing_start_is_not_fatal() {
    let mut engine = ScriptEngine::default();
    let output = engine.enter(doc(json!({"intro": {"text": "x"}})), "main_1");
    assert!(output.is_terminal());
    assert!(engine.is_ended());
}

#[test]
fn card_unlock_suspends_until_acknowledged_and_is_idempotent() {
    let document = doc(json!({
        "start": {"text": "Card!", "unlockCard": "brief", "next": "again"},
        "again": {"text": "Same card", "unlockCard": "brief", "next": "end"},
        "end": {"event": "chapter_complete"}
    }));
    let mut engine = ScriptEngine::default();
    let first = engine.enter(document, "main_1");
    assert!(matches!(&first, EngineOutput::CardUnlocked { card_id, .. } if card_id == "brief"));
    assert!(engine.has_pending_unlock());
    assert!(engine.advance().is_none());

    let shown = engine.resume_after_unlock().expect("ack");
    assert!(matches!(&shown, EngineOutput::Dialogue { text, .. } if text == "Card!"));
    assert!(engine.resume_after_unlock().is_err());

    let again = engine.advance().expect("second node");
    assert!(matches!(&again, EngineOutput::Dialogue { node_id, .. } if node_id == "again"));
    assert_eq!(engine.state().unlocked_cards.len(), 1);
}

#[test]
fn choose_rejects_bad_calls() {
    let mut engine = ScriptEngine::default();
    engine.enter(quiz_chapter(), "main_1");
    assert_eq!(
        engine.choose(0).expect_err("not waiting").code,
        "ENGINE_NO_PENDING_CHOICE"
    );
    engine.advance().expect("quiz");
    assert_eq!(
        engine.choose(9).expect_err("out of range").code,
        "ENGINE_CHOICE_INDEX"
    );
    assert!(engine.is_waiting_for_choice());
}

#[test]
fn score_is_global_with_a_chapter_ledger() {
    let chapter = doc(json!({
        "start": {"text": "q", "choices": [{"text": "a", "next": "end", "isCorrect": true, "score": 20}]},
        "end": {"event": "chapter_complete"}
    }));
    let mut engine = ScriptEngine::default();
    engine.enter(chapter.clone(), "main_1");
    engine.choose(0).expect("choose");
    engine.enter(chapter, "main_2");
    let outcome = engine.choose(0).expect("choose");

    assert!(matches!(
        outcome.output,
        EngineOutput::ChapterComplete { chapter_score: 20, total_score: 40, .. }
    ));
    assert_eq!(engine.state().chapter_scores.get("main_1"), Some(&20));
    assert_eq!(engine.state().chapter_scores.get("main_2"), Some(&20));
}

#[test]
fn huge_scores_saturate_instead_of_overflowing() {
    let chapter = doc(json!({
        "start": {"text": "q", "choices": [{"text": "a", "next": "end", "isCorrect": true, "score": i64::MAX}]},
        "end": {"event": "chapter_complete"}
    }));
    let mut engine = ScriptEngine::default();
    engine.enter(chapter.clone(), "main_1");
    engine.choose(0).expect("choose");
    engine.enter(chapter, "main_2");
    let outcome = engine.choose(0).expect("choose");

    assert_eq!(outcome.score_delta, i64::MAX);
    assert_eq!(engine.state().score, i64::MAX);
    assert!(matches!(
        outcome.output,
        EngineOutput::ChapterComplete { chapter_score: 0, total_score: i64::MAX, .. }
    ));
}

#[test]
fn choice_was_correct_reads_history() {
    let mut engine = ScriptEngine::default();
    engine.enter(quiz_chapter(), "main_1");
    engine.advance().expect("quiz");
    engine.choose(0).expect("choose");

    let output = engine.enter(
        doc(json!({
            "start": {"condition": {"type": "choice_was_correct", "chapterId": "main_1"}, "next": "yes", "fallbackNext": "no"},
            "yes": {"text": "yes"},
            "no": {"text": "no"}
        })),
        "main_2",
    );
    assert_eq!(node_of(&output), "yes");
}

#[test]
fn game_complete_picks_ending_by_score() {
    let endings = EndingTable::from_json_str(
        r#"{"endings": [
            {"id": "low", "title": "Low", "minScore": 0, "maxScore": 9},
            {"id": "high", "title": "High", "minScore": 10, "maxScore": 100}
        ]}"#,
    )
    .expect("endings");
    let observer = Arc::new(RecordingObserver::default());
    let mut engine = ScriptEngine::new(ScriptEngineOptions {
        endings: Some(endings),
        observer: Some(observer.clone() as Arc<dyn EngineObserver>),
    });
    engine.enter(
        doc(json!({
            "start": {"text": "last", "choices": [{"text": "ok", "next": "fin", "isCorrect": true, "score": 15}]},
            "fin": {"event": "game_complete"}
        })),
        "main_5",
    );
    let outcome = engine.choose(0).expect("choose");
    match outcome.output {
        EngineOutput::GameComplete {
            total_score,
            ending,
            ..
        } => {
            assert_eq!(total_score, 15);
            assert_eq!(ending.map(|ending| ending.id), Some("high".to_string()));
        }
        other => panic!("unexpected output {:?}", other),
    }

    let events = observer.events.lock().expect("events").clone();
    assert!(matches!(events.first(), Some(ObserverEvent::ChapterStart { .. })));
    assert!(matches!(
        events.get(1),
        Some(ObserverEvent::ChoiceMade { score_gain: 15, .. })
    ));
    assert!(matches!(
        events.last(),
        Some(ObserverEvent::GameComplete { total_score: 15, .. })
    ));
}

#[test]
fn cyclic_pass_through_hits_guard() {
    let mut engine = ScriptEngine::default();
    let output = engine.enter(
        doc(json!({
            "start": {"condition": {"type": "score_gte", "value": 0}, "next": "loop"},
            "loop": {"condition": {"type": "score_gte", "value": 0}, "next": "start"}
        })),
        "main_1",
    );
    assert!(matches!(
        output,
        EngineOutput::ChapterComplete {
            cause: CompletionCause::Fallback {
                fallback: RuntimeFallback::GuardExceeded { .. }
            },
            ..
        }
    ));
}

#[test]
fn snapshot_resume_continues_at_choice() {
    let mut engine = ScriptEngine::default();
    engine.enter(quiz_chapter(), "main_1");
    engine.advance().expect("quiz");
    let snapshot = engine.snapshot().expect("snapshot");
    let encoded = serde_json::to_string(&snapshot).expect("encode");

    let decoded: PlaySnapshot = serde_json::from_str(&encoded).expect("decode");
    let mut resumed = ScriptEngine::default();
    resumed.resume(quiz_chapter(), decoded).expect("resume");
    assert!(resumed.is_waiting_for_choice());
    let outcome = resumed.choose(0).expect("choose");
    assert_eq!(node_of(&outcome.output), "good");
}

#[test]
fn current_frame_rebuilds_the_visible_frame() {
    let mut engine = ScriptEngine::default();
    assert!(engine.current_frame().is_none());

    let first = engine.enter(
        doc(json!({
            "start": {"text": "Card!", "unlockCard": "brief", "next": "end"},
            "end": {"event": "chapter_complete"}
        })),
        "main_1",
    );
    assert_eq!(engine.current_frame(), Some(first));

    let shown = engine.resume_after_unlock().expect("ack");
    assert_eq!(engine.current_frame(), Some(shown));

    engine.advance().expect("end");
    assert!(engine.current_frame().is_none());
}

#[test]
fn resume_rejects_wrong_schema_and_missing_node() {
    assert_eq!(
        ScriptEngine::default().snapshot().expect_err("not started").code,
        "ENGINE_NOT_STARTED"
    );

    let mut engine = ScriptEngine::default();
    engine.enter(quiz_chapter(), "main_1");
    let mut snapshot = engine.snapshot().expect("snapshot");

    let mut other = ScriptEngine::default();
    let error = other
        .resume(doc(json!({"elsewhere": {"text": "x"}})), snapshot.clone())
        .expect_err("node missing");
    assert_eq!(error.code, "ENGINE_SNAPSHOT_NODE_MISSING");

    snapshot.schema_version = "play-state.v0".to_string();
    let error = other
        .resume(quiz_chapter(), snapshot)
        .expect_err("schema mismatch");
    assert_eq!(error.code, "ENGINE_SNAPSHOT_SCHEMA");
}

#[test]
fn start_new_game_clears_progress() {
    let mut engine = ScriptEngine::default();
    engine.enter(quiz_chapter(), "main_1");
    engine.advance().expect("quiz");
    engine.choose(0).expect("choose");
    engine.start_new_game();
    assert_eq!(engine.state().score, 0);
    assert!(engine.state().choice_history.is_empty());
    assert!(engine.advance().is_none());
}

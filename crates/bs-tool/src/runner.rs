use std::path::Path;

use bs_core::{EngineOutput, RuntimeFallback};
use bs_runtime::{ScriptEngine, ScriptEngineOptions};

use crate::source::{read_chapter, read_endings, read_test_case};
use crate::{BsToolError, ExpectedEvent, TestAction, TestCase};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
    pub fallbacks: Vec<RuntimeFallback>,
}

struct ActionCursor<'a> {
    actions: &'a [TestAction],
    next: usize,
}

impl<'a> ActionCursor<'a> {
    fn take(&mut self, event_index: usize, wanted: &str) -> Result<&'a TestAction, BsToolError> {
        let action = self
            .actions
            .get(self.next)
            .ok_or_else(|| BsToolError::MissingAction {
                event_index,
                wanted: wanted.to_string(),
            })?;
        self.next += 1;
        Ok(action)
    }
}

fn kind_mismatch(event_index: usize, wanted: &str, found: &TestAction) -> BsToolError {
    BsToolError::ActionKindMismatch {
        event_index,
        wanted: wanted.to_string(),
        found: found.kind_name().to_string(),
    }
}

/// Plays the case's chapters on one engine, so score and cards carry over.
pub fn run_case(scripts_dir: &Path, case: &TestCase) -> Result<RunReport, BsToolError> {
    let endings = case
        .endings
        .as_ref()
        .map(|path| read_endings(&scripts_dir.join(path)))
        .transpose()?;
    let mut engine = ScriptEngine::new(ScriptEngineOptions {
        endings,
        observer: None,
    });

    let mut observed_events = Vec::new();
    let mut fallbacks = Vec::new();
    let mut cursor = ActionCursor {
        actions: &case.actions,
        next: 0,
    };
    let mut steps = 0usize;

    'chapters: for chapter_path in &case.chapters {
        let path = scripts_dir.join(chapter_path);
        let document = read_chapter(&path)?;
        let chapter_key = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(chapter_path.as_str())
            .to_string();
        let mut output = engine.enter(document, chapter_key);

        loop {
            steps += 1;
            if steps > MAX_STEPS {
                return Err(BsToolError::StepLimit { limit: MAX_STEPS });
            }

            output = match output {
                EngineOutput::Dialogue {
                    speaker,
                    text,
                    choices,
                    ..
                } => {
                    observed_events.push(ExpectedEvent::Line { speaker, text });
                    if choices.is_empty() {
                        engine.advance().ok_or(BsToolError::Stalled {
                            event_index: observed_events.len() - 1,
                        })?
                    } else {
                        observed_events.push(ExpectedEvent::Choices {
                            choices: choices.into_iter().map(|item| item.text).collect(),
                        });
                        let event_index = observed_events.len() - 1;
                        let outcome = match cursor.take(event_index, "choose")? {
                            TestAction::Choose { index } => engine.choose(*index)?,
                            other => return Err(kind_mismatch(event_index, "choose", other)),
                        };
                        observed_events.push(ExpectedEvent::Picked {
                            score_delta: outcome.score_delta,
                            is_correct: outcome.is_correct,
                        });
                        outcome.output
                    }
                }
                EngineOutput::CardUnlocked { card_id, .. } => {
                    observed_events.push(ExpectedEvent::Unlock { card: card_id });
                    let event_index = observed_events.len() - 1;
                    match cursor.take(event_index, "ack")? {
                        TestAction::Ack => engine.resume_after_unlock()?,
                        other => return Err(kind_mismatch(event_index, "ack", other)),
                    }
                }
                EngineOutput::ChapterComplete {
                    chapter_key,
                    chapter_score,
                    total_score,
                    ..
                } => {
                    observed_events.push(ExpectedEvent::ChapterComplete {
                        chapter: chapter_key,
                        chapter_score,
                        total_score,
                    });
                    fallbacks.extend_from_slice(engine.fallbacks());
                    continue 'chapters;
                }
                EngineOutput::GameComplete {
                    total_score,
                    ending,
                    ..
                } => {
                    observed_events.push(ExpectedEvent::GameComplete {
                        total_score,
                        ending: ending.map(|ending| ending.id),
                    });
                    fallbacks.extend_from_slice(engine.fallbacks());
                    break 'chapters;
                }
            };
        }
    }

    if cursor.next != case.actions.len() {
        return Err(BsToolError::UnusedActions {
            used: cursor.next,
            total: case.actions.len(),
        });
    }

    Ok(RunReport {
        observed_events,
        consumed_actions: cursor.next,
        steps,
        fallbacks,
    })
}

pub fn assert_case(scripts_dir: &Path, case_path: &Path) -> Result<RunReport, BsToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(scripts_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(BsToolError::EventSerialize)?;
        return Err(BsToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(BsToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(BsToolError::EventSerialize)?;
            return Err(BsToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(report)
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("bs-tool-runner-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn case_for(chapters: &[&str], actions: Vec<TestAction>) -> TestCase {
        TestCase {
            schema_version: crate::TESTCASE_SCHEMA_V1.to_string(),
            chapters: chapters.iter().map(|name| name.to_string()).collect(),
            endings: None,
            actions,
            expected_events: Vec::new(),
        }
    }

    fn line(text: &str) -> ExpectedEvent {
        ExpectedEvent::Line {
            speaker: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn run_case_plays_dialogue_only_chapter() {
        let root = temp_dir("text-only");
        write_file(
            &root.join("main_1.json"),
            r#"{"start": {"text": "Hello", "next": "end"}, "end": {"event": "chapter_complete"}}"#,
        );

        let report = run_case(&root, &case_for(&["main_1.json"], vec![])).expect("run");
        assert_eq!(report.consumed_actions, 0);
        assert_eq!(
            report.observed_events,
            vec![
                line("Hello"),
                ExpectedEvent::ChapterComplete {
                    chapter: "main_1".to_string(),
                    chapter_score: 0,
                    total_score: 0,
                },
            ]
        );
    }

    #[test]
    fn run_case_carries_score_across_chapters() {
        let root = temp_dir("two-chapters");
        write_file(
            &root.join("main_1.json"),
            r#"{
  "start": {"text": "Q", "choices": [{"text": "A", "next": "end", "score": 10, "isCorrect": true}]},
  "end": {"event": "chapter_complete"}
}"#,
        );
        write_file(
            &root.join("main_2.json"),
            r#"{
  "start": {"condition": {"type": "score_gte", "value": 10}, "next": "yes", "fallbackNext": "no"},
  "yes": {"text": "Carried", "next": "end"},
  "no": {"text": "Lost", "next": "end"},
  "end": {"event": "game_complete"}
}"#,
        );

        let report = run_case(
            &root,
            &case_for(
                &["main_1.json", "main_2.json"],
                vec![TestAction::Choose { index: 0 }],
            ),
        )
        .expect("run");
        assert_eq!(
            report.observed_events,
            vec![
                line("Q"),
                ExpectedEvent::Choices {
                    choices: vec!["A".to_string()]
                },
                ExpectedEvent::Picked {
                    score_delta: 10,
                    is_correct: Some(true)
                },
                ExpectedEvent::ChapterComplete {
                    chapter: "main_1".to_string(),
                    chapter_score: 10,
                    total_score: 10,
                },
                line("Carried"),
                ExpectedEvent::GameComplete {
                    total_score: 10,
                    ending: None
                },
            ]
        );
    }

    #[test]
    fn run_case_reports_missing_or_wrong_action_kinds() {
        let root = temp_dir("actions");
        write_file(
            &root.join("main_1.json"),
            r#"{
  "start": {"text": "Card", "unlockCard": "brief", "choices": [{"text": "A", "next": "end"}]},
  "end": {"event": "chapter_complete"}
}"#,
        );

        let missing = run_case(&root, &case_for(&["main_1.json"], vec![]))
            .expect_err("missing action should fail");
        assert!(matches!(missing, BsToolError::MissingAction { event_index: 0, .. }));

        let wrong = run_case(
            &root,
            &case_for(&["main_1.json"], vec![TestAction::Choose { index: 0 }]),
        )
        .expect_err("kind mismatch should fail");
        assert!(matches!(wrong, BsToolError::ActionKindMismatch { .. }));

        let wrong_after_ack = run_case(
            &root,
            &case_for(&["main_1.json"], vec![TestAction::Ack, TestAction::Ack]),
        )
        .expect_err("ack at a choice should fail");
        assert!(matches!(
            wrong_after_ack,
            BsToolError::ActionKindMismatch { .. }
        ));

        let played = run_case(
            &root,
            &case_for(
                &["main_1.json"],
                vec![TestAction::Ack, TestAction::Choose { index: 0 }],
            ),
        )
        .expect("ack then choose should pass");
        assert_eq!(played.consumed_actions, 2);
    }

    #[test]
    fn run_case_reports_unused_actions_and_engine_errors() {
        let root = temp_dir("unused");
        write_file(
            &root.join("main_1.json"),
            r#"{"start": {"text": "Q", "choices": [{"text": "A", "next": "end"}]}, "end": {"event": "chapter_complete"}}"#,
        );

        let unused = run_case(
            &root,
            &case_for(
                &["main_1.json"],
                vec![TestAction::Choose { index: 0 }, TestAction::Ack],
            ),
        )
        .expect_err("unused action should fail");
        assert!(matches!(unused, BsToolError::UnusedActions { used: 1, total: 2 }));

        let bad_index = run_case(
            &root,
            &case_for(&["main_1.json"], vec![TestAction::Choose { index: 99 }]),
        )
        .expect_err("invalid choose should fail");
        assert!(matches!(bad_index, BsToolError::Engine(_)));
    }

    #[test]
    fn run_case_collects_runtime_fallbacks() {
        let root = temp_dir("fallbacks");
        write_file(
            &root.join("main_1.json"),
            r#"{"start": {"text": "Q", "choices": [{"text": "A", "next": "gone"}]}}"#,
        );

        let report = run_case(
            &root,
            &case_for(&["main_1.json"], vec![TestAction::Choose { index: 0 }]),
        )
        .expect("run");
        assert_eq!(
            report.fallbacks,
            vec![RuntimeFallback::MissingNode {
                node_id: "gone".to_string()
            }]
        );
    }

    #[test]
    fn run_case_stops_at_the_step_limit() {
        let root = temp_dir("guard");
        write_file(
            &root.join("main_1.json"),
            r#"{"start": {"text": "tick", "next": "tock"}, "tock": {"text": "tock", "next": "start"}}"#,
        );

        let error = run_case(&root, &case_for(&["main_1.json"], vec![]))
            .expect_err("guard should fail");
        assert!(matches!(error, BsToolError::StepLimit { limit: MAX_STEPS }));
    }

    #[test]
    fn assert_case_reports_count_and_value_mismatches() {
        let root = temp_dir("assert");
        write_file(
            &root.join("main_1.json"),
            r#"{"start": {"text": "Hello"}}"#,
        );

        let count_case = root.join("count.case.json");
        write_file(
            &count_case,
            r#"{
  "schemaVersion":"bs-tool-case.v1",
  "chapters":["main_1.json"],
  "expectedEvents":[{"kind":"line","text":"Hello"}]
}"#,
        );
        let count_error = assert_case(&root, &count_case).expect_err("count mismatch should fail");
        assert!(matches!(
            count_error,
            BsToolError::EventCountMismatch { .. }
        ));

        let value_case = root.join("value.case.json");
        write_file(
            &value_case,
            r#"{
  "schemaVersion":"bs-tool-case.v1",
  "chapters":["main_1.json"],
  "expectedEvents":[
    {"kind":"line","text":"Wrong"},
    {"kind":"chapterComplete","chapter":"main_1","chapterScore":0,"totalScore":0}
  ]
}"#,
        );
        let value_error = assert_case(&root, &value_case).expect_err("value mismatch should fail");
        assert!(matches!(value_error, BsToolError::EventMismatch { index: 0, .. }));
    }
}

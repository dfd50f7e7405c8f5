use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "bs-tool-case.v1";

/// A scripted playthrough: chapters played in order on one engine, the
/// player's inputs, and every event the run must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Chapter files relative to the scripts directory.
    pub chapters: Vec<String>,
    #[serde(default)]
    pub endings: Option<String>,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Choose { index: usize },
    Ack,
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::Ack => "ack",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExpectedEvent {
    Line {
        #[serde(default)]
        speaker: Option<String>,
        text: String,
    },
    Choices {
        choices: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Picked {
        score_delta: i64,
        #[serde(default)]
        is_correct: Option<bool>,
    },
    Unlock {
        card: String,
    },
    #[serde(rename_all = "camelCase")]
    ChapterComplete {
        chapter: String,
        chapter_score: i64,
        total_score: i64,
    },
    #[serde(rename_all = "camelCase")]
    GameComplete {
        total_score: i64,
        #[serde(default)]
        ending: Option<String>,
    },
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn action_kind_names_match_the_json_tags() {
        assert_eq!(TestAction::Choose { index: 0 }.kind_name(), "choose");
        assert_eq!(TestAction::Ack.kind_name(), "ack");
    }

    #[test]
    fn minimal_case_fills_in_empty_lists() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "bs-tool-case.v1",
  "chapters": ["main_1.json"]
}"#,
        )
        .expect("minimal case should decode");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert!(parsed.endings.is_none());
        assert!(parsed.actions.is_empty());
        assert!(parsed.expected_events.is_empty());
    }

    #[test]
    fn every_event_kind_decodes() {
        let parsed: Vec<ExpectedEvent> = serde_json::from_str(
            r#"[
  {"kind":"line","speaker":"Perry","text":"a"},
  {"kind":"line","text":"narration"},
  {"kind":"choices","choices":["A"]},
  {"kind":"picked","scoreDelta":10,"isCorrect":true},
  {"kind":"unlock","card":"brief"},
  {"kind":"chapterComplete","chapter":"main_1","chapterScore":10,"totalScore":10},
  {"kind":"gameComplete","totalScore":30,"ending":"ready"}
]"#,
        )
        .expect("event list should decode");

        assert_eq!(parsed.len(), 7);
        assert!(matches!(parsed[1], ExpectedEvent::Line { speaker: None, .. }));
        assert!(matches!(
            parsed[3],
            ExpectedEvent::Picked {
                score_delta: 10,
                is_correct: Some(true)
            }
        ));
        assert!(matches!(parsed[6], ExpectedEvent::GameComplete { .. }));
    }
}

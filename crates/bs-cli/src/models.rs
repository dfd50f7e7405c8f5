use bs_core::{CompletionCause, Ending, EndingTable, PlaySnapshot, ScriptDocument};
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "player-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedChapter {
    pub(crate) script_path: String,
    pub(crate) chapter_key: String,
    pub(crate) endings_path: Option<String>,
    pub(crate) document: ScriptDocument,
    pub(crate) endings: Option<EndingTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) script_path: String,
    pub(crate) chapter_key: String,
    #[serde(default)]
    pub(crate) endings_path: Option<String>,
    pub(crate) snapshot: PlaySnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Choices,
    Unlock,
    ChapterComplete,
    GameComplete,
}

impl BoundaryEvent {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Choices => "CHOICES",
            Self::Unlock => "UNLOCK",
            Self::ChapterComplete => "CHAPTER_COMPLETE",
            Self::GameComplete => "GAME_COMPLETE",
        }
    }

    /// Play can continue from a saved state.
    pub(crate) fn is_resumable(self) -> bool {
        matches!(self, Self::Choices | Self::Unlock)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DialogueLine {
    pub(crate) speaker: Option<String>,
    pub(crate) text: String,
}

/// What the last pick earned, echoed ahead of the next boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChoiceEcho {
    pub(crate) score_delta: i64,
    pub(crate) is_correct: Option<bool>,
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) echo: Option<ChoiceEcho>,
    pub(crate) lines: Vec<DialogueLine>,
    pub(crate) choices: Vec<(usize, String)>,
    pub(crate) card: Option<String>,
    pub(crate) chapter_score: Option<i64>,
    pub(crate) total_score: i64,
    pub(crate) ending: Option<Ending>,
    pub(crate) cause: Option<CompletionCause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

pub(crate) struct LineContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) chapter: &'a LoadedChapter,
}

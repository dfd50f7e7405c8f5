use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Ending;

pub const PLAY_STATE_SCHEMA: &str = "play-state.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RuntimeFallback {
    #[serde(rename_all = "camelCase")]
    MissingNode { node_id: String },
    #[serde(rename_all = "camelCase")]
    UnmetConditionWithoutFallback { node_id: String },
    #[serde(rename_all = "camelCase")]
    GuardExceeded { node_id: String },
}

impl RuntimeFallback {
    pub fn node_id(&self) -> &str {
        match self {
            Self::MissingNode { node_id }
            | Self::UnmetConditionWithoutFallback { node_id }
            | Self::GuardExceeded { node_id } => node_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompletionCause {
    #[serde(rename_all = "camelCase")]
    Event { node_id: String },
    #[serde(rename_all = "camelCase")]
    EndOfScript { node_id: String },
    Fallback { fallback: RuntimeFallback },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineOutput {
    #[serde(rename_all = "camelCase")]
    Dialogue {
        node_id: String,
        speaker: Option<String>,
        avatar: Option<String>,
        text: String,
        choices: Vec<ChoiceItem>,
    },
    #[serde(rename_all = "camelCase")]
    CardUnlocked { node_id: String, card_id: String },
    #[serde(rename_all = "camelCase")]
    ChapterComplete {
        chapter_key: String,
        chapter_score: i64,
        total_score: i64,
        cause: CompletionCause,
    },
    #[serde(rename_all = "camelCase")]
    GameComplete {
        chapter_key: String,
        total_score: i64,
        ending: Option<Ending>,
        cause: CompletionCause,
    },
}

impl EngineOutput {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ChapterComplete { .. } | Self::GameComplete { .. })
    }
}

/// What the player learns right after picking a choice, plus the next frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOutcome {
    pub score_delta: i64,
    pub is_correct: Option<bool>,
    pub feedback: Option<String>,
    pub output: EngineOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub index: usize,
    pub is_correct: bool,
    pub score: i64,
}

/// Mutable play progress, owned by one engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub chapter_key: Option<String>,
    pub current_node_id: Option<String>,
    pub score: i64,
    pub chapter_start_score: i64,
    pub chapter_scores: BTreeMap<String, i64>,
    pub unlocked_cards: BTreeSet<String>,
    pub completed_chapters: Vec<String>,
    /// Keyed `"{chapter}_{node}"`; a replayed node keeps its latest pick.
    pub choice_history: BTreeMap<String, ChoiceRecord>,
    pub pending_unlock: Option<String>,
    pub waiting_for_choice: bool,
    pub ended: bool,
}

impl PlayState {
    pub fn chapter_score(&self) -> i64 {
        self.score.saturating_sub(self.chapter_start_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySnapshot {
    pub schema_version: String,
    pub state: PlayState,
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryEvent {
    ChapterComplete,
    GameComplete,
    Other(String),
}

impl StoryEvent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChapterComplete => "chapter_complete",
            Self::GameComplete => "game_complete",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for StoryEvent {
    fn from(value: &str) -> Self {
        match value {
            "chapter_complete" => Self::ChapterComplete,
            "game_complete" => Self::GameComplete,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Dialogue,
    Event(StoryEvent),
    Conditional(Condition),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Choice {
    pub fn new(text: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            next: Some(next.into()),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_correct(mut self, is_correct: bool) -> Self {
        self.is_correct = Some(is_correct);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn label(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Jump target, ignoring empty strings left behind by the editor.
    pub fn target(&self) -> Option<&str> {
        non_empty(self.next.as_deref())
    }

    pub fn score_value(&self) -> i64 {
        self.score.unwrap_or(0)
    }

    pub fn correct(&self) -> bool {
        self.is_correct.unwrap_or(false)
    }

    pub fn has_feedback(&self) -> bool {
        non_empty(self.feedback.as_deref()).is_some()
    }
}

/// One unit of a branching script.
///
/// Stored JSON has no discriminant: a node is an event node when it carries
/// `event`, a conditional node when it carries `condition`, and a dialogue node
/// otherwise. The presentation and continuation fields are shared by all kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub kind: NodeKind,
    pub speaker: Option<String>,
    pub avatar: Option<String>,
    pub text: Option<String>,
    pub next: Option<String>,
    pub fallback_next: Option<String>,
    pub choices: Vec<Choice>,
    pub unlock_card: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            speaker: None,
            avatar: None,
            text: None,
            next: None,
            fallback_next: None,
            choices: Vec::new(),
            unlock_card: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn dialogue(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::with_kind(NodeKind::Dialogue);
        node.speaker = Some(speaker.into());
        node.text = Some(text.into());
        node
    }

    pub fn narration(text: impl Into<String>) -> Self {
        let mut node = Self::with_kind(NodeKind::Dialogue);
        node.text = Some(text.into());
        node
    }

    pub fn event(event: StoryEvent) -> Self {
        Self::with_kind(NodeKind::Event(event))
    }

    pub fn conditional(
        condition: Condition,
        next: impl Into<String>,
        fallback_next: Option<String>,
    ) -> Self {
        let mut node = Self::with_kind(NodeKind::Conditional(condition));
        node.next = Some(next.into());
        node.fallback_next = fallback_next;
        node
    }

    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_unlock_card(mut self, card_id: impl Into<String>) -> Self {
        self.unlock_card = Some(card_id.into());
        self
    }

    pub fn next_target(&self) -> Option<&str> {
        non_empty(self.next.as_deref())
    }

    pub fn fallback_target(&self) -> Option<&str> {
        non_empty(self.fallback_next.as_deref())
    }

    pub fn card(&self) -> Option<&str> {
        non_empty(self.unlock_card.as_deref())
    }

    pub fn event_kind(&self) -> Option<&StoryEvent> {
        match &self.kind {
            NodeKind::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match &self.kind {
            NodeKind::Conditional(condition) => Some(condition),
            _ => None,
        }
    }

    pub fn has_text(&self) -> bool {
        non_empty(self.text.as_deref()).is_some()
    }

    pub fn has_display_content(&self) -> bool {
        self.has_text() || non_empty(self.speaker.as_deref()).is_some() || !self.choices.is_empty()
    }

    /// No `next`, no choices and no event: the chapter stops here.
    pub fn is_ending(&self) -> bool {
        self.next_target().is_none() && self.choices.is_empty() && self.event_kind().is_none()
    }

    /// At least two choices with one marked correct.
    pub fn is_quiz(&self) -> bool {
        self.choices.len() >= 2 && self.choices.iter().any(Choice::correct)
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    choices: Option<Vec<Choice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unlock_card: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl TryFrom<RawNode> for Node {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let event = raw.event.filter(|event| !event.is_empty());
        let kind = match (event, raw.condition) {
            (Some(_), Some(_)) => {
                return Err("node cannot carry both event and condition".to_string())
            }
            (Some(event), None) => NodeKind::Event(StoryEvent::from(event.as_str())),
            (None, Some(condition)) => NodeKind::Conditional(condition),
            (None, None) => NodeKind::Dialogue,
        };

        Ok(Self {
            kind,
            speaker: raw.speaker,
            avatar: raw.avatar,
            text: raw.text,
            next: raw.next,
            fallback_next: raw.fallback_next,
            choices: raw.choices.unwrap_or_default(),
            unlock_card: raw.unlock_card,
            extra: raw.extra,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let (event, condition) = match node.kind {
            NodeKind::Dialogue => (None, None),
            NodeKind::Event(event) => (Some(event.as_str().to_string()), None),
            NodeKind::Conditional(condition) => (None, Some(condition)),
        };

        Self {
            speaker: node.speaker,
            avatar: node.avatar,
            text: node.text,
            next: node.next,
            choices: (!node.choices.is_empty()).then_some(node.choices),
            event,
            condition,
            fallback_next: node.fallback_next,
            unlock_card: node.unlock_card,
            extra: node.extra,
        }
    }
}

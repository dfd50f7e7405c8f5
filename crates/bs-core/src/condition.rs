use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Guard attached to a conditional node.
///
/// The JSON form is `{ "type": ..., ... }`. Types this crate does not know are
/// kept verbatim in [`Condition::Unknown`] so that documents survive a
/// load/save cycle unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Condition {
    ScoreGte {
        value: f64,
        extra: Map<String, Value>,
    },
    ScoreLt {
        value: f64,
        extra: Map<String, Value>,
    },
    CardUnlocked {
        card_id: String,
        extra: Map<String, Value>,
    },
    ChoiceWasCorrect {
        chapter_id: String,
        extra: Map<String, Value>,
    },
    Unknown {
        raw: Value,
    },
}

impl Condition {
    pub fn score_gte(value: f64) -> Self {
        Self::ScoreGte {
            value,
            extra: Map::new(),
        }
    }

    pub fn score_lt(value: f64) -> Self {
        Self::ScoreLt {
            value,
            extra: Map::new(),
        }
    }

    pub fn card_unlocked(card_id: impl Into<String>) -> Self {
        Self::CardUnlocked {
            card_id: card_id.into(),
            extra: Map::new(),
        }
    }

    pub fn choice_was_correct(chapter_id: impl Into<String>) -> Self {
        Self::ChoiceWasCorrect {
            chapter_id: chapter_id.into(),
            extra: Map::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::ScoreGte { .. } => "score_gte",
            Self::ScoreLt { .. } => "score_lt",
            Self::CardUnlocked { .. } => "card_unlocked",
            Self::ChoiceWasCorrect { .. } => "choice_was_correct",
            Self::Unknown { raw } => raw
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }
}

fn id_like(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Every key of the condition object except `type` and the variant's own key.
fn extra_fields(object: &Map<String, Value>, own_key: &str) -> Map<String, Value> {
    object
        .iter()
        .filter(|(key, _)| key.as_str() != "type" && key.as_str() != own_key)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl From<Value> for Condition {
    fn from(raw: Value) -> Self {
        let Some(object) = raw.as_object() else {
            return Self::Unknown { raw };
        };
        let value = object.get("value").and_then(Value::as_f64);
        let parsed = match object.get("type").and_then(Value::as_str) {
            Some("score_gte") => value.map(|value| Self::ScoreGte {
                value,
                extra: extra_fields(object, "value"),
            }),
            Some("score_lt") => value.map(|value| Self::ScoreLt {
                value,
                extra: extra_fields(object, "value"),
            }),
            Some("card_unlocked") => object
                .get("cardId")
                .and_then(Value::as_str)
                .map(|card_id| Self::CardUnlocked {
                    card_id: card_id.to_string(),
                    extra: extra_fields(object, "cardId"),
                }),
            Some("choice_was_correct") => {
                id_like(object.get("chapterId")).map(|chapter_id| Self::ChoiceWasCorrect {
                    chapter_id,
                    extra: extra_fields(object, "chapterId"),
                })
            }
            _ => None,
        };
        parsed.unwrap_or(Self::Unknown { raw })
    }
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

impl From<Condition> for Value {
    fn from(condition: Condition) -> Self {
        let (type_name, own_key, own_value, mut object) = match condition {
            Condition::ScoreGte { value, extra } => ("score_gte", "value", number_value(value), extra),
            Condition::ScoreLt { value, extra } => ("score_lt", "value", number_value(value), extra),
            Condition::CardUnlocked { card_id, extra } => {
                ("card_unlocked", "cardId", Value::from(card_id), extra)
            }
            Condition::ChoiceWasCorrect { chapter_id, extra } => {
                ("choice_was_correct", "chapterId", Value::from(chapter_id), extra)
            }
            Condition::Unknown { raw } => return raw,
        };
        object.insert("type".to_string(), Value::from(type_name));
        object.insert(own_key.to_string(), own_value);
        Value::Object(object)
    }
}

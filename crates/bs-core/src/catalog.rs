use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScriptError;

/// Known knowledge-card ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardCatalog {
    ids: BTreeSet<String>,
}

impl CardCatalog {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads a card file: a JSON object keyed by card id.
    pub fn from_json_str(raw: &str) -> Result<Self, ScriptError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|error| ScriptError::new("CATALOG_INVALID_JSON", error.to_string()))?;
        let Value::Object(entries) = value else {
            return Err(ScriptError::new(
                "CATALOG_NOT_OBJECT",
                "Knowledge card file must be a JSON object keyed by card id.",
            ));
        };
        Ok(Self::from_ids(entries.into_iter().map(|(id, _)| id)))
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.ids.contains(card_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ending {
    pub id: String,
    pub title: String,
    pub min_score: i64,
    pub max_score: i64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Score-gated endings, checked in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndingTable {
    pub endings: Vec<Ending>,
}

impl EndingTable {
    pub fn from_json_str(raw: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(raw)
            .map_err(|error| ScriptError::new("ENDINGS_INVALID_JSON", error.to_string()))
    }

    /// First ending whose range contains `score`; the last ending when none does.
    pub fn ending_for_score(&self, score: i64) -> Option<&Ending> {
        self.endings
            .iter()
            .find(|ending| score >= ending.min_score && score <= ending.max_score)
            .or_else(|| self.endings.last())
    }

    pub fn ending_by_id(&self, id: &str) -> Option<&Ending> {
        self.endings.iter().find(|ending| ending.id == id)
    }
}

use bs_core::Condition;
use tracing::warn;

use crate::ScriptEngine;

impl ScriptEngine {
    pub(crate) fn evaluate(&self, condition: &Condition) -> bool {
        match condition {
            Condition::ScoreGte { value, .. } => self.state.score as f64 >= *value,
            Condition::ScoreLt { value, .. } => (self.state.score as f64) < *value,
            Condition::CardUnlocked { card_id, .. } => self.state.unlocked_cards.contains(card_id),
            Condition::ChoiceWasCorrect { chapter_id, .. } => {
                let prefix = format!("{}_", chapter_id);
                self.state
                    .choice_history
                    .iter()
                    .find(|(key, _)| key.starts_with(&prefix))
                    .map(|(_, record)| record.is_correct)
                    .unwrap_or(false)
            }
            Condition::Unknown { .. } => {
                warn!(condition = condition.type_name(), "unknown condition type, letting node through");
                true
            }
        }
    }
}

use bs_core::{ChoiceOutcome, ChoiceRecord, CompletionCause, EngineOutput, RuntimeFallback, ScriptError};
use tracing::debug;

use crate::{ObserverEvent, ScriptEngine};

impl ScriptEngine {
    /// Continue without a choice. Returns `None` when nothing may happen yet:
    /// choices are on screen, an unlock awaits acknowledgement, or the chapter
    /// is over.
    pub fn advance(&mut self) -> Option<EngineOutput> {
        if !self.entered
            || self.state.ended
            || self.state.waiting_for_choice
            || self.state.pending_unlock.is_some()
        {
            return None;
        }

        let current = self.state.current_node_id.clone()?;
        let next = self
            .document
            .get(&current)
            .and_then(|node| node.next_target())
            .map(str::to_string);

        Some(match next {
            Some(next) => self.render(&next),
            None => self.complete_chapter(CompletionCause::EndOfScript { node_id: current }),
        })
    }

    pub fn choose(&mut self, index: usize) -> Result<ChoiceOutcome, ScriptError> {
        if !self.state.waiting_for_choice {
            return Err(ScriptError::new(
                "ENGINE_NO_PENDING_CHOICE",
                "No pending choice is available.",
            ));
        }

        let node_id = self.state.current_node_id.clone().ok_or_else(|| {
            ScriptError::new("ENGINE_CHOICE_NODE_MISSING", "Pending choice node is missing.")
        })?;
        let choice = {
            let node = self.document.get(&node_id).ok_or_else(|| {
                ScriptError::at_node(
                    "ENGINE_CHOICE_NODE_MISSING",
                    "Pending choice node is no longer valid.",
                    node_id.clone(),
                )
            })?;
            node.choices.get(index).cloned().ok_or_else(|| {
                ScriptError::at_node(
                    "ENGINE_CHOICE_INDEX",
                    format!("Choice index \"{}\" is out of range.", index),
                    node_id.clone(),
                )
            })?
        };

        let chapter_key = self.state.chapter_key.clone().unwrap_or_default();
        let score_delta = choice.score_value();
        self.state.score = self.state.score.saturating_add(score_delta);
        self.state.choice_history.insert(
            format!("{}_{}", chapter_key, node_id),
            ChoiceRecord {
                index,
                is_correct: choice.correct(),
                score: score_delta,
            },
        );
        self.observer.notify(&ObserverEvent::ChoiceMade {
            chapter_key,
            node_id: node_id.clone(),
            choice_text: choice.label().to_string(),
            score_gain: score_delta,
        });
        debug!(node = %node_id, index, score_delta, "choice made");
        self.state.waiting_for_choice = false;

        let output = match choice.target() {
            Some(target) => self.render(target),
            None => self.complete_with_fallback(RuntimeFallback::MissingNode {
                node_id: String::new(),
            }),
        };

        Ok(ChoiceOutcome {
            score_delta,
            is_correct: choice.is_correct,
            feedback: choice.feedback.clone(),
            output,
        })
    }

    /// Shows the dialogue that was held back while the unlock popup was open.
    pub fn resume_after_unlock(&mut self) -> Result<EngineOutput, ScriptError> {
        let Some(node_id) = self.state.pending_unlock.clone() else {
            return Err(ScriptError::new(
                "ENGINE_NO_PENDING_UNLOCK",
                "No card unlock is waiting for acknowledgement.",
            ));
        };

        Ok(match self.document.get(&node_id).cloned() {
            Some(node) => self.display(&node_id, &node),
            None => self.complete_with_fallback(RuntimeFallback::MissingNode { node_id }),
        })
    }
}

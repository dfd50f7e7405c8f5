use bs_core::{
    ChoiceItem, CompletionCause, EngineOutput, Node, NodeKind, RuntimeFallback, StoryEvent,
};
use tracing::{debug, warn};

use crate::{ObserverEvent, ScriptEngine, MAX_PASS_THROUGH};

impl ScriptEngine {
    pub(crate) fn render(&mut self, node_id: &str) -> EngineOutput {
        let mut target = node_id.to_string();

        for _ in 0..MAX_PASS_THROUGH {
            let Some(node) = self.document.get(&target).cloned() else {
                return self.complete_with_fallback(RuntimeFallback::MissingNode { node_id: target });
            };
            debug!(node = %target, "render");
            self.state.current_node_id = Some(target.clone());

            match &node.kind {
                NodeKind::Event(event) => return self.finish_event(&target, event),
                NodeKind::Conditional(condition) => {
                    if self.evaluate(condition) {
                        if !node.has_display_content() && node.card().is_none() {
                            match node.next_target() {
                                Some(next) => {
                                    target = next.to_string();
                                    continue;
                                }
                                None => {
                                    return self.complete_chapter(CompletionCause::EndOfScript {
                                        node_id: target,
                                    })
                                }
                            }
                        }
                    } else if let Some(fallback) = node.fallback_target() {
                        target = fallback.to_string();
                        continue;
                    } else {
                        self.record_fallback(RuntimeFallback::UnmetConditionWithoutFallback {
                            node_id: target.clone(),
                        });
                    }
                }
                NodeKind::Dialogue => {}
            }

            if let Some(card_id) = node.card() {
                if self.unlock_card(card_id) {
                    self.state.pending_unlock = Some(target.clone());
                    self.state.waiting_for_choice = false;
                    return EngineOutput::CardUnlocked {
                        node_id: target,
                        card_id: card_id.to_string(),
                    };
                }
            }

            return self.display(&target, &node);
        }

        self.complete_with_fallback(RuntimeFallback::GuardExceeded { node_id: target })
    }

    pub(crate) fn display(&mut self, node_id: &str, node: &Node) -> EngineOutput {
        self.state.current_node_id = Some(node_id.to_string());
        self.state.pending_unlock = None;
        self.state.waiting_for_choice = !node.choices.is_empty();
        dialogue_frame(node_id, node)
    }

    fn unlock_card(&mut self, card_id: &str) -> bool {
        if !self.state.unlocked_cards.insert(card_id.to_string()) {
            return false;
        }
        debug!(card = card_id, "card unlocked");
        self.observer.notify(&ObserverEvent::CardUnlocked {
            card_id: card_id.to_string(),
        });
        true
    }

    fn finish_event(&mut self, node_id: &str, event: &StoryEvent) -> EngineOutput {
        let cause = CompletionCause::Event {
            node_id: node_id.to_string(),
        };
        match event {
            StoryEvent::ChapterComplete => self.complete_chapter(cause),
            StoryEvent::GameComplete => self.complete_game(cause),
            StoryEvent::Other(name) => {
                warn!(node = node_id, event = %name, "unknown event, completing chapter");
                self.complete_chapter(cause)
            }
        }
    }

    pub(crate) fn complete_with_fallback(&mut self, fallback: RuntimeFallback) -> EngineOutput {
        self.record_fallback(fallback.clone());
        self.complete_chapter(CompletionCause::Fallback { fallback })
    }

    fn record_fallback(&mut self, fallback: RuntimeFallback) {
        warn!(node = fallback.node_id(), ?fallback, "runtime fallback");
        self.fallbacks.push(fallback);
    }

    pub(crate) fn complete_chapter(&mut self, cause: CompletionCause) -> EngineOutput {
        let (chapter_key, chapter_score) = self.close_chapter();
        self.observer.notify(&ObserverEvent::ChapterComplete {
            chapter_key: chapter_key.clone(),
            chapter_score,
            total_score: self.state.score,
        });

        EngineOutput::ChapterComplete {
            chapter_key,
            chapter_score,
            total_score: self.state.score,
            cause,
        }
    }

    fn complete_game(&mut self, cause: CompletionCause) -> EngineOutput {
        let (chapter_key, _) = self.close_chapter();
        let total_score = self.state.score;
        self.observer.notify(&ObserverEvent::GameComplete {
            total_score,
            unlocked_cards: self.state.unlocked_cards.len(),
        });

        EngineOutput::GameComplete {
            chapter_key,
            total_score,
            ending: self
                .endings
                .as_ref()
                .and_then(|table| table.ending_for_score(total_score))
                .cloned(),
            cause,
        }
    }

    /// Writes the chapter's delta into the ledger and stops traversal.
    fn close_chapter(&mut self) -> (String, i64) {
        let chapter_key = self.state.chapter_key.clone().unwrap_or_default();
        let chapter_score = self.state.chapter_score();

        let entry = self
            .state
            .chapter_scores
            .entry(chapter_key.clone())
            .or_insert(0);
        *entry = entry.saturating_add(chapter_score);
        if !self.state.completed_chapters.contains(&chapter_key) {
            self.state.completed_chapters.push(chapter_key.clone());
        }

        self.state.chapter_start_score = self.state.score;
        self.state.waiting_for_choice = false;
        self.state.pending_unlock = None;
        self.state.ended = true;
        debug!(chapter = %chapter_key, chapter_score, "chapter closed");
        (chapter_key, chapter_score)
    }
}

pub(crate) fn dialogue_frame(node_id: &str, node: &Node) -> EngineOutput {
    EngineOutput::Dialogue {
        node_id: node_id.to_string(),
        speaker: node.speaker.clone(),
        avatar: node.avatar.clone(),
        text: node.text.clone().unwrap_or_default(),
        choices: node
            .choices
            .iter()
            .enumerate()
            .map(|(index, choice)| ChoiceItem {
                index,
                text: choice.label().to_string(),
            })
            .collect(),
    }
}

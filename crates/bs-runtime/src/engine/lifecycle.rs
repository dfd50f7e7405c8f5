use std::sync::Arc;

use bs_core::{
    EngineOutput, PlayState, RuntimeFallback, ScriptDocument, ENTRY_NODE_ID,
};
use tracing::debug;

use crate::{NoopObserver, ObserverEvent, ScriptEngine, ScriptEngineOptions};

impl ScriptEngine {
    pub fn new(options: ScriptEngineOptions) -> Self {
        Self {
            endings: options.endings,
            observer: options
                .observer
                .unwrap_or_else(|| Arc::new(NoopObserver)),
            document: ScriptDocument::new(),
            state: PlayState::default(),
            fallbacks: Vec::new(),
            entered: false,
        }
    }

    pub fn enter(&mut self, document: ScriptDocument, chapter_key: impl Into<String>) -> EngineOutput {
        self.enter_at(document, chapter_key, ENTRY_NODE_ID)
    }

    /// Starts a chapter. Score, cards and the ledger carry over from earlier
    /// chapters of the same session.
    pub fn enter_at(
        &mut self,
        document: ScriptDocument,
        chapter_key: impl Into<String>,
        start_id: &str,
    ) -> EngineOutput {
        let chapter_key = chapter_key.into();
        debug!(chapter = %chapter_key, start = start_id, "entering chapter");

        self.document = document;
        self.fallbacks.clear();
        self.entered = true;
        self.state.chapter_key = Some(chapter_key.clone());
        self.state.current_node_id = Some(start_id.to_string());
        self.state.chapter_start_score = self.state.score;
        self.state.waiting_for_choice = false;
        self.state.pending_unlock = None;
        self.state.ended = false;

        self.observer
            .notify(&ObserverEvent::ChapterStart { chapter_key });
        self.render(start_id)
    }

    /// Forgets all progress, including score and unlocked cards.
    pub fn start_new_game(&mut self) {
        self.document = ScriptDocument::new();
        self.state = PlayState::default();
        self.fallbacks.clear();
        self.entered = false;
    }

    pub fn state(&self) -> &PlayState {
        &self.state
    }

    pub fn document(&self) -> &ScriptDocument {
        &self.document
    }

    /// Fallbacks taken since the chapter was entered.
    pub fn fallbacks(&self) -> &[RuntimeFallback] {
        &self.fallbacks
    }

    pub fn is_waiting_for_choice(&self) -> bool {
        self.state.waiting_for_choice
    }

    pub fn has_pending_unlock(&self) -> bool {
        self.state.pending_unlock.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.state.ended
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new(ScriptEngineOptions::default())
    }
}

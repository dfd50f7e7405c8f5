use std::sync::Arc;

use bs_core::{EndingTable, PlayState, RuntimeFallback, ScriptDocument};

mod engine;

pub const MAX_PASS_THROUGH: usize = 10_000;

/// Side effects the engine reports to the host (analytics, UI toasts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    ChapterStart {
        chapter_key: String,
    },
    ChoiceMade {
        chapter_key: String,
        node_id: String,
        choice_text: String,
        score_gain: i64,
    },
    CardUnlocked {
        card_id: String,
    },
    ChapterComplete {
        chapter_key: String,
        chapter_score: i64,
        total_score: i64,
    },
    GameComplete {
        total_score: i64,
        unlocked_cards: usize,
    },
}

pub trait EngineObserver: Send + Sync {
    fn notify(&self, event: &ObserverEvent);
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {
    fn notify(&self, _event: &ObserverEvent) {}
}

#[derive(Clone, Default)]
pub struct ScriptEngineOptions {
    pub endings: Option<EndingTable>,
    pub observer: Option<Arc<dyn EngineObserver>>,
}

pub struct ScriptEngine {
    endings: Option<EndingTable>,
    observer: Arc<dyn EngineObserver>,

    document: ScriptDocument,
    state: PlayState,
    fallbacks: Vec<RuntimeFallback>,
    entered: bool,
}

use bs_core::{EngineOutput, PlaySnapshot, ScriptDocument, ScriptError, PLAY_STATE_SCHEMA};

use super::step::dialogue_frame;
use crate::ScriptEngine;

impl ScriptEngine {
    pub fn snapshot(&self) -> Result<PlaySnapshot, ScriptError> {
        if !self.entered {
            return Err(ScriptError::new(
                "ENGINE_NOT_STARTED",
                "Cannot snapshot before a chapter was entered.",
            ));
        }

        Ok(PlaySnapshot {
            schema_version: PLAY_STATE_SCHEMA.to_string(),
            state: self.state.clone(),
        })
    }

    pub fn resume(
        &mut self,
        document: ScriptDocument,
        snapshot: PlaySnapshot,
    ) -> Result<(), ScriptError> {
        if snapshot.schema_version != PLAY_STATE_SCHEMA {
            return Err(ScriptError::new(
                "ENGINE_SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema: {}",
                    snapshot.schema_version
                ),
            ));
        }

        let state = snapshot.state;
        if !state.ended {
            let anchor = state
                .pending_unlock
                .as_deref()
                .or(state.current_node_id.as_deref());
            if let Some(node_id) = anchor {
                if !document.contains(node_id) {
                    return Err(ScriptError::at_node(
                        "ENGINE_SNAPSHOT_NODE_MISSING",
                        format!("Snapshot node \"{}\" is not in the document.", node_id),
                        node_id,
                    ));
                }
            }
        }

        self.document = document;
        self.state = state;
        self.fallbacks.clear();
        self.entered = true;
        Ok(())
    }

    /// Frame the player is looking at, rebuilt from state without advancing.
    /// `None` before entering, after the chapter ended, or between frames.
    pub fn current_frame(&self) -> Option<EngineOutput> {
        if !self.entered || self.state.ended {
            return None;
        }
        if let Some(node_id) = &self.state.pending_unlock {
            let card_id = self.document.get(node_id)?.card()?;
            return Some(EngineOutput::CardUnlocked {
                node_id: node_id.clone(),
                card_id: card_id.to_string(),
            });
        }
        let node_id = self.state.current_node_id.as_deref()?;
        let node = self.document.get(node_id)?;
        Some(dialogue_frame(node_id, node))
    }
}

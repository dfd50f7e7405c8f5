use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bs_core::ScriptDocument;
use tracing::{debug, info};

use crate::{
    apply_publish, ChapterKey, ChapterRecord, ChapterSummary, Clock, StoreError, SystemClock,
    VersionStore,
};

pub struct MemoryVersionStore {
    rows: Mutex<BTreeMap<String, ChapterRecord>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            clock,
        }
    }

    fn rows(&self) -> MutexGuard<'_, BTreeMap<String, ChapterRecord>> {
        // Rows are swapped whole, so a poisoned map is still consistent.
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VersionStore for MemoryVersionStore {
    fn get_draft(&self, chapter_key: &str) -> Result<Option<ChapterRecord>, StoreError> {
        chapter_key.parse::<ChapterKey>()?;
        Ok(self.rows().get(chapter_key).cloned())
    }

    fn save_draft(&self, chapter_key: &str, content: &ScriptDocument) -> Result<(), StoreError> {
        chapter_key.parse::<ChapterKey>()?;
        let now = self.clock.now();
        let mut rows = self.rows();
        let record = rows
            .entry(chapter_key.to_string())
            .or_insert_with(|| ChapterRecord::new(chapter_key, now));
        record.content = Some(content.clone());
        record.updated_at = now;
        debug!(chapter = chapter_key, nodes = content.len(), "draft saved");
        Ok(())
    }

    fn publish(
        &self,
        chapter_key: &str,
        note: &str,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        chapter_key.parse::<ChapterKey>()?;
        let now = self.clock.now();
        let mut rows = self.rows();
        let record = rows
            .get_mut(chapter_key)
            .ok_or_else(|| StoreError::NoDraft(chapter_key.to_string()))?;

        let mut next = record.clone();
        let version = apply_publish(&mut next, note, expected_version, now)?;
        *record = next;
        info!(chapter = chapter_key, version, "chapter published");
        Ok(version)
    }

    fn unpublish(&self, chapter_key: &str) -> Result<(), StoreError> {
        chapter_key.parse::<ChapterKey>()?;
        let mut rows = self.rows();
        let record = rows
            .get_mut(chapter_key)
            .ok_or_else(|| StoreError::NotFound(chapter_key.to_string()))?;
        record.published_content = None;
        record.published_at = None;
        info!(chapter = chapter_key, "chapter unpublished");
        Ok(())
    }

    fn list(&self) -> Result<Vec<ChapterSummary>, StoreError> {
        Ok(self.rows().values().map(ChapterRecord::summary).collect())
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bs_core::ScriptDocument;
use tracing::{debug, info};

use crate::{
    apply_publish, ChapterKey, ChapterRecord, ChapterSummary, Clock, StoreError, SystemClock,
    VersionStore,
};

const ROW_EXTENSION: &str = "json";

// Rows go to a temp file and are renamed into place.
pub struct JsonFileStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl JsonFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_clock(root, Arc::new(SystemClock))
    }

    pub fn open_with_clock(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, clock })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn row_path(&self, chapter_key: &str) -> Result<PathBuf, StoreError> {
        let key = chapter_key.parse::<ChapterKey>()?;
        Ok(self.root.join(format!("{}.{}", key, ROW_EXTENSION)))
    }

    fn read_row(&self, chapter_key: &str) -> Result<Option<ChapterRecord>, StoreError> {
        let path = self.row_path(chapter_key)?;
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write_row(&self, record: &ChapterRecord) -> Result<(), StoreError> {
        let path = self.row_path(&record.chapter_key)?;
        let temp = path.with_extension("json.tmp");
        let payload = serde_json::to_string_pretty(record)?;
        fs::write(&temp, payload)?;
        fs::rename(&temp, &path)?;
        debug!(path = %path.display(), "row written");
        Ok(())
    }
}

impl VersionStore for JsonFileStore {
    fn get_draft(&self, chapter_key: &str) -> Result<Option<ChapterRecord>, StoreError> {
        self.read_row(chapter_key)
    }

    fn save_draft(&self, chapter_key: &str, content: &ScriptDocument) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut record = self
            .read_row(chapter_key)?
            .unwrap_or_else(|| ChapterRecord::new(chapter_key, now));
        record.content = Some(content.clone());
        record.updated_at = now;
        self.write_row(&record)
    }

    fn publish(
        &self,
        chapter_key: &str,
        note: &str,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut record = self
            .read_row(chapter_key)?
            .ok_or_else(|| StoreError::NoDraft(chapter_key.to_string()))?;
        let version = apply_publish(&mut record, note, expected_version, self.clock.now())?;
        self.write_row(&record)?;
        info!(chapter = chapter_key, version, "chapter published");
        Ok(version)
    }

    fn unpublish(&self, chapter_key: &str) -> Result<(), StoreError> {
        let mut record = self
            .read_row(chapter_key)?
            .ok_or_else(|| StoreError::NotFound(chapter_key.to_string()))?;
        record.published_content = None;
        record.published_at = None;
        self.write_row(&record)?;
        info!(chapter = chapter_key, "chapter unpublished");
        Ok(())
    }

    fn list(&self) -> Result<Vec<ChapterSummary>, StoreError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ROW_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if stem.parse::<ChapterKey>().is_err() {
                continue;
            }
            if let Some(record) = self.read_row(stem)? {
                summaries.push(record.summary());
            }
        }
        summaries.sort_by(|left, right| left.chapter_key.cmp(&right.chapter_key));
        Ok(summaries)
    }
}

use bs_core::{ScriptDocument, ScriptError};
use chrono::{DateTime, Utc};

mod file;
mod key;
mod memory;
mod record;

pub use file::JsonFileStore;
pub use key::ChapterKey;
pub use memory::MemoryVersionStore;
pub use record::{ChapterRecord, ChapterSummary, PublishStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no draft to publish for {0}")]
    NoDraft(String),
    #[error("chapter {0} not found")]
    NotFound(String),
    #[error("version conflict on {key}: expected {expected}, found {actual}")]
    VersionConflict {
        key: String,
        expected: u64,
        actual: u64,
    },
    #[error("invalid chapter key: {0}")]
    InvalidKey(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoDraft(_) => "STORE_NO_DRAFT",
            Self::NotFound(_) => "STORE_NOT_FOUND",
            Self::VersionConflict { .. } => "STORE_VERSION_CONFLICT",
            Self::InvalidKey(_) => "STORE_INVALID_KEY",
            Self::Io(_) => "STORE_IO",
            Self::Serde(_) => "STORE_SERDE",
        }
    }
}

impl From<StoreError> for ScriptError {
    fn from(error: StoreError) -> Self {
        ScriptError::new(error.code(), error.to_string())
    }
}

pub trait VersionStore: Send + Sync {
    fn get_draft(&self, chapter_key: &str) -> Result<Option<ChapterRecord>, StoreError>;

    fn get_published(&self, chapter_key: &str) -> Result<Option<ScriptDocument>, StoreError> {
        Ok(self
            .get_draft(chapter_key)?
            .and_then(|record| record.published_content))
    }

    fn save_draft(&self, chapter_key: &str, content: &ScriptDocument) -> Result<(), StoreError>;

    // Fails with VersionConflict when `expected_version` no longer matches.
    fn publish(
        &self,
        chapter_key: &str,
        note: &str,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError>;

    fn unpublish(&self, chapter_key: &str) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<ChapterSummary>, StoreError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub(crate) fn apply_publish(
    record: &mut ChapterRecord,
    note: &str,
    expected_version: Option<u64>,
    now: DateTime<Utc>,
) -> Result<u64, StoreError> {
    if let Some(expected) = expected_version {
        if expected != record.version {
            return Err(StoreError::VersionConflict {
                key: record.chapter_key.clone(),
                expected,
                actual: record.version,
            });
        }
    }
    let Some(content) = record.content.clone() else {
        return Err(StoreError::NoDraft(record.chapter_key.clone()));
    };

    record.published_content = Some(content);
    record.version += 1;
    record.publish_note = note.to_string();
    record.published_at = Some(now);
    Ok(record.version)
}

use bs_core::ScriptDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub chapter_key: String,
    pub content: Option<ScriptDocument>,
    pub published_content: Option<ScriptDocument>,
    pub version: u64,
    #[serde(default)]
    pub publish_note: String,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishStatus {
    Draft,
    Published { version: u64 },
    PublishedWithChanges { version: u64 },
}

impl PublishStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Draft => "draft (unpublished)".to_string(),
            Self::Published { version } => format!("v{} published", version),
            Self::PublishedWithChanges { version } => {
                format!("v{} published, draft has changes", version)
            }
        }
    }
}

impl ChapterRecord {
    pub fn new(chapter_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            chapter_key: chapter_key.into(),
            content: None,
            published_content: None,
            version: 0,
            publish_note: String::new(),
            updated_at: now,
            published_at: None,
        }
    }

    pub fn status(&self) -> PublishStatus {
        match &self.published_content {
            None => PublishStatus::Draft,
            Some(published) if self.content.as_ref() == Some(published) => {
                PublishStatus::Published {
                    version: self.version,
                }
            }
            Some(_) => PublishStatus::PublishedWithChanges {
                version: self.version,
            },
        }
    }

    pub fn summary(&self) -> ChapterSummary {
        ChapterSummary {
            chapter_key: self.chapter_key.clone(),
            version: self.version,
            status: self.status(),
            publish_note: self.publish_note.clone(),
            updated_at: self.updated_at,
            published_at: self.published_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub chapter_key: String,
    pub version: u64,
    pub status: PublishStatus,
    pub publish_note: String,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

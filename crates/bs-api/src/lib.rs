use std::sync::Arc;

use bs_core::{EndingTable, EngineOutput, PlaySnapshot, ScriptDocument, ScriptError, ENTRY_NODE_ID};
use bs_diff::{compare, plan_publish, DiffResult, PublishDecision};
use bs_runtime::{EngineObserver, ScriptEngine, ScriptEngineOptions};
use bs_store::{StoreError, VersionStore};
use tracing::info;

#[derive(Clone)]
pub struct CreateEngineOptions {
    pub document: ScriptDocument,
    pub chapter_key: String,
    pub start_node: Option<String>,
    pub endings: Option<EndingTable>,
    pub observer: Option<Arc<dyn EngineObserver>>,
}

#[derive(Clone)]
pub struct ResumeEngineOptions {
    pub document: ScriptDocument,
    pub snapshot: PlaySnapshot,
    pub endings: Option<EndingTable>,
    pub observer: Option<Arc<dyn EngineObserver>>,
}

pub fn parse_document(raw: &str) -> Result<ScriptDocument, ScriptError> {
    ScriptDocument::from_json_str(raw)
}

/// Builds an engine and enters the chapter, returning the first frame.
pub fn create_engine(
    options: CreateEngineOptions,
) -> Result<(ScriptEngine, EngineOutput), ScriptError> {
    let start = resolve_start_node(&options.document, options.start_node)?;
    let mut engine = ScriptEngine::new(ScriptEngineOptions {
        endings: options.endings,
        observer: options.observer,
    });
    let first = engine.enter_at(options.document, options.chapter_key, &start);
    Ok((engine, first))
}

pub fn resume_engine(options: ResumeEngineOptions) -> Result<ScriptEngine, ScriptError> {
    let mut engine = ScriptEngine::new(ScriptEngineOptions {
        endings: options.endings,
        observer: options.observer,
    });
    engine.resume(options.document, options.snapshot)?;
    Ok(engine)
}

fn resolve_start_node(
    document: &ScriptDocument,
    explicit: Option<String>,
) -> Result<String, ScriptError> {
    if let Some(start) = explicit {
        if !document.contains(&start) {
            return Err(ScriptError::at_node(
                "API_START_NODE_NOT_FOUND",
                format!("Start node \"{}\" is not in the document.", start),
                start,
            ));
        }
        return Ok(start);
    }

    if document.has_entry() {
        return Ok(ENTRY_NODE_ID.to_string());
    }

    Err(ScriptError::new(
        "API_ENTRY_NODE_NOT_FOUND",
        format!("Expected a node named \"{}\" as default entry.", ENTRY_NODE_ID),
    ))
}

/// Diff of `draft` (or the stored draft when `None`) against the published snapshot.
pub fn diff_against_published(
    store: &dyn VersionStore,
    chapter_key: &str,
    draft: Option<&ScriptDocument>,
) -> Result<DiffResult, ScriptError> {
    let record = store.get_draft(chapter_key)?;
    let stored_draft = record.as_ref().and_then(|record| record.content.as_ref());
    let published = record
        .as_ref()
        .and_then(|record| record.published_content.as_ref());
    Ok(compare(draft.or(stored_draft), published))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { version: u64, summary: String },
    /// Nothing was written; the decision says why.
    Held(PublishDecision),
}

pub struct PublishRequest<'a> {
    pub chapter_key: &'a str,
    pub draft: &'a ScriptDocument,
    pub note: &'a str,
    pub expected_version: Option<u64>,
    /// Operator accepted the checklist warnings.
    pub confirmed: bool,
}

/// Checklist-gated publish: saves the draft, then promotes it. A stale
/// `expected_version` fails before anything is written.
pub fn publish_chapter(
    store: &dyn VersionStore,
    request: PublishRequest<'_>,
) -> Result<PublishOutcome, ScriptError> {
    let record = store.get_draft(request.chapter_key)?;
    if let Some(expected) = request.expected_version {
        let actual = record.as_ref().map_or(0, |record| record.version);
        if expected != actual {
            return Err(StoreError::VersionConflict {
                key: request.chapter_key.to_string(),
                expected,
                actual,
            }
            .into());
        }
    }
    let published = record.and_then(|record| record.published_content);
    let decision = plan_publish(request.draft, published.as_ref());

    if let PublishDecision::Blocked { error_count } = decision {
        return Err(ScriptError::new(
            "API_PUBLISH_BLOCKED",
            format!(
                "Publish blocked: {} validation errors must be fixed first.",
                error_count
            ),
        ));
    }
    if !decision.may_publish(request.confirmed) {
        return Ok(PublishOutcome::Held(decision));
    }
    let summary = match &decision {
        PublishDecision::Ready { summary } | PublishDecision::NeedsConfirmation { summary, .. } => {
            summary.clone()
        }
        PublishDecision::Blocked { .. } | PublishDecision::NothingToPublish => String::new(),
    };

    store.save_draft(request.chapter_key, request.draft)?;
    let version = store.publish(request.chapter_key, request.note, request.expected_version)?;
    info!(chapter = request.chapter_key, version, %summary, "publish complete");
    Ok(PublishOutcome::Published { version, summary })
}

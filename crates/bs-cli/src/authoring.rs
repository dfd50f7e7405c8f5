use std::collections::BTreeMap;

use bs_api::{diff_against_published, publish_chapter, PublishOutcome, PublishRequest};
use bs_core::{CardCatalog, ScriptDocument, ScriptError};
use bs_diff::{checklist, ChecklistStatus, PublishDecision};
use bs_lint::{error_count, validate_with_catalog, warning_count};
use bs_store::{JsonFileStore, VersionStore};
use tracing::info;

use crate::{
    json_line, load_card_catalog, read_chapters_from_dir, read_document, resolve_scripts_dir,
    resolve_source_file, ChapterArgs, DiffArgs, DraftArgs, DraftCommand, LintArgs, PublishArgs,
    StatusArgs,
};

/// Exit code for a publish that needs operator action.
const EXIT_HELD: i32 = 2;

pub(crate) fn run_lint(args: LintArgs) -> Result<i32, ScriptError> {
    let chapters = match (&args.script, &args.scripts_dir) {
        (Some(script), _) => {
            let path = resolve_source_file(script)?;
            let label = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(script.as_str())
                .to_string();
            BTreeMap::from([(label, read_document(&path)?)])
        }
        (None, Some(scripts_dir)) => read_chapters_from_dir(&resolve_scripts_dir(scripts_dir)?)?,
        (None, None) => {
            return Err(ScriptError::new(
                "CLI_LINT_NO_SOURCE",
                "lint needs --script or --scripts-dir",
            ))
        }
    };
    let catalog = args
        .cards
        .as_deref()
        .map(load_card_catalog)
        .transpose()?;

    let (errors, warnings) = lint_chapters(&chapters, catalog.as_ref());
    println!("ERRORS:{}", errors);
    println!("WARNINGS:{}", warnings);
    Ok(if errors == 0 { 0 } else { 1 })
}

fn lint_chapters(
    chapters: &BTreeMap<String, ScriptDocument>,
    catalog: Option<&CardCatalog>,
) -> (usize, usize) {
    let mut errors = 0;
    let mut warnings = 0;
    println!("RESULT:OK");
    for (label, document) in chapters {
        let issues = validate_with_catalog(document, catalog);
        errors += error_count(&issues);
        warnings += warning_count(&issues);
        println!("CHAPTER:{}", label);
        for issue in issues {
            println!("ISSUE:{}|{}", issue.severity, json_line(&issue.message));
        }
    }
    (errors, warnings)
}

fn open_store(path: &str) -> Result<JsonFileStore, ScriptError> {
    Ok(JsonFileStore::open(path)?)
}

/// The document to act on: `--script` when given, else the stored draft.
fn draft_document(
    store: &dyn VersionStore,
    chapter_key: &str,
    script: Option<&str>,
) -> Result<ScriptDocument, ScriptError> {
    if let Some(script) = script {
        return read_document(&resolve_source_file(script)?);
    }
    store
        .get_draft(chapter_key)?
        .and_then(|record| record.content)
        .ok_or_else(|| {
            ScriptError::new(
                "CLI_NO_DRAFT",
                format!("Chapter {} has no stored draft; pass --script.", chapter_key),
            )
        })
}

pub(crate) fn run_diff(args: DiffArgs) -> Result<i32, ScriptError> {
    let store = open_store(&args.target.store)?;
    let chapter_key = args.target.chapter.as_str();
    let draft = draft_document(&store, chapter_key, args.script.as_deref())?;
    let diff = diff_against_published(&store, chapter_key, Some(&draft))?;
    let report = checklist(&draft, &diff);

    println!("RESULT:OK");
    println!("STATS_JSON:{}", json_line(&diff.stats));
    println!("SUMMARY:{}", diff.stats.summary());
    for entry in &diff.added {
        println!("ADDED:{}", entry.id);
    }
    for entry in &diff.removed {
        println!("REMOVED:{}", entry.id);
    }
    for modified in &diff.modified {
        let fields = modified
            .changes
            .iter()
            .map(|change| change.field.as_str())
            .collect::<Vec<_>>();
        println!("MODIFIED:{}|{}", modified.id, json_line(&fields));
    }
    for item in &report.items {
        println!("CHECK:{}|{}", status_label(item.status), json_line(&item.text));
    }
    println!("PASSED:{}", report.passed);
    Ok(0)
}

fn status_label(status: ChecklistStatus) -> &'static str {
    match status {
        ChecklistStatus::Pass => "pass",
        ChecklistStatus::Fail => "fail",
        ChecklistStatus::Warn => "warn",
        ChecklistStatus::Info => "info",
    }
}

pub(crate) fn run_draft(args: DraftArgs) -> Result<i32, ScriptError> {
    match args.command {
        DraftCommand::Save(args) => {
            let store = open_store(&args.target.store)?;
            let document = read_document(&resolve_source_file(&args.script)?)?;
            store.save_draft(&args.target.chapter, &document)?;
            info!(chapter = %args.target.chapter, nodes = document.len(), "draft saved");
            println!("RESULT:OK");
            println!("CHAPTER:{}", args.target.chapter);
            println!("NODES:{}", document.len());
            Ok(0)
        }
    }
}

pub(crate) fn run_publish(args: PublishArgs) -> Result<i32, ScriptError> {
    let store = open_store(&args.target.store)?;
    let chapter_key = args.target.chapter.as_str();
    let draft = draft_document(&store, chapter_key, args.script.as_deref())?;

    let outcome = publish_chapter(
        &store,
        PublishRequest {
            chapter_key,
            draft: &draft,
            note: &args.note,
            expected_version: args.expect_version,
            confirmed: args.yes,
        },
    )?;

    match outcome {
        PublishOutcome::Published { version, summary } => {
            println!("RESULT:OK");
            println!("CHAPTER:{}", chapter_key);
            println!("VERSION:{}", version);
            println!("SUMMARY:{}", summary);
            Ok(0)
        }
        PublishOutcome::Held(decision) => {
            println!("RESULT:HELD");
            println!("DECISION_JSON:{}", json_line(&decision));
            match decision {
                PublishDecision::NeedsConfirmation { warnings, .. } => {
                    println!("HINT:{} warnings; rerun with --yes to publish anyway", warnings);
                }
                PublishDecision::NothingToPublish => {
                    println!("HINT:draft matches the published version");
                }
                PublishDecision::Blocked { .. } | PublishDecision::Ready { .. } => {}
            }
            Ok(EXIT_HELD)
        }
    }
}

pub(crate) fn run_unpublish(args: ChapterArgs) -> Result<i32, ScriptError> {
    let store = open_store(&args.store)?;
    store.unpublish(&args.chapter)?;
    println!("RESULT:OK");
    println!("CHAPTER:{}", args.chapter);
    Ok(0)
}

pub(crate) fn run_status(args: StatusArgs) -> Result<i32, ScriptError> {
    let store = open_store(&args.store)?;
    let summaries = store.list()?;
    println!("RESULT:OK");
    for summary in summaries {
        println!(
            "CHAPTER:{}|{}",
            summary.chapter_key,
            json_line(&summary.status.label())
        );
        println!("CHAPTER_JSON:{}", json_line(&summary));
    }
    Ok(0)
}

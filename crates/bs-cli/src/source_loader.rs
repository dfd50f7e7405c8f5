use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bs_core::{CardCatalog, EndingTable, ScriptDocument, ScriptError};
use bs_store::ChapterKey;
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_read, map_cli_source_scan, LoadedChapter};

pub(crate) fn load_chapter(
    script: &str,
    chapter: Option<&str>,
    endings: Option<&str>,
) -> Result<LoadedChapter, ScriptError> {
    let script_path = resolve_source_file(script)?;
    let chapter_key = match chapter {
        Some(chapter) => chapter.to_string(),
        None => chapter_key_from_path(&script_path)?,
    };
    let document = read_document(&script_path)?;

    let (endings_path, endings) = match endings {
        Some(endings) => {
            let path = resolve_source_file(endings)?;
            let raw = fs::read_to_string(&path).map_err(map_cli_source_read)?;
            (
                Some(path.to_string_lossy().to_string()),
                Some(EndingTable::from_json_str(&raw)?),
            )
        }
        None => (None, None),
    };

    Ok(LoadedChapter {
        script_path: script_path.to_string_lossy().to_string(),
        chapter_key,
        endings_path,
        document,
        endings,
    })
}

pub(crate) fn read_document(path: &Path) -> Result<ScriptDocument, ScriptError> {
    let raw = fs::read_to_string(path).map_err(map_cli_source_read)?;
    ScriptDocument::from_json_str(&raw)
}

pub(crate) fn load_card_catalog(path: &str) -> Result<CardCatalog, ScriptError> {
    let path = resolve_source_file(path)?;
    let raw = fs::read_to_string(&path).map_err(map_cli_source_read)?;
    CardCatalog::from_json_str(&raw)
}

fn chapter_key_from_path(path: &Path) -> Result<String, ScriptError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ScriptError::new(
                "CLI_CHAPTER_KEY",
                format!("Cannot derive a chapter key from {}", path.display()),
            )
        })
}

fn absolute_path(raw: &str) -> Result<PathBuf, ScriptError> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(map_cli_source_path)?
        .join(path))
}

pub(crate) fn resolve_source_file(raw: &str) -> Result<PathBuf, ScriptError> {
    let absolute = absolute_path(raw)?;
    if !absolute.exists() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("file does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_file() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("path is not a file: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, ScriptError> {
    let absolute = absolute_path(scripts_dir)?;

    if !absolute.exists() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(ScriptError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Chapter documents under `scripts_dir`, keyed by relative path. Only files
/// named after a chapter key (`main_3.json`, `dlc_pack_1.json`) are read.
pub(crate) fn read_chapters_from_dir(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, ScriptDocument>, ScriptError> {
    let mut chapters = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let is_chapter = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.parse::<ChapterKey>().is_ok());
        if !is_chapter {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let document = read_document(path).map_err(|error| {
            ScriptError::new(error.code, format!("{}: {}", relative, error.message))
        })?;
        chapters.insert(relative, document);
    }

    if chapters.is_empty() {
        return Err(ScriptError::new(
            "CLI_SOURCE_EMPTY",
            format!("No chapter .json files under {}", scripts_dir.display()),
        ));
    }

    Ok(chapters)
}

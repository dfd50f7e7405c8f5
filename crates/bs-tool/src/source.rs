use std::fs;
use std::path::{Path, PathBuf};

use bs_core::{EndingTable, ScriptDocument};
use walkdir::WalkDir;

use crate::{BsToolError, TestCase, TESTCASE_SCHEMA_V1};

const CASE_SUFFIX: &str = ".case.json";

fn read_file(path: &Path) -> Result<String, BsToolError> {
    fs::read_to_string(path).map_err(|source| BsToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_chapter(path: &Path) -> Result<ScriptDocument, BsToolError> {
    Ok(ScriptDocument::from_json_str(&read_file(path)?)?)
}

pub(crate) fn read_endings(path: &Path) -> Result<EndingTable, BsToolError> {
    Ok(EndingTable::from_json_str(&read_file(path)?)?)
}

/// Every `*.case.json` under `root`, sorted by path.
pub fn find_case_files(root: &Path) -> Result<Vec<PathBuf>, BsToolError> {
    let mut cases = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.to_string_lossy().ends_with(CASE_SUFFIX))
        .collect::<Vec<_>>();
    cases.sort();

    if cases.is_empty() {
        return Err(BsToolError::SourceEmpty {
            path: root.to_path_buf(),
        });
    }
    Ok(cases)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, BsToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| BsToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(BsToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }
    if parsed.chapters.is_empty() {
        return Err(BsToolError::NoChapters);
    }

    Ok(parsed)
}

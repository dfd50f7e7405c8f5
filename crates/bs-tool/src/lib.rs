mod case;
mod runner;
mod source;

pub use case::{ExpectedEvent, TestAction, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{find_case_files, read_test_case};

use std::path::PathBuf;

use thiserror::Error;

/// Why a playthrough case could not be loaded or did not replay as recorded.
#[derive(Debug, Error)]
pub enum BsToolError {
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("case file {path} is not valid JSON: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("case schema is \"{found}\" but this runner reads \"{expected}\"")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("case does not name any chapter")]
    NoChapters,
    #[error("no case files found under {path}")]
    SourceEmpty { path: PathBuf },
    #[error("engine rejected the run: {0}")]
    Engine(#[from] bs_core::ScriptError),
    #[error("ran out of actions at event {event_index}, needed a {wanted}")]
    MissingAction { event_index: usize, wanted: String },
    #[error("event {event_index} needs a {wanted} but the case supplies a {found}")]
    ActionKindMismatch {
        event_index: usize,
        wanted: String,
        found: String,
    },
    #[error("engine produced nothing after event {event_index}")]
    Stalled { event_index: usize },
    #[error("case supplies {total} actions but the run consumed {used}")]
    UnusedActions { used: usize, total: usize },
    #[error("run did not finish within {limit} steps")]
    StepLimit { limit: usize },
    #[error("recorded {expected} events but the run produced {actual}: {observed}")]
    EventCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("event {index} differs: recorded {expected}, produced {actual}")]
    EventMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("cannot render events for the report: {0}")]
    EventSerialize(serde_json::Error),
}

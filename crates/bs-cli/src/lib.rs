use std::ffi::OsString;

use bs_core::ScriptError;
use clap::Parser;
use serde::Serialize;

mod agent;
mod authoring;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_tui;
mod models;
mod session_ops;
mod source_loader;
mod state_store;

pub(crate) use boundary_runner::{emit_boundary, run_choice_to_boundary, run_to_boundary};
pub(crate) use cli_args::{
    AckArgs, ChapterArgs, ChooseArgs, Cli, DiffArgs, DraftArgs, DraftCommand, LineArgs,
    LintArgs, Mode, PlayArgs, PlayCommand, PublishArgs, StartArgs, StatusArgs,
};
pub(crate) use error_map::{
    emit_error, map_cli_source_path, map_cli_source_read, map_cli_source_scan,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, map_line_io,
};
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, ChoiceEcho, DialogueLine, LoadedChapter, PlayerState,
    LineAction, LineContext, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    create_engine_for_chapter, emit_boundary_with_saved_state, load_engine_from_state,
    load_engine_from_state_for_chapter, save_engine_state,
};
pub(crate) use source_loader::{
    load_card_catalog, load_chapter, read_chapters_from_dir, read_document, resolve_scripts_dir,
    resolve_source_file,
};
pub(crate) use state_store::{load_player_state, save_player_state};

/// One-line JSON for protocol output.
pub(crate) fn json_line<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, ScriptError> {
    match cli.command {
        Mode::Play(args) => agent::run_play(args),
        Mode::Lint(args) => authoring::run_lint(args),
        Mode::Diff(args) => authoring::run_diff(args),
        Mode::Draft(args) => authoring::run_draft(args),
        Mode::Publish(args) => authoring::run_publish(args),
        Mode::Unpublish(args) => authoring::run_unpublish(args),
        Mode::Status(args) => authoring::run_status(args),
    }
}

use std::path::Path;

use bs_api::{create_engine, resume_engine, CreateEngineOptions, ResumeEngineOptions};
use bs_core::{EngineOutput, ScriptError};
use bs_runtime::ScriptEngine;

use crate::{
    emit_boundary, load_chapter, load_player_state, save_player_state, BoundaryResult,
    LoadedChapter, PlayerState, PLAYER_STATE_SCHEMA,
};

pub(crate) fn create_engine_for_chapter(
    chapter: &LoadedChapter,
    start_node: Option<String>,
) -> Result<(ScriptEngine, EngineOutput), ScriptError> {
    create_engine(CreateEngineOptions {
        document: chapter.document.clone(),
        chapter_key: chapter.chapter_key.clone(),
        start_node,
        endings: chapter.endings.clone(),
        observer: None,
    })
}

pub(crate) fn resume_engine_for_state(
    chapter: &LoadedChapter,
    state: &PlayerState,
) -> Result<ScriptEngine, ScriptError> {
    resume_engine(ResumeEngineOptions {
        document: chapter.document.clone(),
        snapshot: state.snapshot.clone(),
        endings: chapter.endings.clone(),
        observer: None,
    })
}

pub(crate) fn save_engine_state(
    path: &Path,
    engine: &ScriptEngine,
    chapter: &LoadedChapter,
) -> Result<(), ScriptError> {
    let snapshot = engine.snapshot()?;
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        script_path: chapter.script_path.clone(),
        chapter_key: chapter.chapter_key.clone(),
        endings_path: chapter.endings_path.clone(),
        snapshot,
    };
    save_player_state(path, &state)
}

/// Reloads the chapter a state file points at and resumes it.
pub(crate) fn load_engine_from_state(
    path: &Path,
) -> Result<(LoadedChapter, PlayerState, ScriptEngine), ScriptError> {
    let state = load_player_state(path)?;
    let chapter = load_chapter(
        &state.script_path,
        Some(&state.chapter_key),
        state.endings_path.as_deref(),
    )?;
    let engine = resume_engine_for_state(&chapter, &state)?;
    Ok((chapter, state, engine))
}

pub(crate) fn load_engine_from_state_for_chapter(
    path: &Path,
    chapter: &LoadedChapter,
) -> Result<ScriptEngine, ScriptError> {
    let state = load_player_state(path)?;
    if state.script_path != chapter.script_path || state.chapter_key != chapter.chapter_key {
        return Err(ScriptError::new(
            "LINE_STATE_CHAPTER_MISMATCH",
            format!(
                "State chapter mismatch. expected={} actual={}",
                chapter.chapter_key, state.chapter_key
            ),
        ));
    }
    resume_engine_for_state(chapter, &state)
}

/// Saves the state only while play can continue; finished chapters print
/// `STATE_OUT:NONE`.
pub(crate) fn emit_boundary_with_saved_state(
    engine: &ScriptEngine,
    boundary: BoundaryResult,
    state_out: &str,
    chapter: &LoadedChapter,
) -> Result<i32, ScriptError> {
    if boundary.event.is_resumable() {
        save_engine_state(Path::new(state_out), engine, chapter)?;
        emit_boundary(boundary, Some(state_out.to_string()));
        return Ok(0);
    }

    emit_boundary(boundary, None);
    Ok(0)
}

#[cfg(test)]
mod session_ops_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{run_to_boundary, BoundaryEvent};

    #[test]
    fn saved_sessions_resume_at_the_same_boundary() {
        let chapter = demo_chapter("main_1");
        let (mut engine, first) =
            create_engine_for_chapter(&chapter, None).expect("engine should build");
        let boundary = run_to_boundary(&mut engine, first).expect("boundary should resolve");
        assert!(boundary.event.is_resumable());

        let state_file = temp_path("session-ops-state.json");
        save_engine_state(&state_file, &engine, &chapter).expect("state save should pass");

        let (loaded, state, resumed) =
            load_engine_from_state(&state_file).expect("state load should pass");
        assert_eq!(loaded.chapter_key, "main_1");
        assert_eq!(state.schema_version, PLAYER_STATE_SCHEMA);
        assert_eq!(resumed.current_frame(), engine.current_frame());

        let resumed_for_chapter = load_engine_from_state_for_chapter(&state_file, &chapter)
            .expect("state chapter load should pass");
        assert_eq!(resumed_for_chapter.state(), engine.state());

        let emit_code = emit_boundary_with_saved_state(
            &engine,
            boundary,
            state_file.to_string_lossy().as_ref(),
            &chapter,
        )
        .expect("emit with save should pass");
        assert_eq!(emit_code, 0);
    }

    #[test]
    fn load_engine_from_state_for_chapter_rejects_mismatch() {
        let chapter = demo_chapter("main_1");
        let other = demo_chapter("main_2");

        let (engine, _) = create_engine_for_chapter(&other, None).expect("engine build");
        let state_file = temp_path("session-ops-mismatch-state.json");
        save_engine_state(&state_file, &engine, &other).expect("state save");

        let error = match load_engine_from_state_for_chapter(&state_file, &chapter) {
            Ok(_) => panic!("mismatch should fail"),
            Err(error) => error,
        };
        assert_eq!(error.code, "LINE_STATE_CHAPTER_MISMATCH");
    }

    #[test]
    fn finished_chapters_do_not_write_state() {
        let chapter = demo_chapter("main_1");
        let (mut engine, first) = create_engine_for_chapter(&chapter, Some("wrap".to_string()))
            .expect("engine build");
        let boundary = run_to_boundary(&mut engine, first).expect("boundary");
        assert_eq!(boundary.event, BoundaryEvent::ChapterComplete);

        let state_file = temp_path("session-ops-finished.json");
        emit_boundary_with_saved_state(
            &engine,
            boundary,
            state_file.to_string_lossy().as_ref(),
            &chapter,
        )
        .expect("emit");
        assert!(!state_file.exists());
    }
}

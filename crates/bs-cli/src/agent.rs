use bs_core::ScriptError;
use bs_runtime::ScriptEngine;

use crate::{
    create_engine_for_chapter, emit_boundary_with_saved_state, load_chapter,
    load_engine_from_state, run_choice_to_boundary, run_to_boundary, AckArgs, BoundaryResult,
    ChooseArgs, PlayArgs, PlayCommand, StartArgs,
};

pub(super) fn run_play(args: PlayArgs) -> Result<i32, ScriptError> {
    match args.command {
        PlayCommand::Start(args) => run_start(args),
        PlayCommand::Choose(args) => run_choose(args),
        PlayCommand::Ack(args) => run_ack(args),
        PlayCommand::Line(args) => crate::line_tui::run_line(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, ScriptError> {
    let chapter = load_chapter(
        &args.source.script,
        args.source.chapter.as_deref(),
        args.source.endings.as_deref(),
    )?;
    let (mut engine, first) = create_engine_for_chapter(&chapter, args.start_node)?;

    let boundary = run_to_boundary(&mut engine, first)?;
    emit_boundary_with_saved_state(&engine, boundary, &args.state_out, &chapter)
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, ScriptError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        run_choice_to_boundary(engine, args.choice)
    })
}

pub(super) fn run_ack(args: AckArgs) -> Result<i32, ScriptError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        let shown = engine.resume_after_unlock()?;
        run_to_boundary(engine, shown)
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut ScriptEngine) -> Result<BoundaryResult, ScriptError>,
) -> Result<i32, ScriptError> {
    let (chapter, _, mut engine) = load_engine_from_state(std::path::Path::new(state_in))?;
    let boundary = transition(&mut engine)?;
    emit_boundary_with_saved_state(&engine, boundary, state_out, &chapter)
}

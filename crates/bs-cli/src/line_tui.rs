use std::io::{self, BufRead, Write};
use std::path::Path;

use bs_core::ScriptError;
use bs_runtime::ScriptEngine;

use crate::{
    create_engine_for_chapter, load_chapter, load_engine_from_state_for_chapter, map_line_io,
    run_choice_to_boundary, run_to_boundary, save_engine_state, BoundaryEvent, BoundaryResult,
    LineArgs, LoadedChapter, LineAction, LineContext,
};

const COMMANDS_HELP: &str = "commands: :help :save :load :restart :quit";
const DEFAULT_STATE_FILE: &str = ".branchscript/save.json";

pub(crate) fn run_line(args: LineArgs) -> Result<i32, ScriptError> {
    let chapter = load_chapter(
        &args.source.script,
        args.source.chapter.as_deref(),
        args.source.endings.as_deref(),
    )?;
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_line_mode_with_io(&state_file, &chapter, &mut reader, &mut writer)
}

pub(crate) fn run_line_mode_with_io(
    state_file: &str,
    chapter: &LoadedChapter,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, ScriptError> {
    writeln!(writer, "BranchScript {}", chapter.chapter_key).map_err(map_line_io)?;
    writeln!(writer, "{}", COMMANDS_HELP).map_err(map_line_io)?;
    let context = LineContext {
        state_file,
        chapter,
    };

    let (mut engine, first) = create_engine_for_chapter(chapter, None)?;
    let mut boundary = run_to_boundary(&mut engine, first)?;

    loop {
        render_boundary(&boundary, writer)?;

        boundary = match boundary.event {
            BoundaryEvent::ChapterComplete | BoundaryEvent::GameComplete => return Ok(0),
            BoundaryEvent::Choices => loop {
                let raw = prompt_input_from("> ", reader, writer)?;
                let mut emit = |line: String| {
                    let _ = writeln!(writer, "{}", line);
                };
                match handle_line_cmd(raw.as_str(), &context, &mut engine, &mut emit)? {
                    LineAction::Continue => continue,
                    LineAction::RefreshBoundary => break refresh_boundary(&mut engine)?,
                    LineAction::Quit => return Ok(0),
                    LineAction::NotHandled => {}
                }
                let Ok(choice) = raw.trim().parse::<usize>() else {
                    writeln!(writer, "invalid choice index: {}", raw).map_err(map_line_io)?;
                    continue;
                };
                match run_choice_to_boundary(&mut engine, choice) {
                    Ok(next) => break next,
                    Err(error) if error.code == "ENGINE_CHOICE_INDEX" => {
                        writeln!(writer, "no choice [{}]", choice).map_err(map_line_io)?;
                    }
                    Err(error) => return Err(error),
                }
            },
            BoundaryEvent::Unlock => loop {
                let raw = prompt_input_from("(enter) ", reader, writer)?;
                let mut emit = |line: String| {
                    let _ = writeln!(writer, "{}", line);
                };
                match handle_line_cmd(raw.as_str(), &context, &mut engine, &mut emit)? {
                    LineAction::Continue => continue,
                    LineAction::RefreshBoundary => break refresh_boundary(&mut engine)?,
                    LineAction::Quit => return Ok(0),
                    LineAction::NotHandled => {}
                }
                let shown = engine.resume_after_unlock()?;
                break run_to_boundary(&mut engine, shown)?;
            },
        };
    }
}

fn refresh_boundary(engine: &mut ScriptEngine) -> Result<BoundaryResult, ScriptError> {
    let frame = engine.current_frame().ok_or_else(|| {
        ScriptError::new("LINE_NO_FRAME", "Nothing left to show for this chapter.")
    })?;
    run_to_boundary(engine, frame)
}

fn render_boundary(boundary: &BoundaryResult, writer: &mut dyn Write) -> Result<(), ScriptError> {
    if let Some(echo) = &boundary.echo {
        match echo.is_correct {
            Some(true) => writeln!(writer, "(correct, {:+})", echo.score_delta),
            Some(false) => writeln!(writer, "(incorrect, {:+})", echo.score_delta),
            None => writeln!(writer, "({:+})", echo.score_delta),
        }
        .map_err(map_line_io)?;
        if let Some(feedback) = &echo.feedback {
            writeln!(writer, "{}", feedback).map_err(map_line_io)?;
        }
    }

    for line in &boundary.lines {
        writeln!(writer).map_err(map_line_io)?;
        match &line.speaker {
            Some(speaker) => writeln!(writer, "{}: {}", speaker, line.text),
            None => writeln!(writer, "{}", line.text),
        }
        .map_err(map_line_io)?;
    }

    match boundary.event {
        BoundaryEvent::Choices => {
            for (index, text) in &boundary.choices {
                writeln!(writer, "  [{}] {}", index, text).map_err(map_line_io)?;
            }
        }
        BoundaryEvent::Unlock => {
            if let Some(card) = &boundary.card {
                writeln!(writer, "[CARD UNLOCKED] {}", card).map_err(map_line_io)?;
            }
        }
        BoundaryEvent::ChapterComplete => {
            writeln!(writer).map_err(map_line_io)?;
            writeln!(
                writer,
                "[CHAPTER COMPLETE] chapter score {}, total {}",
                boundary.chapter_score.unwrap_or_default(),
                boundary.total_score
            )
            .map_err(map_line_io)?;
        }
        BoundaryEvent::GameComplete => {
            writeln!(writer).map_err(map_line_io)?;
            writeln!(writer, "[GAME COMPLETE] total {}", boundary.total_score)
                .map_err(map_line_io)?;
            if let Some(ending) = &boundary.ending {
                writeln!(writer, "ending: {}", ending.title).map_err(map_line_io)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_line_cmd(
    raw: &str,
    context: &LineContext<'_>,
    engine: &mut ScriptEngine,
    emit: &mut dyn FnMut(String),
) -> Result<LineAction, ScriptError> {
    match raw {
        ":help" => {
            emit(COMMANDS_HELP.to_string());
            Ok(LineAction::Continue)
        }
        ":save" => {
            save_engine_state(Path::new(context.state_file), engine, context.chapter)?;
            emit(format!("saved: {}", context.state_file));
            Ok(LineAction::Continue)
        }
        ":load" => {
            *engine = load_engine_from_state_for_chapter(
                Path::new(context.state_file),
                context.chapter,
            )?;
            emit(format!("loaded: {}", context.state_file));
            Ok(LineAction::RefreshBoundary)
        }
        ":restart" => {
            let (mut restarted, _) = create_engine_for_chapter(context.chapter, None)?;
            std::mem::swap(engine, &mut restarted);
            emit("restarted".to_string());
            Ok(LineAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(LineAction::Quit)
        }
        _ => Ok(LineAction::NotHandled),
    }
}

pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<String, ScriptError> {
    write!(writer, "{}", prefix).map_err(map_line_io)?;
    writer.flush().map_err(map_line_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_line_io)? == 0 {
        return Ok(":quit".to_string());
    }
    Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
}

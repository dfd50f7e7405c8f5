use bs_core::{ChoiceOutcome, EngineOutput, ScriptError};
use bs_runtime::ScriptEngine;

use crate::{json_line, BoundaryEvent, BoundaryResult, ChoiceEcho, DialogueLine};

/// Upper bound on plain lines shown between two boundaries.
const MAX_LINES_PER_BOUNDARY: usize = 10_000;

/// Plays plain dialogue forward from `first` until the player has to act or
/// the chapter ends.
pub(crate) fn run_to_boundary(
    engine: &mut ScriptEngine,
    first: EngineOutput,
) -> Result<BoundaryResult, ScriptError> {
    let mut lines = Vec::new();
    let mut output = first;

    for _ in 0..MAX_LINES_PER_BOUNDARY {
        let mut result = BoundaryResult {
            event: BoundaryEvent::Choices,
            echo: None,
            lines: Vec::new(),
            choices: Vec::new(),
            card: None,
            chapter_score: None,
            total_score: engine.state().score,
            ending: None,
            cause: None,
        };

        match output {
            EngineOutput::Dialogue {
                speaker,
                text,
                choices,
                ..
            } => {
                lines.push(DialogueLine { speaker, text });
                if !choices.is_empty() {
                    result.choices = choices
                        .into_iter()
                        .map(|item| (item.index, item.text))
                        .collect();
                    result.lines = lines;
                    return Ok(result);
                }
            }
            EngineOutput::CardUnlocked { card_id, .. } => {
                result.event = BoundaryEvent::Unlock;
                result.card = Some(card_id);
                result.lines = lines;
                return Ok(result);
            }
            EngineOutput::ChapterComplete {
                chapter_score,
                total_score,
                cause,
                ..
            } => {
                result.event = BoundaryEvent::ChapterComplete;
                result.chapter_score = Some(chapter_score);
                result.total_score = total_score;
                result.cause = Some(cause);
                result.lines = lines;
                return Ok(result);
            }
            EngineOutput::GameComplete {
                total_score,
                ending,
                cause,
                ..
            } => {
                result.event = BoundaryEvent::GameComplete;
                result.total_score = total_score;
                result.ending = ending;
                result.cause = Some(cause);
                result.lines = lines;
                return Ok(result);
            }
        }

        output = engine.advance().ok_or_else(|| {
            ScriptError::new(
                "CLI_BOUNDARY_STALLED",
                "Engine stopped between two boundaries.",
            )
        })?;
    }

    Err(ScriptError::new(
        "CLI_BOUNDARY_LIMIT",
        format!(
            "More than {} lines without a choice or an ending.",
            MAX_LINES_PER_BOUNDARY
        ),
    ))
}

/// Applies a pick and runs on to the next boundary, echoing what it earned.
pub(crate) fn run_choice_to_boundary(
    engine: &mut ScriptEngine,
    index: usize,
) -> Result<BoundaryResult, ScriptError> {
    let ChoiceOutcome {
        score_delta,
        is_correct,
        feedback,
        output,
    } = engine.choose(index)?;
    let mut boundary = run_to_boundary(engine, output)?;
    boundary.echo = Some(ChoiceEcho {
        score_delta,
        is_correct,
        feedback,
    });
    Ok(boundary)
}

pub(crate) fn emit_boundary(boundary: BoundaryResult, state_out: Option<String>) {
    println!("RESULT:OK");
    println!("EVENT:{}", boundary.event.as_str());

    if let Some(echo) = boundary.echo {
        println!("SCORE_DELTA:{}", echo.score_delta);
        if let Some(is_correct) = echo.is_correct {
            println!("CORRECT:{}", is_correct);
        }
        if let Some(feedback) = echo.feedback {
            println!("FEEDBACK_JSON:{}", json_line(&feedback));
        }
    }

    for line in boundary.lines {
        println!("LINE_JSON:{}", json_line(&line));
    }

    for (index, text) in boundary.choices {
        println!("CHOICE:{}|{}", index, json_line(&text));
    }

    if let Some(card) = boundary.card {
        println!("CARD:{}", card);
    }

    if let Some(chapter_score) = boundary.chapter_score {
        println!("CHAPTER_SCORE:{}", chapter_score);
    }
    println!("TOTAL_SCORE:{}", boundary.total_score);

    if let Some(ending) = boundary.ending {
        println!("ENDING_JSON:{}", json_line(&ending));
    }

    if let Some(cause) = boundary.cause {
        println!("CAUSE_JSON:{}", json_line(&cause));
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}

#[cfg(test)]
mod boundary_runner_tests {
    use super::*;
    use bs_core::{CompletionCause, ScriptDocument};
    use serde_json::json;

    fn engine_for(value: serde_json::Value) -> (ScriptEngine, EngineOutput) {
        let document = ScriptDocument::from_value(value).expect("document");
        let mut engine = ScriptEngine::default();
        let first = engine.enter(document, "main_1");
        (engine, first)
    }

    #[test]
    fn run_to_boundary_collects_lines_until_choices() {
        let (mut engine, first) = engine_for(json!({
            "start": {"speaker": "Perry", "text": "Hello", "next": "ask"},
            "ask": {"text": "Ready?", "choices": [
                {"text": "Yes", "next": "end", "score": 5, "isCorrect": true, "feedback": "Good"}
            ]},
            "end": {"event": "chapter_complete"}
        }));

        let boundary = run_to_boundary(&mut engine, first).expect("boundary");
        assert_eq!(boundary.event, BoundaryEvent::Choices);
        assert_eq!(boundary.lines.len(), 2);
        assert_eq!(boundary.lines[0].speaker.as_deref(), Some("Perry"));
        assert_eq!(boundary.choices, vec![(0, "Yes".to_string())]);

        let done = run_choice_to_boundary(&mut engine, 0).expect("choice");
        assert_eq!(done.event, BoundaryEvent::ChapterComplete);
        assert_eq!(done.chapter_score, Some(5));
        assert_eq!(
            done.echo,
            Some(ChoiceEcho {
                score_delta: 5,
                is_correct: Some(true),
                feedback: Some("Good".to_string()),
            })
        );
        assert!(matches!(done.cause, Some(CompletionCause::Event { .. })));
    }

    #[test]
    fn run_to_boundary_stops_at_unlock_and_end_of_script() {
        let (mut engine, first) = engine_for(json!({
            "start": {"text": "Card", "unlockCard": "brief", "next": "last"},
            "last": {"text": "Bye"}
        }));

        let boundary = run_to_boundary(&mut engine, first).expect("boundary");
        assert_eq!(boundary.event, BoundaryEvent::Unlock);
        assert_eq!(boundary.card.as_deref(), Some("brief"));
        assert!(boundary.lines.is_empty());

        let shown = engine.resume_after_unlock().expect("ack");
        let boundary = run_to_boundary(&mut engine, shown).expect("boundary");
        assert_eq!(boundary.event, BoundaryEvent::ChapterComplete);
        assert_eq!(boundary.lines.len(), 2);
        assert!(matches!(
            boundary.cause,
            Some(CompletionCause::EndOfScript { ref node_id }) if node_id == "last"
        ));
    }
}

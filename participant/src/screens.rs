//! One handler per screen, driving `SurveySession` from terminal input.

use crate::terminal::Prompter;
use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use survey_core::guided::{CopyPasteStep, DragDropStep, MultiShotStep, SAMPLE_PROMPTS};
use survey_core::{
    CopyPasteFlow, DemographicsForm, DragDropFlow, GuidedError, GuidedExercise, GuidedFlow,
    MultiShotFlow, Phase, PromptQuality, QuestionKind, ScenarioId, Screen, SessionError, SessionEvent, SurveySession,
    QUESTIONS,
};
use survey_env::SurveyContext;
use tracing::debug;

const CONSENT_TEXT: &str = "\
You are invited to take part in a study about writing prompts for AI assistants.
You will answer a few background questions and then complete four short
writing scenarios. Your answers are recorded anonymously together with the
time spent on each screen. You may stop at any time by closing the program.";

/// A command typed in a guided exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidedCommand {
    /// Set field `n` (1-based); `None` reads a multi-line block
    Set(usize, Option<String>),
    Add,
    Remove(usize),
    /// Rewrite the combined text; `None` until the block is read
    Edit(Option<String>),
    Next,
    Help,
}

impl GuidedCommand {
    pub fn parse(line: &str) -> Option<GuidedCommand> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match head.to_lowercase().as_str() {
            "add" if rest.is_empty() => Some(GuidedCommand::Add),
            "remove" => rest.parse().ok().map(GuidedCommand::Remove),
            "edit" if rest.is_empty() => Some(GuidedCommand::Edit(None)),
            "next" if rest.is_empty() => Some(GuidedCommand::Next),
            "help" | "?" => Some(GuidedCommand::Help),
            _ => {
                let n = head.parse::<usize>().ok().filter(|n| *n > 0)?;
                let text = (!rest.is_empty()).then(|| rest.to_string());
                Some(GuidedCommand::Set(n, text))
            }
        }
    }
}

const GUIDED_HELP: &str = "\
Commands:
  <n> <text>   set field n to a single line (or a label: good, medium, bad)
  <n>          enter field n over several lines
  add          add a requirement
  remove <n>   remove requirement n
  edit         rewrite the combined text
  next         continue";

/// Runs the session from its current screen to completion.
pub fn run<C, R, W>(session: &mut SurveySession<C>, prompter: &mut Prompter<R, W>) -> Result<()>
where
    C: SurveyContext,
    R: BufRead,
    W: Write,
{
    loop {
        match session.current_screen() {
            Screen::Consent => consent(session, prompter)?,
            Screen::Demographics => demographics(session, prompter)?,
            Screen::Scenario {
                scenario_index,
                phase,
                scenario,
            } => {
                prompter.say(&format!(
                    "\n=== Scenario {} of {} · {} ===",
                    scenario_index + 1,
                    survey_core::SCENARIO_COUNT,
                    scenario.title()
                ))?;
                match phase {
                    Phase::Intro => intro(session, prompter, scenario)?,
                    Phase::Unguided => unguided(session, prompter, scenario)?,
                    Phase::Guided => guided(session, prompter, scenario)?,
                }
            }
            Screen::Complete => {
                prompter.say("\nThank you! Your responses have been recorded.")?;
                return Ok(());
            }
            Screen::Loading => bail!("session is not ready"),
        }
    }
}

fn consent<C: SurveyContext, R: BufRead, W: Write>(
    session: &mut SurveySession<C>,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    prompter.say(CONSENT_TEXT)?;
    loop {
        let answer = prompter.ask("Type 'agree' to take part:")?;
        if answer.trim().eq_ignore_ascii_case("agree") {
            session.apply(SessionEvent::Agree)?;
            return Ok(());
        }
    }
}

fn demographics<C: SurveyContext, R: BufRead, W: Write>(
    session: &mut SurveySession<C>,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let mut form = DemographicsForm::new();
    prompter.say(&format!("\nBackground ({} questions)", QUESTIONS.len()))?;

    while let Some(question) = form.current() {
        let answer = match question.kind {
            QuestionKind::Select(options) => prompter.choose(question.label, options)?.to_string(),
            QuestionKind::Text => {
                prompter.say(question.label)?;
                prompter.ask(">")?
            }
        };
        if let Err(e) = form.answer(answer.trim()) {
            prompter.say(&e.to_string())?;
            continue;
        }
        if !form.can_advance() {
            prompter.say("An answer is required.")?;
            continue;
        }
        if let Some(answers) = form.advance() {
            session.apply(SessionEvent::SubmitDemographics(answers))?;
            break;
        }
    }
    Ok(())
}

fn intro<C: SurveyContext, R: BufRead, W: Write>(
    session: &mut SurveySession<C>,
    prompter: &mut Prompter<R, W>,
    scenario: ScenarioId,
) -> Result<()> {
    prompter.say(scenario.summary())?;
    prompter.say(&format!("Field to complete: {}", scenario.requirement_field()))?;
    prompter.ask("Press Enter when you have read the scenario.")?;
    session.apply(SessionEvent::CompleteIntro)?;
    Ok(())
}

fn unguided<C: SurveyContext, R: BufRead, W: Write>(
    session: &mut SurveySession<C>,
    prompter: &mut Prompter<R, W>,
    scenario: ScenarioId,
) -> Result<()> {
    prompter.say(&format!(
        "Write the prompt you would give an AI assistant to fill in '{}'.",
        scenario.requirement_field()
    ))?;
    loop {
        let prompt = prompter.read_block("Your prompt")?;
        match session.apply(SessionEvent::SubmitUnguided(prompt)) {
            Ok(_) => return Ok(()),
            Err(SessionError::EmptyPrompt) => prompter.say("The prompt cannot be empty.")?,
            Err(e) => return Err(e.into()),
        }
    }
}

fn guided<C: SurveyContext, R: BufRead, W: Write>(
    session: &mut SurveySession<C>,
    prompter: &mut Prompter<R, W>,
    scenario: ScenarioId,
) -> Result<()> {
    let Some(exercise) = session.guided() else {
        bail!("guided screen without an exercise");
    };
    prompter.say(&format!(
        "\n--- {} · step {} of {} ({}) ---",
        exercise.kind(),
        exercise.step_number(),
        exercise.step_count(),
        exercise.step_name()
    ))?;

    loop {
        let Some(exercise) = session.guided() else {
            return Ok(());
        };
        show_step(exercise, prompter, scenario)?;

        let line = prompter.ask(">")?;
        let command = match GuidedCommand::parse(&line) {
            None => {
                prompter.say("Unknown command; type 'help'.")?;
                continue;
            }
            Some(GuidedCommand::Help) => {
                prompter.say(GUIDED_HELP)?;
                continue;
            }
            Some(GuidedCommand::Next) => match session.apply(SessionEvent::AdvanceGuided) {
                Ok(screen) => {
                    debug!("Guided advance -> {}", screen);
                    return Ok(());
                }
                Err(SessionError::Guided(GuidedError::StepIncomplete("classify"))) => {
                    prompter.say("Every label must be correct before continuing.")?;
                    continue;
                }
                Err(SessionError::Guided(GuidedError::StepIncomplete(_))) => {
                    prompter.say("Please fill in every field before continuing.")?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            },
            Some(GuidedCommand::Set(n, None)) => {
                GuidedCommand::Set(n, Some(prompter.read_block(&format!("Field {}", n))?))
            }
            Some(GuidedCommand::Edit(None)) => {
                GuidedCommand::Edit(Some(prompter.read_block("Combined text")?))
            }
            Some(other) => other,
        };

        let result = match exercise_mut(session)? {
            GuidedExercise::CopyPaste(flow) => edit_copy_paste(flow, command),
            GuidedExercise::DragDrop(flow) => edit_drag_drop(flow, command),
            GuidedExercise::MultiShot(flow) => edit_multi_shot(flow, command),
        };
        if let Err(e) = result {
            prompter.say(&format!("Cannot do that here: {}", e))?;
        }
    }
}

fn exercise_mut<C: SurveyContext>(session: &mut SurveySession<C>) -> Result<&mut GuidedExercise> {
    match session.guided_mut() {
        Some(exercise) => Ok(exercise),
        None => bail!("guided exercise disappeared"),
    }
}

fn show_step<R: BufRead, W: Write>(
    exercise: &GuidedExercise,
    prompter: &mut Prompter<R, W>,
    scenario: ScenarioId,
) -> Result<()> {
    match exercise {
        GuidedExercise::CopyPaste(flow) => match flow.step() {
            CopyPasteStep::Requirements => {
                prompter.say(&format!(
                    "List what an answer for '{}' must contain.",
                    scenario.requirement_field()
                ))?;
                for (i, text) in flow.requirements().enumerate() {
                    prompter.say(&format!("  {}. {}", i + 1, text))?;
                }
            }
            CopyPasteStep::ResponseFormatting => {
                prompter.say("How should the AI respond?")?;
                prompter.say(&format!("  1. When everything is provided: {}", flow.success_example()))?;
                prompter.say(&format!("  2. When information is missing: {}", flow.missing_example()))?;
            }
            CopyPasteStep::ReviewEdit => {
                prompter.say("Review the combined prompt ('edit' to rewrite it):")?;
                prompter.say(flow.combined().unwrap_or_default())?;
            }
        },
        GuidedExercise::DragDrop(flow) => match flow.step() {
            DragDropStep::Classify => {
                prompter.say("Label each prompt good, medium or bad ('<n> <label>'):")?;
                for (i, sample) in SAMPLE_PROMPTS.iter().enumerate() {
                    let mark = match flow.selections().get(i).copied().flatten() {
                        None => "unlabelled".to_string(),
                        Some(label) if flow.is_correct(i) => format!("{} (correct)", label),
                        Some(label) => format!("{} (incorrect)", label),
                    };
                    prompter.say(&format!("  {}. {} [{}]", i + 1, sample.text, mark))?;
                }
            }
            DragDropStep::Explain => {
                prompter.say("Why these prompts differ:")?;
                for sample in SAMPLE_PROMPTS.iter() {
                    prompter.say(&format!("  {}: \"{}\"", sample.quality, sample.text))?;
                    prompter.say(&format!("      {}", sample.rationale))?;
                }
            }
            DragDropStep::Write => {
                prompter.say(&format!(
                    "Write your own validation prompt for '{}' ('edit' to enter it):",
                    scenario.requirement_field()
                ))?;
                prompter.say(flow.user_prompt())?;
            }
        },
        GuidedExercise::MultiShot(flow) => match flow.step() {
            MultiShotStep::Examples => {
                prompter.say("Give three examples: good, medium and bad.")?;
                for (i, text) in flow.examples().iter().enumerate() {
                    prompter.say(&format!("  {}. {}", i + 1, text))?;
                }
            }
            MultiShotStep::Extend => {
                prompter.say("Your previous examples ('edit' to rewrite them):")?;
                prompter.say(flow.aggregate().unwrap_or_default())?;
                prompter.say("Now add three more:")?;
                for (i, text) in flow.extra_examples().iter().enumerate() {
                    prompter.say(&format!("  {}. {}", i + 1, text))?;
                }
            }
        },
    }
    Ok(())
}

fn edit_copy_paste(flow: &mut CopyPasteFlow, command: GuidedCommand) -> Result<(), GuidedError> {
    let step = flow.step();
    match (step, command) {
        (CopyPasteStep::Requirements, GuidedCommand::Set(n, Some(text))) => {
            flow.set_requirement(n - 1, &text)
        }
        (CopyPasteStep::Requirements, GuidedCommand::Add) => flow.add_requirement().map(|_| ()),
        (CopyPasteStep::Requirements, GuidedCommand::Remove(n)) => {
            if n == 0 {
                return Err(GuidedError::IndexOutOfRange(n));
            }
            let removed = flow.remove_requirement(n - 1)?;
            if !removed {
                debug!("Kept the only requirement");
            }
            Ok(())
        }
        (CopyPasteStep::ResponseFormatting, GuidedCommand::Set(1, Some(text))) => {
            flow.set_success_example(&text)
        }
        (CopyPasteStep::ResponseFormatting, GuidedCommand::Set(2, Some(text))) => {
            flow.set_missing_example(&text)
        }
        (CopyPasteStep::ReviewEdit, GuidedCommand::Edit(Some(text))) => flow.set_combined(&text),
        (_, GuidedCommand::Set(n, _)) => Err(GuidedError::IndexOutOfRange(n)),
        (_, GuidedCommand::Edit(_)) => Err(GuidedError::WrongStep {
            expected: CopyPasteStep::ReviewEdit.name(),
            actual: step.name(),
        }),
        _ => Err(GuidedError::WrongStep {
            expected: CopyPasteStep::Requirements.name(),
            actual: step.name(),
        }),
    }
}

fn edit_drag_drop(flow: &mut DragDropFlow, command: GuidedCommand) -> Result<(), GuidedError> {
    let step = flow.step();
    match (step, command) {
        (DragDropStep::Classify, GuidedCommand::Set(n, Some(label))) => match label.parse::<PromptQuality>() {
            Ok(quality) => flow.classify(n - 1, quality),
            Err(_) => Err(GuidedError::IndexOutOfRange(n)),
        },
        (DragDropStep::Write, GuidedCommand::Edit(Some(text))) => flow.set_user_prompt(&text),
        (_, GuidedCommand::Set(n, _)) => Err(GuidedError::IndexOutOfRange(n)),
        _ => Err(GuidedError::WrongStep {
            expected: DragDropStep::Write.name(),
            actual: step.name(),
        }),
    }
}

fn edit_multi_shot(flow: &mut MultiShotFlow, command: GuidedCommand) -> Result<(), GuidedError> {
    let step = flow.step();
    match (step, command) {
        (MultiShotStep::Examples, GuidedCommand::Set(n, Some(text))) => flow.set_example(n - 1, &text),
        (MultiShotStep::Extend, GuidedCommand::Set(n, Some(text))) => {
            flow.set_extra_example(n - 1, &text)
        }
        (MultiShotStep::Extend, GuidedCommand::Edit(Some(text))) => flow.set_aggregate(&text),
        (_, GuidedCommand::Set(n, _)) => Err(GuidedError::IndexOutOfRange(n)),
        _ => Err(GuidedError::WrongStep {
            expected: MultiShotStep::Extend.name(),
            actual: step.name(),
        }),
    }
}

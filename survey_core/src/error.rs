//! Error types for the study core.

use crate::instructions::ScenarioId;
use thiserror::Error;

/// Invariant violations in the core data model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The randomizer was given nothing to shuffle
    #[error("scenario set is empty")]
    EmptyScenarioSet,

    /// An instruction order listed the same scenario twice
    #[error("scenario {0} appears more than once")]
    DuplicateScenario(ScenarioId),

    /// A scenario result arrived for the wrong position
    #[error("scenario result for index {got} recorded out of order (expected {expected})")]
    OutOfOrderResult { expected: usize, got: usize },

    /// A scenario index beyond the configured scenario count
    #[error("scenario index {0} is out of range")]
    ScenarioIndexOutOfRange(usize),

    /// A demographics answer that is not one of the question's options
    #[error("'{answer}' is not a valid answer for {question}")]
    InvalidAnswer {
        question: &'static str,
        answer: String,
    },

    /// Session configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

/// Misuse of a guided flow sub-machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuidedError {
    /// An edit that belongs to a different step
    #[error("operation requires step '{expected}' but the flow is on '{actual}'")]
    WrongStep {
        expected: &'static str,
        actual: &'static str,
    },

    /// Advance attempted while the step's fields are incomplete
    #[error("step '{0}' is incomplete")]
    StepIncomplete(&'static str),

    /// Entry index outside the current list
    #[error("entry {0} does not exist")]
    IndexOutOfRange(usize),

    /// The flow already emitted its payload
    #[error("guided flow has already finished")]
    Finished,
}

/// Rejected session events.
///
/// None of these are fatal; the session state is unchanged when one is
/// returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The event does not belong to the current screen
    #[error("event '{event}' is not accepted on screen {screen}")]
    UnexpectedEvent { screen: String, event: &'static str },

    /// The instruction order is not available yet
    #[error("session is not ready")]
    NotReady,

    /// The session reached the completion screen
    #[error("session is already complete")]
    Finished,

    /// The unguided prompt was blank
    #[error("prompt must not be blank")]
    EmptyPrompt,

    /// Demographics were submitted with unanswered questions
    #[error("demographics are incomplete")]
    IncompleteDemographics,

    #[error(transparent)]
    Guided(#[from] GuidedError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

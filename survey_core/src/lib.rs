//! Survey Core - screen sequencing, guided exercises and result export
//!
//! This library drives one participant through a prompt-writing study:
//! 1. **Ordering**: the four scenarios are shuffled once per session
//! 2. **Sequencing**: a single screen counter resolves to consent,
//!    demographics, or a (scenario, phase) pair
//! 3. **Guided exercises**: interchangeable multi-step flows that assemble
//!    a final prompt from structured input
//! 4. **Aggregation**: per-scenario results plus timings flatten into one
//!    export record handed to an `ExportSink`

pub mod config;
pub mod demographics;
pub mod error;
pub mod guided;
pub mod instructions;
pub mod randomizer;
pub mod results;
pub mod screen;
pub mod session;
pub mod timing;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use config::SessionConfig;
pub use demographics::{Demographics, DemographicsForm, Question, QuestionKind, QUESTIONS};
pub use error::{CoreError, GuidedError, SessionError};
pub use guided::{
    CopyPasteFlow, DragDropFlow, GuidedExercise, GuidedFlow, GuidedKind, GuidedPayload,
    MultiShotFlow, PromptQuality,
    StepTimes,
};
pub use instructions::ScenarioId;
pub use randomizer::{InstructionOrder, InstructionRandomizer};
pub use results::{RecordOutcome, ScenarioResult, UserData};
pub use screen::{Phase, Screen, COMPLETE_SCREEN, SCENARIO_COUNT};
pub use session::{SessionEvent, SurveySession};
pub use timing::{TimeLog, TimeLogs, TimingRecorder};

//! Guided Flow Assembler - interchangeable multi-step exercises.
//!
//! Every guided exercise turns a few steps of participant input into one
//! `GuidedPayload`. The sequencer only sees the `GuidedFlow` contract; which
//! concrete exercise runs for a scenario is decided by `SessionConfig`.
//!
//! - `CopyPasteFlow`: requirements → response formatting → review/edit
//! - `DragDropFlow`: classify sample prompts → explanation → own prompt
//! - `MultiShotFlow`: three examples → review/edit of their aggregate

pub mod copy_paste;
pub mod drag_drop;
pub mod multi_shot;

pub use copy_paste::{CopyPasteFlow, CopyPasteStep};
pub use drag_drop::{DragDropFlow, DragDropStep, PromptQuality, SAMPLE_PROMPTS};
pub use multi_shot::{MultiShotFlow, MultiShotStep};

use crate::error::GuidedError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Separator for the single-line requirements string exported as `G_DETAILS`.
pub const DETAILS_SEPARATOR: &str = " & ";

/// Guided exercise variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuidedKind {
    /// Extract requirements, give formatting examples, edit the combined prompt
    #[default]
    CopyPaste,

    /// Classify sample prompts by quality, then write one
    DragDrop,

    /// Write three examples, edit their aggregate
    MultiShot,
}

impl GuidedKind {
    pub fn all() -> Vec<GuidedKind> {
        vec![GuidedKind::CopyPaste, GuidedKind::DragDrop, GuidedKind::MultiShot]
    }

    pub fn name(&self) -> &'static str {
        match self {
            GuidedKind::CopyPaste => "copy-paste",
            GuidedKind::DragDrop => "drag-drop",
            GuidedKind::MultiShot => "multi-shot",
        }
    }

    /// Starts a fresh exercise of this kind.
    pub fn start(&self, now: Duration) -> GuidedExercise {
        match self {
            GuidedKind::CopyPaste => GuidedExercise::CopyPaste(CopyPasteFlow::new(now)),
            GuidedKind::DragDrop => GuidedExercise::DragDrop(DragDropFlow::new(now)),
            GuidedKind::MultiShot => GuidedExercise::MultiShot(MultiShotFlow::new(now)),
        }
    }
}

impl std::fmt::Display for GuidedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for GuidedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "copy-paste" | "copy_paste" | "copypaste" => Ok(GuidedKind::CopyPaste),
            "drag-drop" | "drag_drop" | "dragdrop" | "classify" => Ok(GuidedKind::DragDrop),
            "multi-shot" | "multi_shot" | "multishot" => Ok(GuidedKind::MultiShot),
            _ => Err(format!("Unknown guided exercise: {}", s)),
        }
    }
}

/// Elapsed seconds per guided step (1-based).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTimes([Option<u64>; 3]);

impl StepTimes {
    pub fn get(&self, step: usize) -> Option<u64> {
        step.checked_sub(1)
            .and_then(|i| self.0.get(i))
            .copied()
            .flatten()
    }

    pub fn set(&mut self, step: usize, secs: u64) {
        if let Some(slot) = step.checked_sub(1).and_then(|i| self.0.get_mut(i)) {
            *slot = Some(secs);
        }
    }
}

/// What a finished guided exercise hands to the result aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidedPayload {
    pub kind: GuidedKind,

    /// Trimmed, non-blank entries in the order they were written
    pub requirements: Vec<String>,

    /// `requirements` joined with `DETAILS_SEPARATOR`
    pub details_combined: String,

    pub success_example: String,
    pub missing_example: String,

    /// The editable block as it stood at confirmation
    pub final_prompt: String,

    pub step_times: StepTimes,
}

/// Joins trimmed, non-blank entries for the `G_DETAILS` export column.
pub fn details_combined<S: AsRef<str>>(entries: &[S]) -> String {
    non_blank(entries).join(DETAILS_SEPARATOR)
}

pub(crate) fn non_blank<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.as_ref().trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Contract shared by every guided exercise.
///
/// Steps only move forward. `advance` on the last step is the confirmation:
/// it returns the payload and the flow is finished.
pub trait GuidedFlow {
    fn kind(&self) -> GuidedKind;

    /// Current step, starting at 1.
    fn step_number(&self) -> usize;

    fn step_count(&self) -> usize;

    fn step_name(&self) -> &'static str;

    /// Whether the current step's fields satisfy its validity predicate.
    fn can_advance(&self) -> bool;

    /// Leaves the current step, recording its elapsed time.
    fn advance(&mut self, now: Duration) -> Result<Option<GuidedPayload>, GuidedError>;

    fn is_finished(&self) -> bool;
}

/// The exercise running on a guided screen.
#[derive(Debug, Clone)]
pub enum GuidedExercise {
    CopyPaste(CopyPasteFlow),
    DragDrop(DragDropFlow),
    MultiShot(MultiShotFlow),
}

impl GuidedExercise {
    fn flow(&self) -> &dyn GuidedFlow {
        match self {
            GuidedExercise::CopyPaste(flow) => flow,
            GuidedExercise::DragDrop(flow) => flow,
            GuidedExercise::MultiShot(flow) => flow,
        }
    }

    fn flow_mut(&mut self) -> &mut dyn GuidedFlow {
        match self {
            GuidedExercise::CopyPaste(flow) => flow,
            GuidedExercise::DragDrop(flow) => flow,
            GuidedExercise::MultiShot(flow) => flow,
        }
    }
}

impl GuidedFlow for GuidedExercise {
    fn kind(&self) -> GuidedKind {
        self.flow().kind()
    }

    fn step_number(&self) -> usize {
        self.flow().step_number()
    }

    fn step_count(&self) -> usize {
        self.flow().step_count()
    }

    fn step_name(&self) -> &'static str {
        self.flow().step_name()
    }

    fn can_advance(&self) -> bool {
        self.flow().can_advance()
    }

    fn advance(&mut self, now: Duration) -> Result<Option<GuidedPayload>, GuidedError> {
        self.flow_mut().advance(now)
    }

    fn is_finished(&self) -> bool {
        self.flow().is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_combined_skips_blanks() {
        let entries = ["  date and time ", "", "   ", "location"];
        assert_eq!(details_combined(&entries), "date and time & location");
    }

    #[test]
    fn test_step_times_are_one_based() {
        let mut times = StepTimes::default();
        times.set(1, 12);
        times.set(3, 4);
        times.set(0, 99);
        times.set(4, 99);
        assert_eq!(times.get(1), Some(12));
        assert_eq!(times.get(2), None);
        assert_eq!(times.get(3), Some(4));
        assert_eq!(times.get(0), None);
    }

    #[test]
    fn test_kind_starts_matching_exercise() {
        for kind in GuidedKind::all() {
            let exercise = kind.start(Duration::ZERO);
            assert_eq!(exercise.kind(), kind);
            assert_eq!(exercise.step_number(), 1);
            assert!(!exercise.is_finished());
        }
    }

    #[test]
    fn test_kind_parses_names() {
        assert_eq!("multi-shot".parse::<GuidedKind>(), Ok(GuidedKind::MultiShot));
        assert_eq!("COPY_PASTE".parse::<GuidedKind>(), Ok(GuidedKind::CopyPaste));
        assert_eq!("drag_drop".parse::<GuidedKind>(), Ok(GuidedKind::DragDrop));
        assert!("drag-and-paste".parse::<GuidedKind>().is_err());
    }
}

//! Three-step guided exercise.
//!
//! 1. Requirements: a growable list of what the prompt must cover
//! 2. Response formatting: a success example and a missing-information example
//! 3. Review/edit: a combined block synthesized once from steps 1 and 2

use super::{details_combined, non_blank, GuidedFlow, GuidedKind, GuidedPayload, StepTimes};
use crate::error::GuidedError;
use crate::timing::TimingRecorder;
use std::time::Duration;
use tracing::{debug, warn};

/// Requirement slots shown when the exercise opens.
pub const INITIAL_REQUIREMENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPasteStep {
    Requirements,
    ResponseFormatting,
    ReviewEdit,
}

impl CopyPasteStep {
    pub fn number(&self) -> usize {
        match self {
            CopyPasteStep::Requirements => 1,
            CopyPasteStep::ResponseFormatting => 2,
            CopyPasteStep::ReviewEdit => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CopyPasteStep::Requirements => "requirements",
            CopyPasteStep::ResponseFormatting => "response-formatting",
            CopyPasteStep::ReviewEdit => "review-edit",
        }
    }
}

/// A requirement entry. The id stays stable across removals.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Requirement {
    id: u32,
    text: String,
}

/// Builds the editable block shown on the review step.
///
/// Requirements are trimmed and blanks dropped; the examples go in as written.
pub fn synthesize_prompt<S: AsRef<str>>(requirements: &[S], success: &str, missing: &str) -> String {
    format!(
        "REQUIREMENTS:\n- {}\n\nAI RESPONSE FORMATTING (SUCCESS):\n{}\n\nAI RESPONSE FORMATTING (MISSING):\n{}",
        non_blank(requirements).join("\n- "),
        success,
        missing
    )
}

#[derive(Debug, Clone)]
pub struct CopyPasteFlow {
    step: CopyPasteStep,
    requirements: Vec<Requirement>,
    next_id: u32,
    success_example: String,
    missing_example: String,
    combined: Option<String>,
    recorder: TimingRecorder,
    step_times: StepTimes,
    finished: bool,
}

impl CopyPasteFlow {
    pub fn new(now: Duration) -> Self {
        let requirements = (1..=INITIAL_REQUIREMENTS as u32)
            .map(|id| Requirement {
                id,
                text: String::new(),
            })
            .collect();

        Self {
            step: CopyPasteStep::Requirements,
            requirements,
            next_id: INITIAL_REQUIREMENTS as u32 + 1,
            success_example: String::new(),
            missing_example: String::new(),
            combined: None,
            recorder: TimingRecorder::new(now),
            step_times: StepTimes::default(),
            finished: false,
        }
    }

    pub fn step(&self) -> CopyPasteStep {
        self.step
    }

    pub fn requirements(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().map(|r| r.text.as_str())
    }

    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
    }

    pub fn success_example(&self) -> &str {
        &self.success_example
    }

    pub fn missing_example(&self) -> &str {
        &self.missing_example
    }

    /// The review block, once it has been generated.
    pub fn combined(&self) -> Option<&str> {
        self.combined.as_deref()
    }

    pub fn step_times(&self) -> StepTimes {
        self.step_times
    }

    fn ensure_step(&self, expected: CopyPasteStep) -> Result<(), GuidedError> {
        if self.finished {
            return Err(GuidedError::Finished);
        }
        if self.step != expected {
            return Err(GuidedError::WrongStep {
                expected: expected.name(),
                actual: self.step.name(),
            });
        }
        Ok(())
    }

    pub fn set_requirement(&mut self, index: usize, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(CopyPasteStep::Requirements)?;
        let entry = self
            .requirements
            .get_mut(index)
            .ok_or(GuidedError::IndexOutOfRange(index))?;
        entry.text = text.to_string();
        Ok(())
    }

    /// Appends an empty requirement and returns its index.
    pub fn add_requirement(&mut self) -> Result<usize, GuidedError> {
        self.ensure_step(CopyPasteStep::Requirements)?;
        self.requirements.push(Requirement {
            id: self.next_id,
            text: String::new(),
        });
        self.next_id += 1;
        Ok(self.requirements.len() - 1)
    }

    /// Removes a requirement. The last remaining entry is kept; returns
    /// whether anything was removed.
    pub fn remove_requirement(&mut self, index: usize) -> Result<bool, GuidedError> {
        self.ensure_step(CopyPasteStep::Requirements)?;
        if index >= self.requirements.len() {
            return Err(GuidedError::IndexOutOfRange(index));
        }
        if self.requirements.len() == 1 {
            warn!("Refusing to remove the only requirement entry");
            return Ok(false);
        }
        let removed = self.requirements.remove(index);
        debug!("Removed requirement #{}", removed.id);
        Ok(true)
    }

    pub fn set_success_example(&mut self, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(CopyPasteStep::ResponseFormatting)?;
        self.success_example = text.to_string();
        Ok(())
    }

    pub fn set_missing_example(&mut self, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(CopyPasteStep::ResponseFormatting)?;
        self.missing_example = text.to_string();
        Ok(())
    }

    /// Replaces the review block with the participant's edit.
    pub fn set_combined(&mut self, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(CopyPasteStep::ReviewEdit)?;
        self.combined = Some(text.to_string());
        Ok(())
    }

    fn requirement_texts(&self) -> Vec<&str> {
        self.requirements.iter().map(|r| r.text.as_str()).collect()
    }

    fn payload(&mut self) -> GuidedPayload {
        let texts = self.requirement_texts();
        GuidedPayload {
            kind: GuidedKind::CopyPaste,
            requirements: non_blank(&texts),
            details_combined: details_combined(&texts),
            success_example: self.success_example.clone(),
            missing_example: self.missing_example.clone(),
            final_prompt: self.combined.take().unwrap_or_default(),
            step_times: self.step_times,
        }
    }
}

impl GuidedFlow for CopyPasteFlow {
    fn kind(&self) -> GuidedKind {
        GuidedKind::CopyPaste
    }

    fn step_number(&self) -> usize {
        self.step.number()
    }

    fn step_count(&self) -> usize {
        3
    }

    fn step_name(&self) -> &'static str {
        self.step.name()
    }

    fn can_advance(&self) -> bool {
        if self.finished {
            return false;
        }
        match self.step {
            CopyPasteStep::Requirements => self.requirements.iter().all(|r| !r.text.trim().is_empty()),
            CopyPasteStep::ResponseFormatting => {
                !self.success_example.trim().is_empty() && !self.missing_example.trim().is_empty()
            }
            CopyPasteStep::ReviewEdit => self
                .combined
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty()),
        }
    }

    fn advance(&mut self, now: Duration) -> Result<Option<GuidedPayload>, GuidedError> {
        if self.finished {
            return Err(GuidedError::Finished);
        }
        if !self.can_advance() {
            return Err(GuidedError::StepIncomplete(self.step.name()));
        }

        let elapsed = self.recorder.elapsed_secs(now);
        self.step_times.set(self.step.number(), elapsed);
        self.recorder.enter(now);
        debug!("Guided step '{}' took {}s", self.step.name(), elapsed);

        match self.step {
            CopyPasteStep::Requirements => {
                self.step = CopyPasteStep::ResponseFormatting;
                Ok(None)
            }
            CopyPasteStep::ResponseFormatting => {
                if self.combined.is_none() {
                    let texts = self.requirement_texts();
                    self.combined = Some(synthesize_prompt(
                        &texts,
                        &self.success_example,
                        &self.missing_example,
                    ));
                }
                self.step = CopyPasteStep::ReviewEdit;
                Ok(None)
            }
            CopyPasteStep::ReviewEdit => {
                self.finished = true;
                Ok(Some(self.payload()))
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn filled(now: Duration) -> CopyPasteFlow {
        let mut flow = CopyPasteFlow::new(now);
        flow.set_requirement(0, "Date and time").unwrap();
        flow.set_requirement(1, "Location").unwrap();
        flow.remove_requirement(2).unwrap();
        flow
    }

    #[test]
    fn test_starts_with_three_empty_requirements() {
        let flow = CopyPasteFlow::new(Duration::ZERO);
        assert_eq!(flow.requirement_count(), 3);
        assert!(flow.requirements().all(str::is_empty));
        assert!(!flow.can_advance());
    }

    #[test]
    fn test_blank_requirements_block_advance() {
        let mut flow = CopyPasteFlow::new(Duration::ZERO);
        flow.set_requirement(0, "Date and time").unwrap();
        flow.set_requirement(1, "Location").unwrap();
        flow.set_requirement(2, "   ").unwrap();
        assert!(!flow.can_advance());
        assert_eq!(
            flow.advance(secs(5)),
            Err(GuidedError::StepIncomplete("requirements"))
        );
        assert_eq!(flow.step(), CopyPasteStep::Requirements);
    }

    #[test]
    fn test_last_requirement_cannot_be_removed() {
        let mut flow = CopyPasteFlow::new(Duration::ZERO);
        assert_eq!(flow.remove_requirement(0), Ok(true));
        assert_eq!(flow.remove_requirement(0), Ok(true));
        assert_eq!(flow.remove_requirement(0), Ok(false));
        assert_eq!(flow.requirement_count(), 1);
        assert_eq!(flow.remove_requirement(3), Err(GuidedError::IndexOutOfRange(3)));
    }

    #[test]
    fn test_add_requirement_appends_empty_entry() {
        let mut flow = CopyPasteFlow::new(Duration::ZERO);
        let index = flow.add_requirement().unwrap();
        assert_eq!(index, 3);
        flow.set_requirement(index, "Injuries").unwrap();
        assert_eq!(flow.requirements().last(), Some("Injuries"));
    }

    #[test]
    fn test_edits_are_bound_to_their_step() {
        let mut flow = CopyPasteFlow::new(Duration::ZERO);
        assert_eq!(
            flow.set_success_example("x"),
            Err(GuidedError::WrongStep {
                expected: "response-formatting",
                actual: "requirements"
            })
        );
        assert!(flow.set_combined("x").is_err());
    }

    #[test]
    fn test_formatting_step_needs_both_examples() {
        let mut flow = filled(Duration::ZERO);
        flow.advance(secs(10)).unwrap();
        flow.set_success_example("Report filed.").unwrap();
        assert!(!flow.can_advance());
        flow.set_missing_example("  ").unwrap();
        assert!(!flow.can_advance());
        flow.set_missing_example("Please provide the date.").unwrap();
        assert!(flow.can_advance());
    }

    #[test]
    fn test_combined_block_template() {
        let mut flow = filled(Duration::ZERO);
        flow.advance(secs(10)).unwrap();
        flow.set_success_example("Report filed.").unwrap();
        flow.set_missing_example("Please provide the date.").unwrap();
        flow.advance(secs(25)).unwrap();

        assert_eq!(
            flow.combined(),
            Some(
                "REQUIREMENTS:\n- Date and time\n- Location\n\n\
                 AI RESPONSE FORMATTING (SUCCESS):\nReport filed.\n\n\
                 AI RESPONSE FORMATTING (MISSING):\nPlease provide the date."
            )
        );
    }

    #[test]
    fn test_combined_block_keeps_example_whitespace() {
        let prompt = synthesize_prompt(&[" Date ", "", "Location"], "  Filed.\n", "\nMissing: date ");
        assert_eq!(
            prompt,
            "REQUIREMENTS:\n- Date\n- Location\n\n\
             AI RESPONSE FORMATTING (SUCCESS):\n  Filed.\n\n\n\
             AI RESPONSE FORMATTING (MISSING):\n\nMissing: date "
        );
    }

    #[test]
    fn test_full_flow_payload() {
        let mut flow = filled(Duration::ZERO);
        assert_eq!(flow.advance(secs(12)), Ok(None));
        flow.set_success_example("ok").unwrap();
        flow.set_missing_example("missing").unwrap();
        assert_eq!(flow.advance(Duration::from_millis(20_600)), Ok(None));
        flow.set_combined("CUSTOM TEXT").unwrap();

        let payload = flow.advance(secs(30)).unwrap().unwrap();
        assert_eq!(payload.kind, GuidedKind::CopyPaste);
        assert_eq!(payload.requirements, vec!["Date and time", "Location"]);
        assert_eq!(payload.details_combined, "Date and time & Location");
        assert_eq!(payload.final_prompt, "CUSTOM TEXT");
        assert_eq!(payload.step_times.get(1), Some(12));
        assert_eq!(payload.step_times.get(2), Some(9));
        assert_eq!(payload.step_times.get(3), Some(9));

        assert!(flow.is_finished());
        assert_eq!(flow.advance(secs(31)), Err(GuidedError::Finished));
    }

    #[test]
    fn test_clearing_combined_blocks_confirmation() {
        let mut flow = filled(Duration::ZERO);
        flow.advance(secs(1)).unwrap();
        flow.set_success_example("ok").unwrap();
        flow.set_missing_example("missing").unwrap();
        flow.advance(secs(2)).unwrap();
        flow.set_combined("\n  \n").unwrap();
        assert_eq!(
            flow.advance(secs(3)),
            Err(GuidedError::StepIncomplete("review-edit"))
        );
    }
}

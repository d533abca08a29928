//! Three-step classification exercise.
//!
//! 1. Classify: label three fixed validation prompts good, medium or bad
//! 2. Explain: read why each prompt earned its label
//! 3. Write: the participant's own validation prompt

use super::{GuidedFlow, GuidedKind, GuidedPayload, StepTimes, DETAILS_SEPARATOR};
use crate::error::GuidedError;
use crate::timing::TimingRecorder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptQuality {
    Good,
    Medium,
    Bad,
}

impl PromptQuality {
    pub fn all() -> [PromptQuality; 3] {
        [PromptQuality::Good, PromptQuality::Medium, PromptQuality::Bad]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PromptQuality::Good => "good",
            PromptQuality::Medium => "medium",
            PromptQuality::Bad => "bad",
        }
    }
}

impl std::fmt::Display for PromptQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PromptQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" | "g" => Ok(PromptQuality::Good),
            "medium" | "m" => Ok(PromptQuality::Medium),
            "bad" | "b" => Ok(PromptQuality::Bad),
            _ => Err(format!("Unknown prompt quality: {}", s)),
        }
    }
}

/// A fixed prompt to classify, with its true label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePrompt {
    pub text: &'static str,
    pub quality: PromptQuality,
    /// Shown on the explanation step
    pub rationale: &'static str,
}

/// The prompts, in the order they are shown.
pub static SAMPLE_PROMPTS: [SamplePrompt; 3] = [
    SamplePrompt {
        text: "Validate that all required fields are filled: name, date, location, and description. \
               Check that the date is in MM/DD/YYYY format and the description is at least 50 characters.",
        quality: PromptQuality::Good,
        rationale: "Names exactly which fields to check and gives a concrete format and length.",
    },
    SamplePrompt {
        text: "Verify the name, date, and description fields are present, and make sure the \
               description is long enough.",
        quality: PromptQuality::Medium,
        rationale: "Lists some fields but says \"long enough\" instead of a number.",
    },
    SamplePrompt {
        text: "Make sure everything looks good.",
        quality: PromptQuality::Bad,
        rationale: "No fields, formats or criteria at all.",
    },
];

/// Text of the sample labelled good.
pub fn good_example() -> &'static str {
    SAMPLE_PROMPTS
        .iter()
        .find(|p| p.quality == PromptQuality::Good)
        .map(|p| p.text)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDropStep {
    Classify,
    Explain,
    Write,
}

impl DragDropStep {
    pub fn number(&self) -> usize {
        match self {
            DragDropStep::Classify => 1,
            DragDropStep::Explain => 2,
            DragDropStep::Write => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DragDropStep::Classify => "classify",
            DragDropStep::Explain => "explain",
            DragDropStep::Write => "write",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragDropFlow {
    step: DragDropStep,
    selections: [Option<PromptQuality>; 3],
    user_prompt: String,
    recorder: TimingRecorder,
    step_times: StepTimes,
    finished: bool,
}

impl DragDropFlow {
    pub fn new(now: Duration) -> Self {
        Self {
            step: DragDropStep::Classify,
            selections: [None; 3],
            user_prompt: String::new(),
            recorder: TimingRecorder::new(now),
            step_times: StepTimes::default(),
            finished: false,
        }
    }

    pub fn step(&self) -> DragDropStep {
        self.step
    }

    pub fn selections(&self) -> &[Option<PromptQuality>] {
        &self.selections
    }

    /// Whether the label chosen for sample `index` is its true label.
    pub fn is_correct(&self, index: usize) -> bool {
        match (self.selections.get(index), SAMPLE_PROMPTS.get(index)) {
            (Some(Some(chosen)), Some(sample)) => *chosen == sample.quality,
            _ => false,
        }
    }

    pub fn user_prompt(&self) -> &str {
        &self.user_prompt
    }

    fn ensure_step(&self, expected: DragDropStep) -> Result<(), GuidedError> {
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

    pub fn classify(&mut self, index: usize, quality: PromptQuality) -> Result<(), GuidedError> {
        self.ensure_step(DragDropStep::Classify)?;
        let slot = self
            .selections
            .get_mut(index)
            .ok_or(GuidedError::IndexOutOfRange(index))?;
        *slot = Some(quality);
        Ok(())
    }

    pub fn set_user_prompt(&mut self, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(DragDropStep::Write)?;
        self.user_prompt = text.to_string();
        Ok(())
    }

    /// `sample=label` pairs in sample order.
    fn selection_entries(&self) -> Vec<String> {
        SAMPLE_PROMPTS
            .iter()
            .zip(self.selections.iter())
            .map(|(sample, chosen)| {
                let label = chosen.map(|q| q.name()).unwrap_or_default();
                format!("{}={}", sample.quality, label)
            })
            .collect()
    }

    fn payload(&mut self) -> GuidedPayload {
        let entries = self.selection_entries();
        GuidedPayload {
            kind: GuidedKind::DragDrop,
            details_combined: entries.join(DETAILS_SEPARATOR),
            requirements: entries,
            success_example: good_example().to_string(),
            missing_example: String::new(),
            final_prompt: std::mem::take(&mut self.user_prompt),
            step_times: self.step_times,
        }
    }
}

impl GuidedFlow for DragDropFlow {
    fn kind(&self) -> GuidedKind {
        GuidedKind::DragDrop
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
            DragDropStep::Classify => (0..SAMPLE_PROMPTS.len()).all(|i| self.is_correct(i)),
            DragDropStep::Explain => true,
            DragDropStep::Write => !self.user_prompt.trim().is_empty(),
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
        debug!("Classification step '{}' took {}s", self.step.name(), elapsed);

        match self.step {
            DragDropStep::Classify => {
                self.step = DragDropStep::Explain;
                Ok(None)
            }
            DragDropStep::Explain => {
                self.step = DragDropStep::Write;
                Ok(None)
            }
            DragDropStep::Write => {
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

    fn classified(now: Duration) -> DragDropFlow {
        let mut flow = DragDropFlow::new(now);
        for (i, sample) in SAMPLE_PROMPTS.iter().enumerate() {
            flow.classify(i, sample.quality).unwrap();
        }
        flow
    }

    #[test]
    fn test_unclassified_samples_block_advance() {
        let mut flow = DragDropFlow::new(Duration::ZERO);
        flow.classify(0, PromptQuality::Good).unwrap();
        assert!(!flow.can_advance());
        assert_eq!(flow.advance(secs(3)), Err(GuidedError::StepIncomplete("classify")));
    }

    #[test]
    fn test_wrong_label_blocks_advance() {
        let mut flow = DragDropFlow::new(Duration::ZERO);
        flow.classify(0, PromptQuality::Good).unwrap();
        flow.classify(1, PromptQuality::Bad).unwrap();
        flow.classify(2, PromptQuality::Medium).unwrap();
        assert!(flow.is_correct(0));
        assert!(!flow.is_correct(1));
        assert!(!flow.can_advance());

        flow.classify(1, PromptQuality::Medium).unwrap();
        flow.classify(2, PromptQuality::Bad).unwrap();
        assert!(flow.can_advance());
        assert_eq!(flow.classify(3, PromptQuality::Bad), Err(GuidedError::IndexOutOfRange(3)));
    }

    #[test]
    fn test_blank_prompt_blocks_finish() {
        let mut flow = classified(Duration::ZERO);
        flow.advance(secs(1)).unwrap();
        flow.advance(secs(2)).unwrap();
        assert_eq!(flow.step(), DragDropStep::Write);
        flow.set_user_prompt(" \n ").unwrap();
        assert_eq!(flow.advance(secs(3)), Err(GuidedError::StepIncomplete("write")));
    }

    #[test]
    fn test_edits_are_bound_to_their_step() {
        let mut flow = DragDropFlow::new(Duration::ZERO);
        assert_eq!(
            flow.set_user_prompt("x"),
            Err(GuidedError::WrongStep {
                expected: "write",
                actual: "classify"
            })
        );
        let mut flow = classified(Duration::ZERO);
        flow.advance(secs(1)).unwrap();
        assert!(flow.classify(0, PromptQuality::Bad).is_err());
    }

    #[test]
    fn test_full_flow_payload() {
        let mut flow = classified(Duration::ZERO);
        assert_eq!(flow.advance(secs(14)), Ok(None));
        assert_eq!(flow.advance(Duration::from_millis(20_500)), Ok(None));
        flow.set_user_prompt("CUSTOM TEXT").unwrap();

        let payload = flow.advance(secs(40)).unwrap().unwrap();
        assert_eq!(payload.kind, GuidedKind::DragDrop);
        assert_eq!(payload.final_prompt, "CUSTOM TEXT");
        assert_eq!(payload.details_combined, "good=good & medium=medium & bad=bad");
        assert_eq!(payload.success_example, good_example());
        assert!(payload.success_example.contains("MM/DD/YYYY"));
        assert_eq!(payload.step_times.get(1), Some(14));
        assert_eq!(payload.step_times.get(2), Some(7));
        assert_eq!(payload.step_times.get(3), Some(20));

        assert!(flow.is_finished());
        assert_eq!(flow.advance(secs(41)), Err(GuidedError::Finished));
    }

    #[test]
    fn test_quality_parses_short_names() {
        assert_eq!("G".parse::<PromptQuality>(), Ok(PromptQuality::Good));
        assert_eq!(" medium ".parse::<PromptQuality>(), Ok(PromptQuality::Medium));
        assert!("great".parse::<PromptQuality>().is_err());
    }
}

//! Two-step multi-shot exercise.
//!
//! Step 1 collects three examples of increasing weakness. Step 2 seeds an
//! editable aggregate from them and asks for three more.

use super::{details_combined, GuidedFlow, GuidedKind, GuidedPayload, StepTimes};
use crate::error::GuidedError;
use crate::timing::TimingRecorder;
use std::time::Duration;
use tracing::debug;

/// Examples requested on each step.
pub const EXAMPLE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiShotStep {
    Examples,
    Extend,
}

impl MultiShotStep {
    pub fn number(&self) -> usize {
        match self {
            MultiShotStep::Examples => 1,
            MultiShotStep::Extend => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MultiShotStep::Examples => "examples",
            MultiShotStep::Extend => "extend",
        }
    }
}

pub fn aggregate_examples(examples: &[String; EXAMPLE_COUNT]) -> String {
    examples
        .iter()
        .enumerate()
        .map(|(i, e)| format!("Example {}: {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn all_filled(entries: &[String]) -> bool {
    entries.iter().all(|e| !e.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct MultiShotFlow {
    step: MultiShotStep,
    examples: [String; EXAMPLE_COUNT],
    extra_examples: [String; EXAMPLE_COUNT],
    aggregate: Option<String>,
    recorder: TimingRecorder,
    step_times: StepTimes,
    finished: bool,
}

impl MultiShotFlow {
    pub fn new(now: Duration) -> Self {
        Self {
            step: MultiShotStep::Examples,
            examples: Default::default(),
            extra_examples: Default::default(),
            aggregate: None,
            recorder: TimingRecorder::new(now),
            step_times: StepTimes::default(),
            finished: false,
        }
    }

    pub fn step(&self) -> MultiShotStep {
        self.step
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn extra_examples(&self) -> &[String] {
        &self.extra_examples
    }

    pub fn aggregate(&self) -> Option<&str> {
        self.aggregate.as_deref()
    }

    fn ensure_step(&self, expected: MultiShotStep) -> Result<(), GuidedError> {
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

    pub fn set_example(&mut self, index: usize, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(MultiShotStep::Examples)?;
        let slot = self
            .examples
            .get_mut(index)
            .ok_or(GuidedError::IndexOutOfRange(index))?;
        *slot = text.to_string();
        Ok(())
    }

    pub fn set_extra_example(&mut self, index: usize, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(MultiShotStep::Extend)?;
        let slot = self
            .extra_examples
            .get_mut(index)
            .ok_or(GuidedError::IndexOutOfRange(index))?;
        *slot = text.to_string();
        Ok(())
    }

    pub fn set_aggregate(&mut self, text: &str) -> Result<(), GuidedError> {
        self.ensure_step(MultiShotStep::Extend)?;
        self.aggregate = Some(text.to_string());
        Ok(())
    }

    fn payload(&mut self) -> GuidedPayload {
        let all: Vec<&String> = self.examples.iter().chain(self.extra_examples.iter()).collect();
        GuidedPayload {
            kind: GuidedKind::MultiShot,
            requirements: all.iter().map(|e| e.trim().to_string()).collect(),
            details_combined: details_combined(&all),
            success_example: String::new(),
            missing_example: String::new(),
            final_prompt: self.aggregate.take().unwrap_or_default(),
            step_times: self.step_times,
        }
    }
}

impl GuidedFlow for MultiShotFlow {
    fn kind(&self) -> GuidedKind {
        GuidedKind::MultiShot
    }

    fn step_number(&self) -> usize {
        self.step.number()
    }

    fn step_count(&self) -> usize {
        2
    }

    fn step_name(&self) -> &'static str {
        self.step.name()
    }

    fn can_advance(&self) -> bool {
        if self.finished {
            return false;
        }
        match self.step {
            MultiShotStep::Examples => all_filled(&self.examples),
            MultiShotStep::Extend => {
                all_filled(&self.extra_examples)
                    && self
                        .aggregate
                        .as_deref()
                        .is_some_and(|a| !a.trim().is_empty())
            }
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
        debug!("Multi-shot step '{}' took {}s", self.step.name(), elapsed);

        match self.step {
            MultiShotStep::Examples => {
                if self.aggregate.is_none() {
                    self.aggregate = Some(aggregate_examples(&self.examples));
                }
                self.step = MultiShotStep::Extend;
                Ok(None)
            }
            MultiShotStep::Extend => {
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

    fn with_examples() -> MultiShotFlow {
        let mut flow = MultiShotFlow::new(Duration::ZERO);
        flow.set_example(0, "good").unwrap();
        flow.set_example(1, "medium").unwrap();
        flow.set_example(2, "bad").unwrap();
        flow
    }

    #[test]
    fn test_examples_must_all_be_filled() {
        let mut flow = MultiShotFlow::new(Duration::ZERO);
        flow.set_example(0, "good").unwrap();
        flow.set_example(1, "medium").unwrap();
        assert!(!flow.can_advance());
        assert_eq!(
            flow.advance(Duration::from_secs(1)),
            Err(GuidedError::StepIncomplete("examples"))
        );
        assert_eq!(flow.set_example(3, "x"), Err(GuidedError::IndexOutOfRange(3)));
    }

    #[test]
    fn test_aggregate_is_seeded_from_examples() {
        let mut flow = with_examples();
        flow.advance(Duration::from_secs(4)).unwrap();
        assert_eq!(
            flow.aggregate(),
            Some("Example 1: good\n\nExample 2: medium\n\nExample 3: bad")
        );
    }

    #[test]
    fn test_payload_keeps_edited_aggregate() {
        let mut flow = with_examples();
        flow.advance(Duration::from_secs(4)).unwrap();
        for i in 0..EXAMPLE_COUNT {
            flow.set_extra_example(i, &format!("extra {}", i + 1)).unwrap();
        }
        flow.set_aggregate("CUSTOM TEXT").unwrap();

        let payload = flow.advance(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!(payload.kind, GuidedKind::MultiShot);
        assert_eq!(payload.final_prompt, "CUSTOM TEXT");
        assert_eq!(payload.requirements.len(), 6);
        assert_eq!(
            payload.details_combined,
            "good & medium & bad & extra 1 & extra 2 & extra 3"
        );
        assert_eq!(payload.step_times.get(1), Some(4));
        assert_eq!(payload.step_times.get(2), Some(6));
        assert_eq!(payload.step_times.get(3), None);
        assert!(flow.is_finished());
    }

    #[test]
    fn test_extend_step_requires_extra_examples() {
        let mut flow = with_examples();
        flow.advance(Duration::from_secs(1)).unwrap();
        assert!(!flow.can_advance());
        assert!(flow.set_example(0, "late edit").is_err());
    }
}

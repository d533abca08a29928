//! Background questionnaire.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// One of a fixed list of options
    Select(&'static [&'static str]),
    /// Free text
    Text,
}

/// One background question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    /// Export key
    pub id: &'static str,
    pub label: &'static str,
    pub kind: QuestionKind,
}

const ONE_TO_TEN: &[&str] = &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];

/// The five questions, in the order they are asked.
pub static QUESTIONS: [Question; 5] = [
    Question {
        id: "experienceWithAI",
        label: "How experienced are you with using AI chatbots (e.g., ChatGPT, Claude, Gemini, Copilot)?",
        kind: QuestionKind::Select(&[
            "0 conversations",
            "1-10 conversations",
            "11-50 conversations",
            "50-100 conversations",
            "101+ conversations",
        ]),
    },
    Question {
        id: "frequencyOfUse",
        label: "How often do you use AI chatbots in a typical week?",
        kind: QuestionKind::Select(&[
            "Never",
            "Less than once per week",
            "1-3 times per week",
            "4-10 times per week",
            "More than 10 times per week",
        ]),
    },
    Question {
        id: "promptConfidence",
        label: "How confident are you in your ability to write an effective AI prompt? (1 = No confidence, 10 = Extremely confident)",
        kind: QuestionKind::Select(ONE_TO_TEN),
    },
    Question {
        id: "writingAbility",
        label: "How would you rate your general writing ability? (1-10, with 5 being average)",
        kind: QuestionKind::Select(ONE_TO_TEN),
    },
    Question {
        id: "usedModels",
        label: "To the best of your memory, list all the AI companies, services, and large language models (LLMs) you have used.",
        kind: QuestionKind::Text,
    },
];

/// Answers to the background questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub experience_with_ai: String,
    pub frequency_of_use: String,
    pub prompt_confidence: String,
    pub writing_ability: String,
    pub used_models: String,
}

impl Demographics {
    /// Answers in question order.
    pub fn answers(&self) -> [&str; 5] {
        [
            &self.experience_with_ai,
            &self.frequency_of_use,
            &self.prompt_confidence,
            &self.writing_ability,
            &self.used_models,
        ]
    }

    /// True once every question has a non-empty answer.
    pub fn is_complete(&self) -> bool {
        self.answers().iter().all(|a| !a.trim().is_empty())
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut String> {
        match index {
            0 => Some(&mut self.experience_with_ai),
            1 => Some(&mut self.frequency_of_use),
            2 => Some(&mut self.prompt_confidence),
            3 => Some(&mut self.writing_ability),
            4 => Some(&mut self.used_models),
            _ => None,
        }
    }
}

/// One-question-at-a-time form.
#[derive(Debug, Clone, Default)]
pub struct DemographicsForm {
    step: usize,
    answers: Demographics,
}

impl DemographicsForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// The question currently shown, or `None` once all are answered.
    pub fn current(&self) -> Option<&'static Question> {
        QUESTIONS.get(self.step)
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Sets the answer to the current question.
    ///
    /// Select answers must match one of the options exactly.
    pub fn answer(&mut self, value: &str) -> Result<(), CoreError> {
        let question = self.current().ok_or(CoreError::InvalidAnswer {
            question: "none",
            answer: value.to_string(),
        })?;
        if let QuestionKind::Select(options) = question.kind {
            if !options.contains(&value) {
                return Err(CoreError::InvalidAnswer {
                    question: question.id,
                    answer: value.to_string(),
                });
            }
        }
        if let Some(slot) = self.answers.slot_mut(self.step) {
            *slot = value.to_string();
        }
        Ok(())
    }

    /// The current question has an answer.
    pub fn can_advance(&self) -> bool {
        self.answers
            .answers()
            .get(self.step)
            .is_some_and(|a| !a.trim().is_empty())
    }

    /// Moves on; returns the completed answers after the last question.
    ///
    /// Does nothing while the current question is unanswered.
    pub fn advance(&mut self) -> Option<Demographics> {
        if !self.can_advance() {
            return None;
        }
        self.step += 1;
        if self.step == QUESTIONS.len() {
            Some(self.answers.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_rejects_unknown_option() {
        let mut form = DemographicsForm::new();
        let err = form.answer("a lot").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAnswer { question: "experienceWithAI", .. }));
        assert!(!form.can_advance());
    }

    #[test]
    fn test_unanswered_question_blocks_advance() {
        let mut form = DemographicsForm::new();
        assert_eq!(form.advance(), None);
        assert_eq!(form.step(), 0);
    }

    #[test]
    fn test_full_form_yields_answers() {
        let mut form = DemographicsForm::new();
        let answers = ["11-50 conversations", "1-3 times per week", "7", "5", "ChatGPT, Claude"];

        let mut result = None;
        for answer in answers {
            form.answer(answer).unwrap();
            result = form.advance();
        }

        let demographics = result.unwrap();
        assert!(demographics.is_complete());
        assert_eq!(demographics.prompt_confidence, "7");
        assert_eq!(demographics.used_models, "ChatGPT, Claude");
        assert!(form.current().is_none());
    }

    #[test]
    fn test_free_text_accepts_anything() {
        let mut form = DemographicsForm::new();
        for answer in ["0 conversations", "Never", "1", "10"] {
            form.answer(answer).unwrap();
            form.advance();
        }
        assert!(form.answer("none that I remember").is_ok());
    }
}

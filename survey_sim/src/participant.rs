//! SimulatedParticipant - scripted answers with seeded variation.
//!
//! Dwell times are log-normal around a median so that timing columns look
//! like real sessions: mostly near the median, with an occasional long pause.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use std::time::Duration;
use survey_core::{Question, QuestionKind, ScenarioId};

/// Spread of the log-normal dwell distribution.
const DWELL_SIGMA: f64 = 0.6;

/// Upper bound on a single pause.
const MAX_DWELL_SECS: f64 = 600.0;

const MODEL_LISTS: &[&str] = &[
    "ChatGPT, Claude",
    "Gemini",
    "Copilot, ChatGPT, Llama",
    "None that I remember",
];

fn subject(scenario: ScenarioId) -> &'static str {
    match scenario {
        ScenarioId::PoliceReport => "police report",
        ScenarioId::RecipeBlog => "recipe post",
        ScenarioId::JobExperience => "job application",
        ScenarioId::InsuranceClaim => "insurance claim",
    }
}

/// A participant driven by a seeded RNG.
pub struct SimulatedParticipant {
    /// Index within the run (for seed derivation)
    index: u64,

    rng: ChaCha8Rng,
}

impl SimulatedParticipant {
    pub fn new(seed: u64, index: u64) -> Self {
        let participant_seed = seed.wrapping_mul(0x9e3779b97f4a7c15) ^ index;
        Self {
            index,
            rng: ChaCha8Rng::seed_from_u64(participant_seed),
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// Time spent on a screen or step, log-normal around `median_secs`.
    pub fn dwell(&mut self, median_secs: f64) -> Duration {
        let z: f64 = self.rng.sample(StandardNormal);
        let secs = (median_secs.max(0.001).ln() + DWELL_SIGMA * z).exp();
        Duration::from_secs_f64(secs.min(MAX_DWELL_SECS))
    }

    /// An answer that the question accepts.
    pub fn answer(&mut self, question: &Question) -> String {
        let options = match question.kind {
            QuestionKind::Select(options) => options,
            QuestionKind::Text => MODEL_LISTS,
        };
        options
            .choose(&mut self.rng)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    }

    pub fn unguided_prompt(&mut self, scenario: ScenarioId) -> String {
        let tone = ["Please", "Can you", "I need you to"]
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Please");
        format!("{} write my {} using the details above.", tone, subject(scenario))
    }

    /// Three requirement entries for the copy-paste exercise.
    pub fn requirements(&mut self, scenario: ScenarioId) -> Vec<String> {
        let mut pool: Vec<&str> = match scenario {
            ScenarioId::PoliceReport => vec!["Date and time", "Location", "Description of the stolen item", "Witnesses"],
            ScenarioId::RecipeBlog => vec!["Ingredient list", "Cooking time", "Serving size", "Personal story"],
            ScenarioId::JobExperience => vec!["Job title", "Dates employed", "Key achievements", "Skills used"],
            ScenarioId::InsuranceClaim => vec!["Policy number", "Date of incident", "Damage description", "Estimated cost"],
        };
        pool.shuffle(&mut self.rng);
        pool.into_iter().take(3).map(str::to_string).collect()
    }

    pub fn success_example(&mut self, scenario: ScenarioId) -> String {
        format!("Here is your completed {}.", subject(scenario))
    }

    pub fn missing_example(&mut self, _scenario: ScenarioId) -> String {
        "Before I can finish, please tell me the missing details.".to_string()
    }

    /// Example `n` (1-based) for the multi-shot exercise.
    pub fn example(&mut self, scenario: ScenarioId, n: usize) -> String {
        let quality = ["good", "medium", "bad"].get(n.saturating_sub(1) % 3).copied().unwrap_or("good");
        format!("{} {} example #{}", scenario.name(), quality, n)
    }

    /// Own validation prompt written after the classification exercise.
    pub fn validation_prompt(&mut self, scenario: ScenarioId) -> String {
        let fields = self.requirements(scenario).join(", ");
        format!(
            "Check the {} field contains: {}. If anything is missing, list exactly what is missing.",
            scenario.requirement_field(),
            fields
        )
    }

    /// Whether a coin flip with probability `p` comes up heads.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::{DemographicsForm, QUESTIONS};

    #[test]
    fn test_same_seed_same_behaviour() {
        let mut a = SimulatedParticipant::new(42, 0);
        let mut b = SimulatedParticipant::new(42, 0);
        assert_eq!(a.dwell(20.0), b.dwell(20.0));
        assert_eq!(
            a.requirements(ScenarioId::RecipeBlog),
            b.requirements(ScenarioId::RecipeBlog)
        );
    }

    #[test]
    fn test_answers_are_accepted_by_form() {
        let mut participant = SimulatedParticipant::new(7, 0);
        let mut form = DemographicsForm::new();
        let mut done = None;
        for question in QUESTIONS.iter() {
            form.answer(&participant.answer(question)).unwrap();
            done = form.advance();
        }
        assert!(done.is_some_and(|d| d.is_complete()));
    }

    #[test]
    fn test_dwell_is_positive_and_bounded() {
        let mut participant = SimulatedParticipant::new(3, 1);
        for _ in 0..200 {
            let d = participant.dwell(20.0);
            assert!(d > Duration::ZERO);
            assert!(d <= Duration::from_secs_f64(MAX_DWELL_SECS));
        }
    }

    #[test]
    fn test_requirements_are_distinct() {
        let mut participant = SimulatedParticipant::new(5, 0);
        let reqs = participant.requirements(ScenarioId::InsuranceClaim);
        assert_eq!(reqs.len(), 3);
        assert!(reqs.iter().all(|r| !r.trim().is_empty()));
        assert_ne!(reqs[0], reqs[1]);
    }
}

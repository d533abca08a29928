//! Result aggregation and flattening into export fields.

use crate::demographics::{Demographics, QUESTIONS};
use crate::error::CoreError;
use crate::guided::GuidedPayload;
use crate::instructions::ScenarioId;
use crate::timing::TimeLog;
use serde::{Deserialize, Serialize};
use survey_env::ExportValue;
use tracing::{debug, info};

/// Consent plus one column per demographics question.
pub const PARTICIPANT_FIELDS: usize = 6;

/// Prefixed columns written for every scenario.
pub const SCENARIO_FIELDS: usize = 11;

/// One completed scenario. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: ScenarioId,
    pub unguided_prompt: String,
    pub guided: GuidedPayload,
    pub instruction_time: Option<u64>,
    pub unguided_time: Option<u64>,
}

impl ScenarioResult {
    fn flatten_into(&self, position: usize, out: &mut Vec<(String, ExportValue)>) {
        let prefix = format!("SCENARIO_{}_", position);
        let key = |suffix: &str| format!("{}{}", prefix, suffix);
        let times = self.guided.step_times;

        out.push((key("INSTRUCTION"), self.scenario.name().into()));
        out.push((key("INSTRUCTION_TIME"), self.instruction_time.into()));
        out.push((key("UN_PROMPT"), self.unguided_prompt.clone().into()));
        out.push((key("UN_PROMPT_TIME"), self.unguided_time.into()));
        out.push((key("G_DETAILS"), self.guided.details_combined.clone().into()));
        out.push((key("G_AI_FULL_EX"), self.guided.success_example.clone().into()));
        out.push((key("G_AI_MISS_EX"), self.guided.missing_example.clone().into()));
        out.push((key("G_FINAL_PROMPT"), self.guided.final_prompt.clone().into()));
        out.push((key("GUIDED_1_TIME"), times.get(1).into()));
        out.push((key("GUIDED_2_TIME"), times.get(2).into()));
        out.push((key("GUIDED_3_TIME"), times.get(3).into()));
    }
}

/// What the caller should do after a result was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// More scenarios remain
    Continue,

    /// The last scenario was recorded; flatten and export
    AllScenariosComplete,
}

/// Everything the participant has provided so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub agreed: bool,
    pub demographics: Demographics,
    results: Vec<ScenarioResult>,
    scenario_count: usize,
}

impl UserData {
    pub fn new(scenario_count: usize) -> Self {
        Self {
            agreed: false,
            demographics: Demographics::default(),
            results: Vec::with_capacity(scenario_count),
            scenario_count,
        }
    }

    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    pub fn scenario_count(&self) -> usize {
        self.scenario_count
    }

    pub fn is_complete(&self) -> bool {
        self.results.len() == self.scenario_count
    }

    /// Appends the result for `scenario_index`.
    ///
    /// Results must arrive once per index in increasing order.
    pub fn record_scenario_result(
        &mut self,
        scenario_index: usize,
        scenario: ScenarioId,
        unguided_prompt: String,
        guided: GuidedPayload,
        time_log: &TimeLog,
    ) -> Result<RecordOutcome, CoreError> {
        if scenario_index >= self.scenario_count {
            return Err(CoreError::ScenarioIndexOutOfRange(scenario_index));
        }
        if scenario_index != self.results.len() {
            return Err(CoreError::OutOfOrderResult {
                expected: self.results.len(),
                got: scenario_index,
            });
        }

        self.results.push(ScenarioResult {
            scenario,
            unguided_prompt,
            guided,
            instruction_time: time_log.instruction(),
            unguided_time: time_log.unguided(),
        });
        debug!(
            "Recorded result {}/{} for {}",
            self.results.len(),
            self.scenario_count,
            scenario
        );

        if self.is_complete() {
            info!("All {} scenarios recorded", self.scenario_count);
            Ok(RecordOutcome::AllScenariosComplete)
        } else {
            Ok(RecordOutcome::Continue)
        }
    }

    /// Flattens consent, demographics and every result into ordered
    /// export fields.
    pub fn flatten(&self) -> Vec<(String, ExportValue)> {
        let mut out = Vec::with_capacity(PARTICIPANT_FIELDS + SCENARIO_FIELDS * self.results.len());

        let consent = if self.agreed { "Yes" } else { "No" };
        out.push(("agreed".to_string(), consent.into()));
        for (question, answer) in QUESTIONS.iter().zip(self.demographics.answers()) {
            out.push((question.id.to_string(), answer.into()));
        }

        for (i, result) in self.results.iter().enumerate() {
            result.flatten_into(i + 1, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guided::{GuidedKind, StepTimes};
    use std::collections::HashSet;

    fn payload(final_prompt: &str) -> GuidedPayload {
        let mut step_times = StepTimes::default();
        step_times.set(1, 11);
        step_times.set(2, 22);
        step_times.set(3, 33);
        GuidedPayload {
            kind: GuidedKind::CopyPaste,
            requirements: vec!["a".into(), "b".into()],
            details_combined: "a & b".into(),
            success_example: "full".into(),
            missing_example: "miss".into(),
            final_prompt: final_prompt.into(),
            step_times,
        }
    }

    fn time_log() -> TimeLog {
        let mut log = TimeLog::default();
        log.set_instruction(5);
        log.set_unguided(40);
        log
    }

    fn complete_user() -> UserData {
        let mut user = UserData::new(4);
        user.agreed = true;
        user.demographics = Demographics {
            experience_with_ai: "Intermediate".into(),
            frequency_of_use: "Daily".into(),
            prompt_confidence: "Confident".into(),
            writing_ability: "Good".into(),
            used_models: "GPT-4, Claude".into(),
        };
        for (i, scenario) in ScenarioId::all().into_iter().enumerate() {
            user.record_scenario_result(i, scenario, format!("prompt {}", i), payload("final"), &time_log())
                .unwrap();
        }
        user
    }

    #[test]
    fn test_only_last_result_completes() {
        let mut user = UserData::new(4);
        let ids = ScenarioId::all();
        for i in 0..3 {
            let outcome = user
                .record_scenario_result(i, ids[i], "p".into(), payload("x"), &time_log())
                .unwrap();
            assert_eq!(outcome, RecordOutcome::Continue);
        }
        let outcome = user
            .record_scenario_result(3, ids[3], "p".into(), payload("x"), &time_log())
            .unwrap();
        assert_eq!(outcome, RecordOutcome::AllScenariosComplete);
    }

    #[test]
    fn test_out_of_order_result_rejected() {
        let mut user = UserData::new(4);
        let err = user
            .record_scenario_result(1, ScenarioId::RecipeBlog, "p".into(), payload("x"), &time_log())
            .unwrap_err();
        assert_eq!(err, CoreError::OutOfOrderResult { expected: 0, got: 1 });

        user.record_scenario_result(0, ScenarioId::RecipeBlog, "p".into(), payload("x"), &time_log())
            .unwrap();
        let err = user
            .record_scenario_result(0, ScenarioId::RecipeBlog, "p".into(), payload("x"), &time_log())
            .unwrap_err();
        assert_eq!(err, CoreError::OutOfOrderResult { expected: 1, got: 0 });
        assert_eq!(user.results().len(), 1);
    }

    #[test]
    fn test_index_beyond_count_rejected() {
        let mut user = UserData::new(1);
        assert_eq!(
            user.record_scenario_result(1, ScenarioId::RecipeBlog, "p".into(), payload("x"), &time_log()),
            Err(CoreError::ScenarioIndexOutOfRange(1))
        );
    }

    #[test]
    fn test_flatten_has_fifty_unique_keys() {
        let fields = complete_user().flatten();
        assert_eq!(fields.len(), 50);
        let keys: HashSet<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys.len(), 50);
    }

    #[test]
    fn test_flatten_values() {
        let fields = complete_user().flatten();
        let get = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.render())
                .unwrap()
        };

        assert_eq!(get("agreed"), "Yes");
        assert_eq!(get("usedModels"), "GPT-4, Claude");
        assert_eq!(get("SCENARIO_1_INSTRUCTION"), "police-report");
        assert_eq!(get("SCENARIO_2_UN_PROMPT"), "prompt 1");
        assert_eq!(get("SCENARIO_3_INSTRUCTION_TIME"), "5");
        assert_eq!(get("SCENARIO_3_UN_PROMPT_TIME"), "40");
        assert_eq!(get("SCENARIO_4_G_DETAILS"), "a & b");
        assert_eq!(get("SCENARIO_4_G_FINAL_PROMPT"), "final");
        assert_eq!(get("SCENARIO_4_GUIDED_3_TIME"), "33");
    }

    #[test]
    fn test_flatten_key_order() {
        let fields = complete_user().flatten();
        let keys: Vec<&str> = fields.iter().take(17).map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "agreed",
                "experienceWithAI",
                "frequencyOfUse",
                "promptConfidence",
                "writingAbility",
                "usedModels",
                "SCENARIO_1_INSTRUCTION",
                "SCENARIO_1_INSTRUCTION_TIME",
                "SCENARIO_1_UN_PROMPT",
                "SCENARIO_1_UN_PROMPT_TIME",
                "SCENARIO_1_G_DETAILS",
                "SCENARIO_1_G_AI_FULL_EX",
                "SCENARIO_1_G_AI_MISS_EX",
                "SCENARIO_1_G_FINAL_PROMPT",
                "SCENARIO_1_GUIDED_1_TIME",
                "SCENARIO_1_GUIDED_2_TIME",
                "SCENARIO_1_GUIDED_3_TIME",
            ]
        );
    }

    #[test]
    fn test_declined_consent_renders_no() {
        let user = UserData::new(4);
        let fields = user.flatten();
        assert_eq!(fields.len(), PARTICIPANT_FIELDS);
        assert_eq!(fields[0].1.render(), "No");
    }
}

//! Simulated participant scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimScenario {
    /// SIM-001: one clean pass with the default copy-paste exercise
    Baseline,

    /// SIM-002: the participant rewrites the synthesized final prompt
    EditedFinalPrompt,

    /// SIM-003: requirements added, removed and blank entries retried
    RequirementChurn,

    /// SIM-004: the export sink refuses every record
    ExportFailure,

    /// SIM-005: every scenario runs the multi-shot exercise
    MultiShot,

    /// SIM-006: classification exercise, first labels wrong every time
    DragDrop,
}

impl SimScenario {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<SimScenario> {
        vec![
            SimScenario::Baseline,
            SimScenario::EditedFinalPrompt,
            SimScenario::RequirementChurn,
            SimScenario::ExportFailure,
            SimScenario::MultiShot,
            SimScenario::DragDrop,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            SimScenario::Baseline => "baseline",
            SimScenario::EditedFinalPrompt => "edited_final_prompt",
            SimScenario::RequirementChurn => "requirement_churn",
            SimScenario::ExportFailure => "export_failure",
            SimScenario::MultiShot => "multi_shot",
            SimScenario::DragDrop => "drag_drop",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            SimScenario::Baseline => "Consent, demographics and four copy-paste scenarios",
            SimScenario::EditedFinalPrompt => "Final prompt replaced with CUSTOM TEXT in every scenario",
            SimScenario::RequirementChurn => "Add/remove requirements, blank retries, last-entry removal",
            SimScenario::ExportFailure => "Sink fails; session must still complete",
            SimScenario::MultiShot => "Multi-shot exercise in all four scenarios",
            SimScenario::DragDrop => "Classification exercise with a wrong first attempt",
        }
    }
}

impl std::fmt::Display for SimScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SimScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "sim-001" => Ok(SimScenario::Baseline),
            "edited_final_prompt" | "edited" | "sim-002" => Ok(SimScenario::EditedFinalPrompt),
            "requirement_churn" | "churn" | "sim-003" => Ok(SimScenario::RequirementChurn),
            "export_failure" | "exportfailure" | "sim-004" => Ok(SimScenario::ExportFailure),
            "multi_shot" | "multishot" | "sim-005" => Ok(SimScenario::MultiShot),
            "drag_drop" | "dragdrop" | "sim-006" => Ok(SimScenario::DragDrop),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

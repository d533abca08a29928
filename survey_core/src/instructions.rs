//! Scenario identifiers for the four prompt-writing tasks.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioId {
    /// Online police report for a non-emergency incident
    PoliceReport,

    /// Recipe submission for a cooking blog
    RecipeBlog,

    /// Job application for a graphic designer role
    JobExperience,

    /// Property loss insurance claim
    InsuranceClaim,
}

impl ScenarioId {
    /// Returns every scenario in canonical order.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::PoliceReport,
            ScenarioId::RecipeBlog,
            ScenarioId::JobExperience,
            ScenarioId::InsuranceClaim,
        ]
    }

    /// Returns the scenario name, as written to `SCENARIO_i_INSTRUCTION`.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::PoliceReport => "police-report",
            ScenarioId::RecipeBlog => "recipe-blog",
            ScenarioId::JobExperience => "job-experience",
            ScenarioId::InsuranceClaim => "insurance-claim",
        }
    }

    /// Heading shown above the scenario's guidance.
    pub fn title(&self) -> &'static str {
        match self {
            ScenarioId::PoliceReport => "Filing a Police Report Online",
            ScenarioId::RecipeBlog => "Recipe Submission Guidelines",
            ScenarioId::JobExperience => {
                "Job Application Validation for 'Graphic Designer' at BrightWave"
            }
            ScenarioId::InsuranceClaim => "Guidance for Standard Property Loss Insurance Claims",
        }
    }

    /// The form field whose requirements the participant extracts.
    pub fn requirement_field(&self) -> &'static str {
        match self {
            ScenarioId::PoliceReport => "Short Incident Summary Report",
            ScenarioId::RecipeBlog => "Ingredients List/Amount",
            ScenarioId::JobExperience => "Relevant Experience",
            ScenarioId::InsuranceClaim => "Inventory of Damaged/Lost Property",
        }
    }

    /// One-paragraph brief of the scenario.
    pub fn summary(&self) -> &'static str {
        match self {
            ScenarioId::PoliceReport => {
                "A resident files a non-emergency report online. The summary must give the \
                 date (YYYY-MM-DD), the time (24-hour HH:MM), a specific location and one \
                 incident type: Injury, Property Damage, Near Miss, Security Breach or Other."
            }
            ScenarioId::RecipeBlog => {
                "A home cook submits a recipe for publication. Ingredients must be listed in \
                 the order used, with metric quantities, no cups or ounces and no brand names."
            }
            ScenarioId::JobExperience => {
                "An applicant writes the experience section for a Graphic Designer role at \
                 BrightWave Creative. It must state a relevant bachelor's degree and at least \
                 two years of professional design experience."
            }
            ScenarioId::InsuranceClaim => {
                "A homeowner claims for water, theft, fire or storm loss. Every damaged item \
                 needs make, model, brand, approximate purchase date, prior condition and an \
                 estimated replacement or repair cost."
            }
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "police-report" | "police_report" | "police" => Ok(ScenarioId::PoliceReport),
            "recipe-blog" | "recipe_blog" | "recipe" => Ok(ScenarioId::RecipeBlog),
            "job-experience" | "job_experience" | "job" => Ok(ScenarioId::JobExperience),
            "insurance-claim" | "insurance_claim" | "insurance" => Ok(ScenarioId::InsuranceClaim),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

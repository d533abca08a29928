//! Per-session configuration.

use crate::error::CoreError;
use crate::guided::GuidedKind;
use crate::instructions::ScenarioId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Which guided exercise each scenario runs.
///
/// ```json
/// { "default_guided": "copy-paste", "guided_overrides": { "recipe-blog": "multi-shot" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_guided: GuidedKind,
    pub guided_overrides: BTreeMap<ScenarioId, GuidedKind>,
}

impl SessionConfig {
    /// Every scenario runs `kind`.
    pub fn uniform(kind: GuidedKind) -> Self {
        Self {
            default_guided: kind,
            guided_overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, scenario: ScenarioId, kind: GuidedKind) -> Self {
        self.guided_overrides.insert(scenario, kind);
        self
    }

    pub fn guided_kind_for(&self, scenario: ScenarioId) -> GuidedKind {
        self.guided_overrides
            .get(&scenario)
            .copied()
            .unwrap_or(self.default_guided)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

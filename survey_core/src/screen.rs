//! Scenario Screen Sequencer.
//!
//! A single linear counter drives the whole session:
//!
//! ```text
//! 0            consent
//! 1            demographics
//! 2 ..= 13     4 scenarios x (intro, unguided, guided)
//! 14           complete
//! ```
//!
//! `Screen::resolve` turns the counter into a tagged variant so callers
//! never index into the instruction order themselves.

use crate::instructions::ScenarioId;
use crate::randomizer::InstructionOrder;
use serde::{Deserialize, Serialize};

/// Index of the first scenario screen.
pub const FIRST_SCENARIO_SCREEN: usize = 2;

/// Phases in each scenario.
pub const SCREENS_PER_SCENARIO: usize = 3;

/// Scenarios in a session.
pub const SCENARIO_COUNT: usize = 4;

/// Terminal screen index.
pub const COMPLETE_SCREEN: usize = FIRST_SCENARIO_SCREEN + SCREENS_PER_SCENARIO * SCENARIO_COUNT;

/// Phase within a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Intro,
    Unguided,
    Guided,
}

impl Phase {
    fn from_offset(offset: usize) -> Option<Self> {
        match offset {
            0 => Some(Phase::Intro),
            1 => Some(Phase::Unguided),
            2 => Some(Phase::Guided),
            _ => None,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            Phase::Intro => 0,
            Phase::Unguided => 1,
            Phase::Guided => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Intro => "intro",
            Phase::Unguided => "unguided",
            Phase::Guided => "guided",
        }
    }
}

/// (scenario index, phase) derived from a screen index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScenarioPosition {
    pub scenario_index: usize,
    pub phase: Phase,
}

impl ScenarioPosition {
    /// Inverse of `scenario_position`.
    pub fn screen(&self) -> usize {
        FIRST_SCENARIO_SCREEN + self.scenario_index * SCREENS_PER_SCENARIO + self.phase.offset()
    }
}

/// Maps a screen index to its scenario position.
///
/// Returns `None` for the fixed screens and for anything at or past the
/// completion screen.
pub fn scenario_position(screen: usize) -> Option<ScenarioPosition> {
    if !(FIRST_SCENARIO_SCREEN..COMPLETE_SCREEN).contains(&screen) {
        return None;
    }
    let offset = screen - FIRST_SCENARIO_SCREEN;
    Some(ScenarioPosition {
        scenario_index: offset / SCREENS_PER_SCENARIO,
        phase: Phase::from_offset(offset % SCREENS_PER_SCENARIO)?,
    })
}

/// What the front end should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Consent,
    Demographics,
    Scenario {
        scenario_index: usize,
        phase: Phase,
        scenario: ScenarioId,
    },
    Complete,
    /// Neutral fallback while the order is missing or the index is invalid
    Loading,
}

impl Screen {
    /// Resolves a screen index against the instruction order.
    pub fn resolve(screen: usize, order: Option<&InstructionOrder>) -> Screen {
        match screen {
            0 => Screen::Consent,
            1 => Screen::Demographics,
            COMPLETE_SCREEN => Screen::Complete,
            _ => {
                let resolved = order.zip(scenario_position(screen)).and_then(|(order, pos)| {
                    order.get(pos.scenario_index).map(|scenario| Screen::Scenario {
                        scenario_index: pos.scenario_index,
                        phase: pos.phase,
                        scenario,
                    })
                });
                resolved.unwrap_or(Screen::Loading)
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Screen::Complete)
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Screen::Consent => write!(f, "consent"),
            Screen::Demographics => write!(f, "demographics"),
            Screen::Scenario {
                scenario_index,
                phase,
                scenario,
            } => write!(f, "scenario {} ({}) {}", scenario_index + 1, scenario, phase.name()),
            Screen::Complete => write!(f, "complete"),
            Screen::Loading => write!(f, "loading"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn order() -> InstructionOrder {
        InstructionOrder::from_ids(ScenarioId::all()).unwrap()
    }

    #[test]
    fn test_complete_screen_is_fourteen() {
        assert_eq!(COMPLETE_SCREEN, 14);
    }

    #[test]
    fn test_fixed_screens() {
        assert_eq!(Screen::resolve(0, None), Screen::Consent);
        assert_eq!(Screen::resolve(1, None), Screen::Demographics);
        assert_eq!(Screen::resolve(14, None), Screen::Complete);
    }

    #[test]
    fn test_scenario_screens_dispatch_by_phase() {
        let order = order();
        assert_eq!(
            Screen::resolve(2, Some(&order)),
            Screen::Scenario { scenario_index: 0, phase: Phase::Intro, scenario: ScenarioId::PoliceReport }
        );
        assert_eq!(
            Screen::resolve(9, Some(&order)),
            Screen::Scenario { scenario_index: 2, phase: Phase::Unguided, scenario: ScenarioId::JobExperience }
        );
        assert_eq!(
            Screen::resolve(13, Some(&order)),
            Screen::Scenario { scenario_index: 3, phase: Phase::Guided, scenario: ScenarioId::InsuranceClaim }
        );
    }

    #[test]
    fn test_missing_order_falls_back_to_loading() {
        assert_eq!(Screen::resolve(5, None), Screen::Loading);
    }

    #[test]
    fn test_short_order_falls_back_to_loading() {
        let short = InstructionOrder::from_ids(vec![ScenarioId::RecipeBlog]).unwrap();
        assert!(matches!(Screen::resolve(4, Some(&short)), Screen::Scenario { .. }));
        assert_eq!(Screen::resolve(5, Some(&short)), Screen::Loading);
    }

    #[test]
    fn test_past_terminal_is_loading() {
        assert_eq!(Screen::resolve(15, Some(&order())), Screen::Loading);
    }

    #[test]
    fn test_mapping_is_bijection() {
        let positions: HashSet<_> = (FIRST_SCENARIO_SCREEN..COMPLETE_SCREEN)
            .map(|screen| {
                let pos = scenario_position(screen).unwrap();
                assert!(pos.scenario_index < SCENARIO_COUNT);
                assert_eq!(pos.screen(), screen);
                (pos.scenario_index, pos.phase)
            })
            .collect();
        assert_eq!(positions.len(), SCENARIO_COUNT * SCREENS_PER_SCENARIO);
    }

    proptest! {
        #[test]
        fn prop_position_is_pure(screen in 0usize..64) {
            prop_assert_eq!(scenario_position(screen), scenario_position(screen));
            match scenario_position(screen) {
                Some(pos) => {
                    prop_assert!((FIRST_SCENARIO_SCREEN..COMPLETE_SCREEN).contains(&screen));
                    prop_assert!(pos.scenario_index < SCENARIO_COUNT);
                }
                None => prop_assert!(!(FIRST_SCENARIO_SCREEN..COMPLETE_SCREEN).contains(&screen)),
            }
        }
    }
}

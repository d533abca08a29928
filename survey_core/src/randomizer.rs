//! Instruction Randomizer - one shuffle per session.
//!
//! The order is fixed the first time the randomizer runs. Every time log and
//! scenario result is keyed by position in this order, so re-shuffling
//! mid-session would silently relabel data already collected.

use crate::error::CoreError;
use crate::instructions::ScenarioId;
use survey_env::SurveyContext;
use tracing::{info, warn};

/// A permutation of the scenario set, fixed for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionOrder(Vec<ScenarioId>);

impl InstructionOrder {
    /// Shuffles `ids` with the context's RNG.
    pub fn shuffled<C: SurveyContext>(ctx: &C, ids: &[ScenarioId]) -> Result<Self, CoreError> {
        let mut order = Self::from_ids(ids.to_vec())?;
        ctx.shuffle(&mut order.0);
        Ok(order)
    }

    /// Builds an order from an explicit sequence (replays, tests).
    pub fn from_ids(ids: Vec<ScenarioId>) -> Result<Self, CoreError> {
        if ids.is_empty() {
            return Err(CoreError::EmptyScenarioSet);
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(CoreError::DuplicateScenario(*id));
            }
        }
        Ok(Self(ids))
    }

    /// Scenario at `index`, if within the order.
    pub fn get(&self, index: usize) -> Option<ScenarioId> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ScenarioId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = ScenarioId> + '_ {
        self.0.iter().copied()
    }
}

/// Gate that produces the order exactly once.
#[derive(Debug, Default)]
pub struct InstructionRandomizer {
    order: Option<InstructionOrder>,
}

impl InstructionRandomizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shuffles `ids` on the first call; later calls return the existing order.
    pub fn initialize<C: SurveyContext>(
        &mut self,
        ctx: &C,
        ids: &[ScenarioId],
    ) -> Result<&InstructionOrder, CoreError> {
        if self.order.is_some() {
            warn!("Instruction order already initialized; keeping existing order");
        } else {
            let order = InstructionOrder::shuffled(ctx, ids)?;
            info!(
                "Instruction order: {}",
                order.iter().map(|id| id.name()).collect::<Vec<_>>().join(", ")
            );
            self.order = Some(order);
        }
        self.order.as_ref().ok_or(CoreError::EmptyScenarioSet)
    }

    /// The order, once initialized.
    pub fn order(&self) -> Option<&InstructionOrder> {
        self.order.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.order.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use proptest::prelude::*;

    #[test]
    fn test_empty_set_rejected() {
        let ctx = TestContext::new(1);
        assert_eq!(
            InstructionOrder::shuffled(&ctx, &[]),
            Err(CoreError::EmptyScenarioSet)
        );
    }

    #[test]
    fn test_duplicates_rejected() {
        let ids = vec![ScenarioId::RecipeBlog, ScenarioId::RecipeBlog];
        assert_eq!(
            InstructionOrder::from_ids(ids),
            Err(CoreError::DuplicateScenario(ScenarioId::RecipeBlog))
        );
    }

    #[test]
    fn test_initialize_runs_once() {
        let ctx = TestContext::new(9);
        let mut randomizer = InstructionRandomizer::new();

        let first = randomizer.initialize(&ctx, &ScenarioId::all()).unwrap().clone();
        for _ in 0..5 {
            let again = randomizer.initialize(&ctx, &ScenarioId::all()).unwrap();
            assert_eq!(again, &first);
        }
    }

    #[test]
    fn test_all_orders_reachable() {
        // 4! = 24 permutations; 2000 seeds cover them all with overwhelming probability
        let mut seen = std::collections::HashSet::new();
        for seed in 0..2000 {
            let ctx = TestContext::new(seed);
            let order = InstructionOrder::shuffled(&ctx, &ScenarioId::all()).unwrap();
            seen.insert(order.as_slice().to_vec());
        }
        assert_eq!(seen.len(), 24);
    }

    proptest! {
        #[test]
        fn prop_shuffle_is_permutation(seed in any::<u64>()) {
            let ctx = TestContext::new(seed);
            let order = InstructionOrder::shuffled(&ctx, &ScenarioId::all()).unwrap();

            prop_assert_eq!(order.len(), 4);
            let mut sorted = order.as_slice().to_vec();
            sorted.sort();
            prop_assert_eq!(sorted, ScenarioId::all());
        }
    }
}

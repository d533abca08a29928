//! Timing Recorder - whole-second dwell times per screen and step.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Elapsed whole seconds between two monotonic readings, rounded half up.
///
/// A reading earlier than `entered` yields 0.
pub fn elapsed_seconds(entered: Duration, now: Duration) -> u64 {
    let millis = now.saturating_sub(entered).as_millis();
    ((millis + 500) / 1000) as u64
}

/// Remembers when the active screen or step was entered.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingRecorder {
    entered_at: Duration,
}

impl TimingRecorder {
    pub fn new(now: Duration) -> Self {
        Self { entered_at: now }
    }

    /// Stamps a new entry time.
    pub fn enter(&mut self, now: Duration) {
        self.entered_at = now;
    }

    pub fn entered_at(&self) -> Duration {
        self.entered_at
    }

    /// Seconds since the last `enter`.
    pub fn elapsed_secs(&self, now: Duration) -> u64 {
        let secs = elapsed_seconds(self.entered_at, now);
        debug!("Elapsed {}s since {:?}", secs, self.entered_at);
        secs
    }
}

/// Dwell times for one scenario's three phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLog {
    instruction: Option<u64>,
    unguided: Option<u64>,
    guided: Option<u64>,
}

impl TimeLog {
    pub fn instruction(&self) -> Option<u64> {
        self.instruction
    }

    pub fn unguided(&self) -> Option<u64> {
        self.unguided
    }

    pub fn guided(&self) -> Option<u64> {
        self.guided
    }

    pub fn set_instruction(&mut self, secs: u64) {
        self.instruction = Some(secs);
    }

    pub fn set_unguided(&mut self, secs: u64) {
        self.unguided = Some(secs);
    }

    pub fn set_guided(&mut self, secs: u64) {
        self.guided = Some(secs);
    }
}

/// One `TimeLog` per scenario, created unset and kept until export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLogs(Vec<TimeLog>);

impl TimeLogs {
    pub fn new(scenario_count: usize) -> Self {
        Self(vec![TimeLog::default(); scenario_count])
    }

    pub fn get(&self, scenario_index: usize) -> Option<&TimeLog> {
        self.0.get(scenario_index)
    }

    pub fn get_mut(&mut self, scenario_index: usize) -> Option<&mut TimeLog> {
        self.0.get_mut(scenario_index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_second_rounds_up() {
        let t0 = Duration::from_secs(100);
        assert_eq!(elapsed_seconds(t0, t0 + Duration::from_millis(7500)), 8);
    }

    #[test]
    fn test_rounding_boundaries() {
        let t0 = Duration::ZERO;
        assert_eq!(elapsed_seconds(t0, Duration::from_millis(499)), 0);
        assert_eq!(elapsed_seconds(t0, Duration::from_millis(500)), 1);
        assert_eq!(elapsed_seconds(t0, Duration::from_millis(7499)), 7);
    }

    #[test]
    fn test_clock_going_backwards_is_zero() {
        assert_eq!(elapsed_seconds(Duration::from_secs(5), Duration::from_secs(3)), 0);
    }

    #[test]
    fn test_recorder_measures_from_last_enter() {
        let mut recorder = TimingRecorder::new(Duration::ZERO);
        recorder.enter(Duration::from_secs(10));
        assert_eq!(recorder.elapsed_secs(Duration::from_millis(12_400)), 2);
    }

    #[test]
    fn test_time_logs_start_unset() {
        let logs = TimeLogs::new(4);
        assert_eq!(logs.len(), 4);
        assert!(logs.get(3).is_some_and(|log| *log == TimeLog::default()));
        assert!(logs.get(4).is_none());
    }

    #[test]
    fn test_named_setters_touch_one_field() {
        let mut log = TimeLog::default();
        log.set_unguided(42);
        assert_eq!(log.instruction(), None);
        assert_eq!(log.unguided(), Some(42));
        assert_eq!(log.guided(), None);
    }
}

//! In-memory export sinks for the harness.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use survey_env::{EnvError, ExportRecord, ExportSink};

/// Keeps every submitted record.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ExportRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ExportRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<ExportRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl ExportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn submit(&self, record: &ExportRecord) -> Result<(), EnvError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// Refuses every record, counting attempts.
#[derive(Debug, Default)]
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ExportSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn submit(&self, _record: &ExportRecord) -> Result<(), EnvError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EnvError::http("503 Service Unavailable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use survey_env::SessionId;

    fn record() -> ExportRecord {
        ExportRecord::new(
            SessionId::from_seed(1),
            SystemTime::UNIX_EPOCH,
            vec![("agreed".into(), "Yes".into())],
        )
    }

    #[test]
    fn test_memory_sink_keeps_records() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.submit(&record()).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.last(), Some(record()));
    }

    #[test]
    fn test_failing_sink_counts_attempts() {
        let sink = FailingSink::new();
        assert!(sink.submit(&record()).is_err());
        assert!(sink.submit(&record()).is_err());
        assert_eq!(sink.attempts(), 2);
    }
}

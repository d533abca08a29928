//! Export transport abstraction.

use crate::error::EnvError;
use crate::record::ExportRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Destination for a completed session's flattened record.
///
/// # Implementations
///
/// - **Production**: `CsvFileSink` (local download), `HttpSink` (remote submission)
/// - **Simulation**: in-memory capture and always-failing sinks
///
/// # Contract
///
/// Export is a one-way boundary: callers log a returned error and carry on.
/// A sink must never be able to corrupt the in-memory session.
pub trait ExportSink: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Persists or transmits one record.
    fn submit(&self, record: &ExportRecord) -> Result<(), EnvError>;
}

/// Writes each record as its own two-line CSV file.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    dir: PathBuf,
}

impl CsvFileSink {
    /// Creates a sink that writes into `dir` (created on first submit).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the given record would be written to.
    pub fn path_for(&self, record: &ExportRecord) -> PathBuf {
        self.dir
            .join(format!("study_{}.csv", record.session_id.as_uuid()))
    }
}

impl ExportSink for CsvFileSink {
    fn name(&self) -> &str {
        "csv-file"
    }

    fn submit(&self, record: &ExportRecord) -> Result<(), EnvError> {
        fs::create_dir_all(&self.dir).map_err(|e| EnvError::io(&self.dir, e))?;
        let path = self.path_for(record);
        fs::write(&path, record.to_csv()).map_err(|e| EnvError::io(&path, e))?;
        debug!("Wrote {} columns to {}", record.len() + 2, path.display());
        Ok(())
    }
}

/// POSTs each record as a JSON object.
pub struct HttpSink {
    url: String,
    agent: ureq::Agent,
}

impl HttpSink {
    /// Creates a sink posting to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ExportSink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    fn submit(&self, record: &ExportRecord) -> Result<(), EnvError> {
        self.agent
            .post(&self.url)
            .header("content-type", "application/json")
            .send_json(record.to_json())
            .map_err(|e| EnvError::http(format!("POST {} failed: {}", self.url, e)))?;
        debug!("Submitted session {} to {}", record.session_id, self.url);
        Ok(())
    }
}

/// Submits to every inner sink.
///
/// All sinks are attempted even when an earlier one fails; the first error
/// is returned.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn ExportSink>>,
}

impl FanoutSink {
    /// Creates an empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    pub fn with(mut self, sink: impl ExportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Number of inner sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no inner sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ExportSink for FanoutSink {
    fn name(&self) -> &str {
        "fanout"
    }

    fn submit(&self, record: &ExportRecord) -> Result<(), EnvError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.submit(record) {
                warn!("Sink {} failed: {}", sink.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ExportValue;
    use crate::types::SessionId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::SystemTime;

    fn record() -> ExportRecord {
        ExportRecord::new(
            SessionId::from_seed(3),
            SystemTime::now(),
            vec![("agreed".to_string(), ExportValue::from("Yes"))],
        )
    }

    struct CountingSink {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ExportSink for CountingSink {
        fn name(&self) -> &str {
            "counting"
        }

        fn submit(&self, _record: &ExportRecord) -> Result<(), EnvError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(EnvError::http("refused"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_csv_sink_writes_header_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvFileSink::new(dir.path().join("responses"));
        let record = record();

        sink.submit(&record).unwrap();

        let written = fs::read_to_string(sink.path_for(&record)).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "agreed,User_ID,Timestamp_UTC");
        assert!(lines[1].starts_with("Yes,"));
    }

    #[test]
    fn test_csv_sink_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let sink = CsvFileSink::new(&blocker);
        let err = sink.submit(&record()).unwrap_err();
        assert!(matches!(err, EnvError::Io { .. }));
    }

    #[test]
    fn test_fanout_attempts_every_sink() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fanout = FanoutSink::new()
            .with(CountingSink { calls: calls.clone(), fail: true })
            .with(CountingSink { calls: calls.clone(), fail: false });

        let result = fanout.submit(&record());

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

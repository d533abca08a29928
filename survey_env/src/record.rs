//! The flat export record handed to every `ExportSink`.

use crate::types::SessionId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::SystemTime;

/// Column carrying the session identifier.
pub const SESSION_ID_COLUMN: &str = "User_ID";

/// Column carrying the UTC export timestamp.
pub const TIMESTAMP_COLUMN: &str = "Timestamp_UTC";

/// A scalar cell of the export record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportValue {
    /// Free text, written verbatim (quoted in CSV when needed)
    Text(String),
    /// Elapsed whole seconds; `None` when the phase was never timed
    Seconds(Option<u64>),
}

impl ExportValue {
    /// Renders the value as a CSV cell before quoting.
    pub fn render(&self) -> String {
        match self {
            ExportValue::Text(text) => text.clone(),
            ExportValue::Seconds(Some(secs)) => secs.to_string(),
            ExportValue::Seconds(None) => String::new(),
        }
    }

    /// Returns the text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExportValue::Text(text) => Some(text),
            ExportValue::Seconds(_) => None,
        }
    }

    /// Returns the seconds if this is a timed `Seconds` value.
    pub fn as_seconds(&self) -> Option<u64> {
        match self {
            ExportValue::Seconds(secs) => *secs,
            ExportValue::Text(_) => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ExportValue::Text(text) => Value::String(text.clone()),
            ExportValue::Seconds(Some(secs)) => Value::from(*secs),
            ExportValue::Seconds(None) => Value::Null,
        }
    }
}

impl From<&str> for ExportValue {
    fn from(text: &str) -> Self {
        ExportValue::Text(text.to_string())
    }
}

impl From<String> for ExportValue {
    fn from(text: String) -> Self {
        ExportValue::Text(text)
    }
}

impl From<Option<u64>> for ExportValue {
    fn from(secs: Option<u64>) -> Self {
        ExportValue::Seconds(secs)
    }
}

/// One completed session, flattened for export.
///
/// Field order is preserved; it becomes the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Session identifier attached at export time
    pub session_id: SessionId,

    /// UTC wall-clock time at export
    pub timestamp: DateTime<Utc>,

    fields: Vec<(String, ExportValue)>,
}

impl ExportRecord {
    /// Creates a record from already-flattened fields.
    pub fn new(
        session_id: SessionId,
        exported_at: SystemTime,
        fields: Vec<(String, ExportValue)>,
    ) -> Self {
        Self {
            session_id,
            timestamp: DateTime::<Utc>::from(exported_at),
            fields,
        }
    }

    /// Looks up a field by key.
    pub fn get(&self, key: &str) -> Option<&ExportValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of flattened fields, excluding the session id and timestamp.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no flattened fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates the flattened fields in export order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ExportValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Timestamp in ISO-8601 form with millisecond precision and a `Z` suffix.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// All column names: the fields followed by the envelope columns.
    pub fn columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|(k, _)| k.as_str())
            .chain([SESSION_ID_COLUMN, TIMESTAMP_COLUMN])
            .collect()
    }

    /// Renders the header row (no trailing newline).
    pub fn csv_header(&self) -> String {
        self.columns()
            .into_iter()
            .map(escape_csv)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Renders the value row (no trailing newline).
    pub fn csv_row(&self) -> String {
        self.fields
            .iter()
            .map(|(_, v)| escape_csv(&v.render()))
            .chain([
                escape_csv(&self.session_id.as_uuid().to_string()),
                escape_csv(&self.timestamp_iso()),
            ])
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Renders a two-line CSV document: header then values.
    pub fn to_csv(&self) -> String {
        format!("{}\n{}\n", self.csv_header(), self.csv_row())
    }

    /// Renders the record as a JSON object for remote submission.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.to_json());
        }
        map.insert(
            SESSION_ID_COLUMN.to_string(),
            Value::String(self.session_id.as_uuid().to_string()),
        );
        map.insert(
            TIMESTAMP_COLUMN.to_string(),
            Value::String(self.timestamp_iso()),
        );
        Value::Object(map)
    }
}

/// Quotes a CSV cell when it contains a delimiter, quote or line break.
///
/// Embedded quotes are doubled.
pub fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

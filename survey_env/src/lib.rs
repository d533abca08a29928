//! Prompt Study Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" seam that lets the study core run
//! unchanged against the **real world** (system clock, OS entropy, files and
//! HTTP) and against the **simulation harness** (virtual clock, seeded RNG,
//! in-memory sinks).
//!
//! # What is intercepted
//!
//! - Time (`now()`, `system_time()`)
//! - Randomness (`shuffle()`, `new_session_id()`)
//! - Background work (`spawn()`)
//! - Export transport (`ExportSink`)
//!
//! # Example
//!
//! ```ignore
//! use survey_env::{SurveyContext, SystemContext, CsvFileSink, ExportSink};
//!
//! let ctx = SystemContext::new();
//! let started = ctx.now();
//! // ... participant reads the intro ...
//! let secs = (ctx.now() - started).as_secs();
//! ```

mod context;
mod error;
mod record;
mod sink;
mod system_impl;
mod types;

pub use context::SurveyContext;
pub use error::EnvError;
pub use record::{escape_csv, ExportRecord, ExportValue, SESSION_ID_COLUMN, TIMESTAMP_COLUMN};
pub use sink::{CsvFileSink, ExportSink, FanoutSink, HttpSink};
pub use system_impl::SystemContext;
pub use types::SessionId;

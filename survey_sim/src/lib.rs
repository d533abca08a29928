//! Survey Deterministic Simulation Harness
//!
//! This crate runs complete study sessions without a human at the keyboard.
//! Every source of non-determinism is controlled:
//! - **Time**: a virtual clock advanced by simulated dwell times
//! - **Randomness**: instruction order, session ids and participant answers
//!   all derive from a single 64-bit seed
//! - **Export**: in-memory or deliberately failing sinks
//!
//! # Usage
//!
//! ```ignore
//! use survey_sim::{SessionRunner, SimScenario};
//!
//! let result = SessionRunner::new(42).run(SimScenario::EditedFinalPrompt);
//! assert!(result.passed);
//! ```

mod context;
mod participant;
pub mod runner;
pub mod scenarios;
mod sink;

pub use context::SimContext;
pub use participant::SimulatedParticipant;
pub use runner::{RunMetrics, RunResult, SessionRunner, CUSTOM_FINAL_PROMPT, EXPECTED_FIELDS};
pub use scenarios::SimScenario;
pub use sink::{FailingSink, MemorySink};

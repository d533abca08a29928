//! Core environment context trait for study sessions.

use crate::types::SessionId;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so that the study core can run
/// both interactively and inside the deterministic simulation harness.
///
/// # Implementations
///
/// - **Production**: `SystemContext` - wraps `Instant`, `thread_rng`, OS threads
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`, inline jobs
///
/// # Determinism
///
/// Every method that would otherwise introduce non-determinism (time,
/// randomness, thread scheduling) is controlled by the implementation.
pub trait SurveyContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for per-screen and per-step elapsed time measurement.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used for the export timestamp.
    fn system_time(&self) -> SystemTime;

    /// Shuffles `items` in place with a uniform permutation.
    fn shuffle<T>(&self, items: &mut [T]);

    /// Generates a fresh session identifier.
    ///
    /// In simulation the identifier is derived from the seed so that
    /// exported records are reproducible.
    fn new_session_id(&self) -> SessionId;

    /// Runs a fire-and-forget job.
    ///
    /// In production: a named OS thread
    /// In simulation: runs inline before returning
    fn spawn<F>(&self, name: &str, job: F)
    where
        F: FnOnce() + Send + 'static;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}

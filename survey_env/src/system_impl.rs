//! Production implementation of SurveyContext using the system clock.

use crate::types::SessionId;
use crate::SurveyContext;
use rand::seq::SliceRandom;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};
use tracing::warn;

/// Production context backed by the system clock and OS entropy.
///
/// This is the "real" implementation used by the interactive front end.
/// Background jobs run on named threads; call `join_background` before the
/// process exits so a pending export is not cut off.
pub struct SystemContext {
    /// Start time for monotonic duration calculations
    start: Instant,

    /// Handles of jobs started with `spawn`
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl SystemContext {
    /// Creates a new SystemContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            background: Mutex::new(Vec::new()),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Waits for every spawned job to finish. Returns how many were joined.
    pub fn join_background(&self) -> usize {
        let handles: Vec<_> = match self.background.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        let count = handles.len();
        for handle in handles {
            if handle.join().is_err() {
                warn!("Background job panicked");
            }
        }
        count
    }
}

impl Default for SystemContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyContext for SystemContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    fn shuffle<T>(&self, items: &mut [T]) {
        items.shuffle(&mut rand::thread_rng());
    }

    fn new_session_id(&self) -> SessionId {
        SessionId::new()
    }

    fn spawn<F>(&self, name: &str, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // A job that cannot get a thread is handed back and run inline
        let job = Arc::new(Mutex::new(Some(job)));
        let threaded = Arc::clone(&job);
        let spawned = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if let Some(job) = threaded.lock().ok().and_then(|mut slot| slot.take()) {
                    job();
                }
            });

        match spawned {
            Ok(handle) => match self.background.lock() {
                Ok(mut guard) => guard.push(handle),
                Err(poisoned) => poisoned.into_inner().push(handle),
            },
            Err(e) => {
                warn!("Could not spawn {}: {}; running inline", name, e);
                if let Some(job) = job.lock().ok().and_then(|mut slot| slot.take()) {
                    job();
                }
            }
        }
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}

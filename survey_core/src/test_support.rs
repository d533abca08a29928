//! Deterministic context for unit tests in this crate.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use survey_env::{SessionId, SurveyContext};

pub struct TestContext {
    seed: u64,
    clock: Mutex<Duration>,
    rng: Mutex<ChaCha8Rng>,
    sessions: Mutex<u64>,
}

impl TestContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            clock: Mutex::new(Duration::ZERO),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            sessions: Mutex::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.clock.lock().unwrap() += by;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl SurveyContext for TestContext {
    fn now(&self) -> Duration {
        *self.clock.lock().unwrap()
    }

    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_704_067_200) + self.now()
    }

    fn shuffle<T>(&self, items: &mut [T]) {
        items.shuffle(&mut *self.rng.lock().unwrap());
    }

    fn new_session_id(&self) -> SessionId {
        let mut n = self.sessions.lock().unwrap();
        *n += 1;
        SessionId::from_seed(self.seed.wrapping_add(*n))
    }

    fn spawn<F>(&self, _name: &str, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        job();
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

//! Shared fixtures and collaborator doubles for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use trail_verify::models::{MotionSample, Position, UserId};
use trail_verify::verification::{
    ActivityStore, Clock, InMemoryHistoryStore, MotionSource, VerificationPolicy, Verifier,
};
use trail_verify::{Result, VerifyError};

/// Start of every test timeline
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 29, 6, 0, 0).unwrap()
}

pub fn pos(lat: f64, lng: f64) -> Position {
    Position::new(lat, lng).unwrap()
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Activity store with fixed per-call behaviour.
pub enum FakeActivityStore {
    Known(Vec<Position>),
    Unavailable,
    /// Never answers; exercises the store timeout
    Hanging,
}

#[async_trait]
impl ActivityStore for FakeActivityStore {
    async fn recent_activity_locations(&self, _: UserId, _: u32) -> Result<Vec<Position>> {
        match self {
            FakeActivityStore::Known(known) => Ok(known.clone()),
            FakeActivityStore::Unavailable => {
                Err(VerifyError::Store("connection refused".to_string()))
            }
            FakeActivityStore::Hanging => {
                futures::future::pending::<()>().await;
                Ok(Vec::new())
            }
        }
    }
}

pub struct FakeMotionSource(pub Option<MotionSample>);

#[async_trait]
impl MotionSource for FakeMotionSource {
    async fn latest_motion_sample(&self, _: UserId) -> Result<Option<MotionSample>> {
        Ok(self.0)
    }
}

pub struct Harness {
    pub verifier: Verifier,
    pub clock: Arc<ManualClock>,
    pub history: Arc<InMemoryHistoryStore>,
}

pub fn harness(store: FakeActivityStore) -> Harness {
    harness_with(store, VerificationPolicy::default())
}

pub fn harness_with(store: FakeActivityStore, policy: VerificationPolicy) -> Harness {
    let clock = Arc::new(ManualClock::new(t0()));
    let history = Arc::new(InMemoryHistoryStore::new(policy.history_window));
    let verifier = Verifier::new(Arc::new(store), Arc::new(FakeMotionSource(None)), policy)
        .with_clock(clock.clone())
        .with_history(history.clone());
    Harness {
        verifier,
        clock,
        history,
    }
}

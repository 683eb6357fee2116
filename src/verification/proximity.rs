//! Trust from closeness to the user's recently known activity locations.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Position, TrustScore, UserId};

use super::geometry::distance_meters;
use super::policy::ScorePolicy;

/// Read-only view of the activity database.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Locations of the user's activities from the last `since_days` days
    /// that have a known location.
    async fn recent_activity_locations(&self, user: UserId, since_days: u32)
        -> Result<Vec<Position>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityPolicy {
    /// Average distance at which the score reaches zero
    pub decay_meters: f64,
    pub lookback_days: u32,
}

impl Default for ProximityPolicy {
    fn default() -> Self {
        Self {
            decay_meters: 10_000.0,
            lookback_days: 7,
        }
    }
}

/// Mean distance from `current` to each of `known`, or `None` when empty.
pub fn average_distance(current: &Position, known: &[Position]) -> Option<f64> {
    if known.is_empty() {
        return None;
    }
    let total: f64 = known.iter().map(|k| distance_meters(current, k)).sum();
    Some(total / known.len() as f64)
}

/// Linear decay from 1.0 at zero distance to 0.0 at `decay_meters`.
pub fn decay_score(avg_distance: f64, policy: &ProximityPolicy, scores: &ScorePolicy) -> TrustScore {
    TrustScore::clamped(1.0 - avg_distance / policy.decay_meters, scores.fallback())
}

#[derive(Clone)]
pub struct ProximityScorer {
    store: Arc<dyn ActivityStore>,
    policy: ProximityPolicy,
}

impl ProximityScorer {
    pub fn new(store: Arc<dyn ActivityStore>, policy: ProximityPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &ProximityPolicy {
        &self.policy
    }

    pub async fn known_locations(&self, user: UserId) -> Result<Vec<Position>> {
        self.store
            .recent_activity_locations(user, self.policy.lookback_days)
            .await
    }

    /// Score `current` against already fetched known locations.
    pub fn score(&self, current: &Position, known: &[Position], scores: &ScorePolicy) -> TrustScore {
        match average_distance(current, known) {
            None => scores.neutral(),
            Some(avg) => decay_score(avg, &self.policy, scores),
        }
    }
}

use std::time::Duration;

use crate::models::TrustScore;

use super::motion::MotionPolicy;
use super::proximity::ProximityPolicy;

/// Fixed scores returned for the non-graduated outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorePolicy {
    /// Submitted while offline, not cross-checked yet
    pub offline_provisional: f64,
    /// Speed or motion out of bounds
    pub anomaly: f64,
    /// No recent known locations to compare against
    pub neutral: f64,
    /// Any internal failure
    pub fallback: f64,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            offline_provisional: 0.7,
            anomaly: 0.2,
            neutral: 0.5,
            fallback: 0.3,
        }
    }
}

impl ScorePolicy {
    pub fn offline_provisional(&self) -> TrustScore {
        TrustScore::constant(self.offline_provisional)
    }

    pub fn anomaly(&self) -> TrustScore {
        TrustScore::constant(self.anomaly)
    }

    pub fn neutral(&self) -> TrustScore {
        TrustScore::constant(self.neutral)
    }

    pub fn fallback(&self) -> TrustScore {
        TrustScore::constant(self.fallback)
    }
}

/// Every tunable of the verification engine.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationPolicy {
    pub scores: ScorePolicy,
    pub motion: MotionPolicy,
    pub proximity: ProximityPolicy,
    /// Retention of per-user history
    pub history_window: chrono::Duration,
    /// Per-user cap on the offline backlog
    pub offline_queue_max: usize,
    /// Upper bound on any persistent-store or motion-source call
    pub store_timeout: Duration,
    /// Stored motion samples older than this count as absent
    pub motion_max_age: chrono::Duration,
    /// How long a user's serialization slot may sit unused before reaping
    pub user_idle: Duration,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            scores: ScorePolicy::default(),
            motion: MotionPolicy::default(),
            proximity: ProximityPolicy::default(),
            history_window: chrono::Duration::hours(24),
            offline_queue_max: 1000,
            store_timeout: Duration::from_millis(2000),
            motion_max_age: chrono::Duration::seconds(300),
            user_idle: Duration::from_secs(3600),
        }
    }
}

//! Entry point of the engine: routes a ping down the offline or online path,
//! replays any offline backlog first, and always produces a score.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{Result, VerifyError};
use crate::models::{
    LocationRecord, MotionEvidence, OfflineQueueEntry, Position, TrustScore, UserId,
    VerificationOptions,
};

use super::clock::{Clock, SystemClock};
use super::history::{HistoryStore, InMemoryHistoryStore};
use super::locks::UserLocks;
use super::motion::MotionSource;
use super::offline_queue::{InMemoryOfflineQueue, OfflineQueue};
use super::policy::{ScorePolicy, VerificationPolicy};
use super::proximity::{average_distance, decay_score, ActivityStore, ProximityScorer};
use super::speed::{check_movement, Anomaly, MovementCheck};

/// How a verification call ended.
#[derive(Debug)]
pub enum Outcome {
    /// Queued while offline; provisional trust.
    Provisional,
    Anomaly(Anomaly),
    /// No recent known locations to compare against.
    Neutral,
    Proximity { avg_distance_m: f64, score: TrustScore },
    Failed(VerifyError),
}

impl Outcome {
    pub fn score(&self, scores: &ScorePolicy) -> TrustScore {
        match self {
            Outcome::Provisional => scores.offline_provisional(),
            Outcome::Anomaly(_) => scores.anomaly(),
            Outcome::Neutral => scores.neutral(),
            Outcome::Proximity { score, .. } => *score,
            Outcome::Failed(_) => scores.fallback(),
        }
    }
}

#[derive(Debug)]
pub struct Verdict {
    pub score: TrustScore,
    pub outcome: Outcome,
}

pub struct Verifier {
    history: Arc<dyn HistoryStore>,
    queue: Arc<dyn OfflineQueue>,
    proximity: ProximityScorer,
    motion_source: Arc<dyn MotionSource>,
    clock: Arc<dyn Clock>,
    locks: UserLocks,
    policy: VerificationPolicy,
}

impl Verifier {
    /// Engine with in-process history and offline queue and the system clock.
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        motion_source: Arc<dyn MotionSource>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            history: Arc::new(InMemoryHistoryStore::new(policy.history_window)),
            queue: Arc::new(InMemoryOfflineQueue::new(policy.offline_queue_max)),
            proximity: ProximityScorer::new(activities, policy.proximity),
            motion_source,
            clock: Arc::new(SystemClock),
            locks: UserLocks::new(),
            policy,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = history;
        self
    }

    pub fn with_offline_queue(mut self, queue: Arc<dyn OfflineQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// Trust score in [0, 1] for `position` reported by `user`. Never fails.
    pub async fn verify(
        &self,
        user: UserId,
        position: Position,
        options: &VerificationOptions,
    ) -> TrustScore {
        self.verify_detailed(user, position, options).await.score
    }

    /// Like [`Verifier::verify`] but also reports which path produced the score.
    pub async fn verify_detailed(
        &self,
        user: UserId,
        position: Position,
        options: &VerificationOptions,
    ) -> Verdict {
        let run = AssertUnwindSafe(self.run(user, position, options))
            .catch_unwind()
            .await;

        let outcome = match run {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                warn!(user_id = %user, "Verification failed, returning fallback score: {}", err);
                Outcome::Failed(err)
            }
            Err(_) => {
                error!(user_id = %user, "Verification panicked, returning fallback score");
                Outcome::Failed(VerifyError::Internal("verification step panicked".to_string()))
            }
        };

        let score = outcome.score(&self.policy.scores);
        debug!(user_id = %user, score = %score, "Verification finished: {:?}", outcome);
        Verdict { score, outcome }
    }

    async fn run(
        &self,
        user: UserId,
        position: Position,
        options: &VerificationOptions,
    ) -> Result<Outcome> {
        if options.is_offline {
            self.enqueue_offline(user, position).await;
            return Ok(Outcome::Provisional);
        }

        // Collaborator I/O happens outside the user's lock
        let motion = if options.require_motion {
            self.with_timeout("motion source", self.motion_source.latest_motion_sample(user))
                .await
                .map(MotionEvidence::from)
        } else {
            Ok(MotionEvidence::NotRequested)
        };

        let check = {
            let _guard = self.locks.acquire(user).await;
            let now = self.clock.now();

            self.replay_backlog(user, options, now).await;

            let evidence = match &motion {
                Ok(evidence) => *evidence,
                Err(_) => MotionEvidence::Missing,
            };
            if evidence == MotionEvidence::Missing {
                debug!(user_id = %user, "Motion required but no fresh sample available");
            }
            let record = LocationRecord::live(position, now, evidence);
            self.process_record(user, record, options, now).await?
        };

        if let MovementCheck::Anomaly(anomaly) = check {
            info!(user_id = %user, "Movement anomaly detected: {:?}", anomaly);
            return Ok(Outcome::Anomaly(anomaly));
        }
        motion?;

        let known = self
            .with_timeout("activity store", self.proximity.known_locations(user))
            .await?;

        let outcome = match average_distance(&position, &known) {
            None => Outcome::Neutral,
            Some(avg_distance_m) if !avg_distance_m.is_finite() => {
                return Err(VerifyError::Store(format!(
                    "non-finite average distance over {} known locations",
                    known.len()
                )));
            }
            Some(avg_distance_m) => Outcome::Proximity {
                avg_distance_m,
                score: decay_score(avg_distance_m, self.proximity.policy(), &self.policy.scores),
            },
        };
        Ok(outcome)
    }

    async fn enqueue_offline(&self, user: UserId, position: Position) {
        let _guard = self.locks.acquire(user).await;
        let entry = OfflineQueueEntry::new(position, self.clock.now());
        if let Err(err) = self.queue.enqueue(user, entry).await {
            error!(user_id = %user, "Failed to queue offline ping: {}", err);
        }
    }

    /// Replay queued offline pings in submission order. Their scores are
    /// discarded; they only keep history complete. Failures are logged and
    /// the remaining entries still run.
    async fn replay_backlog(
        &self,
        user: UserId,
        options: &VerificationOptions,
        now: DateTime<Utc>,
    ) {
        let backlog = match self.queue.drain(user).await {
            Ok(backlog) => backlog,
            Err(err) => {
                warn!(user_id = %user, "Could not drain offline queue: {}", err);
                return;
            }
        };
        if backlog.is_empty() {
            return;
        }

        let cutoff = now - self.policy.history_window;
        debug!(user_id = %user, "Replaying {} offline pings", backlog.len());

        for entry in backlog {
            if entry.timestamp < cutoff {
                warn!(
                    user_id = %user,
                    queued_at = %entry.timestamp,
                    "Discarding offline ping older than the history window"
                );
                continue;
            }
            let record = LocationRecord::replayed(&entry);
            match self.process_record(user, record, options, now).await {
                Ok(MovementCheck::Anomaly(anomaly)) => {
                    info!(user_id = %user, queued_at = %entry.timestamp, "Anomaly in offline backlog: {:?}", anomaly);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(user_id = %user, queued_at = %entry.timestamp, "Offline ping replay failed: {}", err);
                }
            }
        }
    }

    /// Prune, append, then run the movement checks on the new tail.
    async fn process_record(
        &self,
        user: UserId,
        record: LocationRecord,
        options: &VerificationOptions,
        now: DateTime<Utc>,
    ) -> Result<MovementCheck> {
        self.history.prune(user, now).await?;
        self.history.append(user, record).await?;
        let recent = self.history.last(user, 2).await?;
        check_movement(&recent, options, &self.policy.motion)
    }

    async fn with_timeout<T>(
        &self,
        what: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.policy.store_timeout, fut)
            .await
            .map_err(|_| VerifyError::Timeout(what))?
    }

    /// Expire history and offline backlogs that fell out of the window,
    /// then release lock slots of idle users. Each user's stores are only
    /// touched while holding that user's lock.
    pub async fn reap_idle(&self) -> ReapStats {
        let now = self.clock.now();
        let cutoff = now - self.policy.history_window;
        let mut stats = ReapStats::default();

        let mut users = self.history.users().await.unwrap_or_else(|err| {
            warn!("Listing history users failed: {}", err);
            Vec::new()
        });
        match self.queue.users().await {
            Ok(queued) => users.extend(queued),
            Err(err) => warn!("Listing offline queue users failed: {}", err),
        }
        users.sort_unstable();
        users.dedup();

        for user in users {
            let _guard = self.locks.acquire_quiet(user).await;
            match self.history.evict_expired(user, now).await {
                Ok(true) => stats.histories += 1,
                Ok(false) => {}
                Err(err) => warn!(user_id = %user, "History eviction failed: {}", err),
            }
            match self.queue.evict_expired(user, cutoff).await {
                Ok(n) => stats.queued += n,
                Err(err) => warn!(user_id = %user, "Offline queue eviction failed: {}", err),
            }
        }

        stats.slots = self.locks.reap_idle(self.policy.user_idle);
        stats
    }
}

/// What one `Verifier::reap_idle` pass released.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReapStats {
    /// Lock slots dropped.
    pub slots: usize,
    /// Users whose history emptied and was forgotten.
    pub histories: usize,
    /// Offline entries discarded as too old to replay.
    pub queued: usize,
}

//! Per-user rolling window of accepted positions.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{LocationRecord, UserId};

/// Time-ordered history of recent positions, keyed by user.
///
/// Invariant: a user's records are non-decreasing in timestamp and are never
/// reordered or edited once appended.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a record at the tail. A record stamped earlier than the
    /// current tail is stored with the tail's timestamp.
    async fn append(&self, user: UserId, record: LocationRecord) -> Result<()>;

    /// Drop records older than `now - window`. Returns how many were removed.
    async fn prune(&self, user: UserId, now: DateTime<Utc>) -> Result<usize>;

    /// The newest `n` records, oldest first.
    async fn last(&self, user: UserId, n: usize) -> Result<Vec<LocationRecord>>;

    /// Users with any stored history.
    async fn users(&self) -> Result<Vec<UserId>>;

    /// Prune `user` at `now` and forget them if nothing is left. Returns
    /// true when the user was dropped.
    async fn evict_expired(&self, user: UserId, now: DateTime<Utc>) -> Result<bool>;
}

pub struct InMemoryHistoryStore {
    window: Duration,
    users: RwLock<HashMap<UserId, VecDeque<LocationRecord>>>,
}

impl InMemoryHistoryStore {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    fn prune_deque(records: &mut VecDeque<LocationRecord>, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        while records.front().is_some_and(|r| r.timestamp < cutoff) {
            records.pop_front();
            removed += 1;
        }
        removed
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, user: UserId, mut record: LocationRecord) -> Result<()> {
        let mut users = self.users.write().await;
        let records = users.entry(user).or_default();
        if let Some(tail) = records.back() {
            if record.timestamp < tail.timestamp {
                record.timestamp = tail.timestamp;
            }
        }
        records.push_back(record);
        Ok(())
    }

    async fn prune(&self, user: UserId, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - self.window;
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(&user)
            .map(|records| Self::prune_deque(records, cutoff))
            .unwrap_or(0))
    }

    async fn last(&self, user: UserId, n: usize) -> Result<Vec<LocationRecord>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user)
            .map(|records| {
                let skip = records.len().saturating_sub(n);
                records.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default())
    }

    async fn users(&self) -> Result<Vec<UserId>> {
        Ok(self.users.read().await.keys().copied().collect())
    }

    async fn evict_expired(&self, user: UserId, now: DateTime<Utc>) -> Result<bool> {
        let cutoff = now - self.window;
        let mut users = self.users.write().await;
        let Some(records) = users.get_mut(&user) else {
            return Ok(false);
        };
        Self::prune_deque(records, cutoff);
        if records.is_empty() {
            users.remove(&user);
            return Ok(true);
        }
        Ok(false)
    }
}

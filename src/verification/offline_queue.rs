//! Per-user FIFO of pings captured while the client was disconnected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::models::{OfflineQueueEntry, UserId};

#[async_trait]
pub trait OfflineQueue: Send + Sync {
    /// Append to the tail of the user's queue.
    async fn enqueue(&self, user: UserId, entry: OfflineQueueEntry) -> Result<()>;

    /// Remove and return every queued entry, oldest first.
    async fn drain(&self, user: UserId) -> Result<Vec<OfflineQueueEntry>>;

    async fn len(&self, user: UserId) -> Result<usize>;

    /// Users with at least one queued entry.
    async fn users(&self) -> Result<Vec<UserId>>;

    /// Discard `user`'s entries captured before `cutoff`. Returns how many
    /// were removed.
    async fn evict_expired(&self, user: UserId, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// In-process queue. Each user's backlog is capped at `max_entries`; once
/// full, the oldest entry is discarded to make room.
pub struct InMemoryOfflineQueue {
    max_entries: usize,
    queues: RwLock<HashMap<UserId, VecDeque<OfflineQueueEntry>>>,
}

impl InMemoryOfflineQueue {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            queues: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryOfflineQueue {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl OfflineQueue for InMemoryOfflineQueue {
    async fn enqueue(&self, user: UserId, entry: OfflineQueueEntry) -> Result<()> {
        let mut queues = self.queues.write().await;
        let queue = queues.entry(user).or_default();
        while queue.len() >= self.max_entries {
            if let Some(dropped) = queue.pop_front() {
                warn!(
                    user_id = %user,
                    dropped_at = %dropped.timestamp,
                    "Offline queue full ({} entries), discarding oldest",
                    self.max_entries
                );
            }
        }
        queue.push_back(entry);
        Ok(())
    }

    async fn drain(&self, user: UserId) -> Result<Vec<OfflineQueueEntry>> {
        let mut queues = self.queues.write().await;
        Ok(queues
            .remove(&user)
            .map(Vec::from)
            .unwrap_or_default())
    }

    async fn len(&self, user: UserId) -> Result<usize> {
        let queues = self.queues.read().await;
        Ok(queues.get(&user).map(VecDeque::len).unwrap_or(0))
    }

    async fn users(&self) -> Result<Vec<UserId>> {
        Ok(self.queues.read().await.keys().copied().collect())
    }

    async fn evict_expired(&self, user: UserId, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut queues = self.queues.write().await;
        let Some(queue) = queues.get_mut(&user) else {
            return Ok(0);
        };
        let before = queue.len();
        queue.retain(|entry| entry.timestamp >= cutoff);
        let removed = before - queue.len();
        if queue.is_empty() {
            queues.remove(&user);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use chrono::{Duration, TimeZone, Utc};

    fn entry(seconds: i64) -> OfflineQueueEntry {
        let base = Utc.with_ymd_and_hms(2025, 11, 29, 6, 0, 0).unwrap();
        OfflineQueueEntry::new(
            Position::new(10.0, 10.0).unwrap(),
            base + Duration::seconds(seconds),
        )
    }

    #[tokio::test]
    async fn test_drain_is_fifo_and_empties() {
        let queue = InMemoryOfflineQueue::default();
        let user = UserId(5);
        for s in [1, 2, 3] {
            queue.enqueue(user, entry(s)).await.unwrap();
        }
        assert_eq!(queue.len(user).await.unwrap(), 3);

        let drained = queue.drain(user).await.unwrap();
        let order: Vec<_> = drained.iter().map(|e| e.timestamp).collect();
        assert_eq!(order, vec![entry(1).timestamp, entry(2).timestamp, entry(3).timestamp]);

        assert_eq!(queue.len(user).await.unwrap(), 0);
        assert!(queue.drain(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cap_discards_oldest() {
        let queue = InMemoryOfflineQueue::new(2);
        let user = UserId(5);
        for s in [1, 2, 3] {
            queue.enqueue(user, entry(s)).await.unwrap();
        }
        let drained = queue.drain(user).await.unwrap();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].timestamp, entry(2).timestamp);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let queue = InMemoryOfflineQueue::default();
        queue.enqueue(UserId(1), entry(1)).await.unwrap();
        queue.enqueue(UserId(2), entry(2)).await.unwrap();
        assert_eq!(queue.drain(UserId(1)).await.unwrap().len(), 1);
        assert_eq!(queue.len(UserId(2)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_evict_expired_drops_stale_entries() {
        let queue = InMemoryOfflineQueue::default();
        let user = UserId(7);
        for s in [10, 20, 30] {
            queue.enqueue(user, entry(s)).await.unwrap();
        }

        assert_eq!(queue.evict_expired(user, entry(20).timestamp).await.unwrap(), 1);
        assert_eq!(queue.len(user).await.unwrap(), 2);

        assert_eq!(queue.evict_expired(user, entry(31).timestamp).await.unwrap(), 2);
        assert!(queue.users().await.unwrap().is_empty());
        assert_eq!(queue.evict_expired(UserId(8), entry(31).timestamp).await.unwrap(), 0);
    }
}

//! One async mutex per active user so a user's history and queue mutations
//! never interleave, while different users proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::OwnedMutexGuard;

use crate::models::UserId;

struct Slot {
    lock: Arc<tokio::sync::Mutex<()>>,
    last_used: Instant,
}

#[derive(Default)]
pub struct UserLocks {
    slots: Mutex<HashMap<UserId, Slot>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user`'s state. The slot is created on
    /// first use.
    pub async fn acquire(&self, user: UserId) -> OwnedMutexGuard<()> {
        self.lock_slot(user, true).await
    }

    /// Like `acquire`, but does not count as activity for idle reaping.
    pub async fn acquire_quiet(&self, user: UserId) -> OwnedMutexGuard<()> {
        self.lock_slot(user, false).await
    }

    async fn lock_slot(&self, user: UserId, touch: bool) -> OwnedMutexGuard<()> {
        let lock = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let slot = slots.entry(user).or_insert_with(|| Slot {
                lock: Arc::new(tokio::sync::Mutex::new(())),
                last_used: Instant::now(),
            });
            if touch {
                slot.last_used = Instant::now();
            }
            slot.lock.clone()
        };
        lock.lock_owned().await
    }

    /// Drop slots unused for at least `idle` that nobody holds or waits on.
    pub fn reap_idle(&self, idle: Duration) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        slots.retain(|_, slot| {
            Arc::strong_count(&slot.lock) > 1 || slot.last_used.elapsed() < idle
        });
        before - slots.len()
    }

    pub fn active(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

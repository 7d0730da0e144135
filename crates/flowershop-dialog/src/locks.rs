// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user mutual exclusion.
//!
//! Events for the same user are serialized for the whole
//! read-compute-write cycle; different users never contend. Idle entries are
//! removed when the last guard for a user is dropped.

use std::sync::Arc;

use dashmap::DashMap;
use flowershop_core::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

/// Table of per-user locks.
#[derive(Clone, Default)]
pub struct UserLocks {
    locks: Arc<DashMap<UserId, Slot>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user`'s dialog.
    pub async fn lock(&self, user: &UserId) -> UserGuard {
        let slot = self
            .locks
            .entry(user.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = slot.lock_owned().await;
        UserGuard {
            user: user.clone(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of users with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while a user's event is being processed.
pub struct UserGuard {
    user: UserId,
    locks: Arc<DashMap<UserId, Slot>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        // Release first so the strong count below only counts waiters and the map.
        self.guard.take();
        self.locks
            .remove_if(&self.user, |_, slot| Arc::strong_count(slot) == 1);
    }
}

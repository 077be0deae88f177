//! crates/course_enrollment_core/src/locks.rs
//!
//! Per-aggregate async mutexes. Read-modify-write sequences on the same
//! aggregate id are serialised within this process; different ids never
//! contend. An id's entry lives only while someone holds or awaits it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;

type LockMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

#[derive(Debug, Default)]
pub struct AggregateLocks {
    inner: Mutex<LockMap>,
}

/// Exclusive access to one aggregate. Dropping it releases the lock and
/// removes the map entry once nobody else is waiting on it.
#[must_use]
pub struct AggregateGuard<'a> {
    locks: &'a AggregateLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to aggregate `id`.
    pub async fn acquire(&self, id: &str) -> AggregateGuard<'_> {
        let lock = self.map().entry(id.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        AggregateGuard {
            locks: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of ids currently held or awaited.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        // A poisoned map only means another thread panicked mid-update;
        // the map itself is still usable.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for AggregateGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Clones are only taken under the map lock, so a count of one here
        // means the map is the last owner.
        let mut map = self.locks.map();
        if map.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let locks = Arc::new(AggregateLocks::new());
        let guard = locks.acquire("course-1").await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire("course-1").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_ids_do_not_contend() {
        let locks = AggregateLocks::new();
        let _a = locks.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_entries_are_removed_when_released() {
        let locks = AggregateLocks::new();
        for i in 0..1000 {
            let _g = locks.acquire(&format!("missing-{}", i)).await;
        }
        assert!(locks.is_empty());

        let held = locks.acquire("held").await;
        assert_eq!(locks.len(), 1);
        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_survives_while_a_waiter_remains() {
        let locks = Arc::new(AggregateLocks::new());
        let first = locks.acquire("course-1").await;

        let locks2 = locks.clone();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire("course-1").await;
            let _ = rx.await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        // The waiter now holds the lock; its entry must still be there.
        assert_eq!(locks.len(), 1);

        tx.send(()).unwrap();
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}

//! Per-domain serialization of setup, verification and cleanup

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async mutex per domain id
///
/// Entries nobody holds are pruned on the next `lock` call, so the map only
/// grows with the number of domains being worked on concurrently.
#[derive(Default)]
pub struct DomainLocks {
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DomainLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `domain_id`.
    pub async fn lock(&self, domain_id: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            locks.retain(|id, m| id == domain_id || Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(domain_id.to_string()).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of tracked domains.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_domain_is_serialized() {
        let locks = Arc::new(DomainLocks::new());
        let guard = locks.lock("d1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("d1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn other_domains_do_not_wait() {
        let locks = DomainLocks::new();
        let _a = locks.lock("a").await;
        let _b = locks.lock("b").await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = DomainLocks::new();
        drop(locks.lock("a").await);
        drop(locks.lock("b").await);
        let _c = locks.lock("c").await;
        assert_eq!(locks.len(), 1);
    }
}

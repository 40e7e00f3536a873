//! Process-wide named locks
//!
//! Each key maps to its own async mutex. Entries are created on first use and
//! dropped again once the last holder or waiter releases them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Key prefix for locks serializing writes to one environment
pub const UPDATE_ENV_LOCK_PREFIX: &str = "UpdateHelmEnv";

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Lock key of the (project, environment) pair
pub fn env_lock_key(product_name: &str, env_name: &str) -> String {
    format!("{}:{}:{}", UPDATE_ENV_LOCK_PREFIX, product_name, env_name)
}

/// Table of named async locks shared by clones
#[derive(Debug, Clone, Default)]
pub struct NamedLocks {
    table: LockTable,
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `key` is free and holds it until the guard drops
    pub async fn lock(&self, key: &str) -> NamedLockGuard {
        let entry = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table.entry(key.to_string()).or_default().clone()
        };
        let guard = entry.lock_owned().await;
        tracing::debug!("Acquired lock {}", key);

        NamedLockGuard {
            key: key.to_string(),
            table: self.table.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds a named lock; releasing happens on drop
#[derive(Debug)]
pub struct NamedLockGuard {
    key: String,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl NamedLockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for NamedLockGuard {
    fn drop(&mut self) {
        self.guard.take();

        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        // Only the table itself still references an unused entry
        if table
            .get(&self.key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            table.remove(&self.key);
        }
        tracing::debug!("Released lock {}", self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_env_lock_key() {
        assert_eq!(env_lock_key("mall", "dev"), "UpdateHelmEnv:mall:dev");
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = NamedLocks::new();
        let guard = locks.lock("a").await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.lock("a").await;
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
    async fn test_distinct_keys_do_not_block() {
        let locks = NamedLocks::new();
        let a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_secs(1), locks.lock("b"))
            .await
            .unwrap();

        assert_eq!(a.key(), "a");
        assert_eq!(b.key(), "b");
        assert_eq!(locks.len(), 2);

        drop(a);
        drop(b);
        assert!(locks.is_empty());
    }
}

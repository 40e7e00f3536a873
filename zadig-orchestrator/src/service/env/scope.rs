//! Locked environment transactions
//!
//! [`EnvScope`] pairs the environment's named lock with a storage transaction.
//! The lock is taken before the transaction begins and released only after
//! it has been committed, aborted or dropped.

use crate::error::RepositoryError;
use crate::repository::{EnvironmentRepository, EnvironmentTx};

use super::lock::{NamedLockGuard, NamedLocks, env_lock_key};

pub struct EnvScope<T: EnvironmentTx> {
    // Declared before the guard so an uncommitted transaction is dropped first
    tx: T,
    guard: NamedLockGuard,
}

impl<T: EnvironmentTx> EnvScope<T> {
    /// Locks the (project, environment) pair and begins a transaction on it
    pub async fn open<R>(
        repo: &R,
        locks: &NamedLocks,
        product_name: &str,
        env_name: &str,
    ) -> Result<Self, RepositoryError>
    where
        R: EnvironmentRepository<Tx = T> + ?Sized,
    {
        let key = env_lock_key(product_name, env_name);
        let guard = locks.lock(&key).await;
        let tx = repo.begin(&key).await?;
        Ok(Self { tx, guard })
    }

    pub fn tx(&mut self) -> &mut T {
        &mut self.tx
    }

    pub fn lock_key(&self) -> &str {
        self.guard.key()
    }

    pub async fn commit(self) -> Result<(), RepositoryError> {
        let Self { tx, guard } = self;
        let result = tx.commit().await;
        drop(guard);
        result
    }

    pub async fn abort(self) -> Result<(), RepositoryError> {
        let Self { tx, guard } = self;
        let result = tx.abort().await;
        drop(guard);
        result
    }

    /// Commits when `result` is `Ok`, aborts otherwise, and hands it back
    ///
    /// A failed abort is logged; the caller sees the original error.
    pub async fn finish<V, E>(self, result: Result<V, E>) -> Result<V, E>
    where
        E: From<RepositoryError>,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                let key = self.lock_key().to_string();
                if let Err(abort_err) = self.abort().await {
                    tracing::warn!("Failed to abort transaction {}: {}", key, abort_err);
                }
                Err(e)
            }
        }
    }
}

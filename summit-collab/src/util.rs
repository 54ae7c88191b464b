use std::{hash::Hash, sync::Arc};

use dashmap::DashMap;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tokio::sync::{Mutex, OwnedMutexGuard};

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// One async lock per key, created on first use
pub struct KeyedLocks<K> {
    locks: Arc<DashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Waits until nobody else holds the lock for `key`
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(key).or_default().clone();
        lock.lock_owned().await
    }

    /// Drops the lock of a removed entity
    pub fn forget(&self, key: &K) {
        self.locks.remove(key);
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            locks: Default::default(),
        }
    }
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            locks: self.locks.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::{random_string, KeyedLocks};

    #[test]
    fn random_strings_have_the_requested_length() {
        assert_eq!(random_string(32).len(), 32);
        assert_ne!(random_string(32), random_string(32));
    }

    #[tokio::test]
    async fn same_key_waits() {
        let locks: KeyedLocks<u32> = Default::default();
        let guard = locks.lock(1).await;

        let other = locks.clone();
        let blocked = tokio::time::timeout(Duration::from_millis(50), other.lock(1)).await;
        assert!(blocked.is_err());

        let free = tokio::time::timeout(Duration::from_millis(50), other.lock(2)).await;
        assert!(free.is_ok());

        drop(guard);
        assert!(tokio::time::timeout(Duration::from_millis(50), locks.lock(1))
            .await
            .is_ok());
    }
}

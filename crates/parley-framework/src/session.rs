//! Shared state for handlers.
//!
//! Handlers run concurrently in their own tasks, so state kept across an
//! interaction's round trips (a user's pending order between opening and
//! submitting a dialog, say) must be shared and locked. [`SessionStore`] is
//! a cloneable, mutex-guarded map for exactly that.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

/// A cloneable, thread-safe key-value map.
///
/// Clones share the same underlying map.
///
/// ```rust
/// use parley_framework::SessionStore;
///
/// let orders: SessionStore<String, Vec<String>> = SessionStore::new();
/// orders.with_entry("U1".to_string(), |o| o.push("latte".to_string()));
/// assert_eq!(orders.get(&"U1".to_string()), Some(vec!["latte".to_string()]));
/// ```
#[derive(Debug)]
pub struct SessionStore<K, V> {
    entries: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Clone for SessionStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Default for SessionStore<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> SessionStore<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.entries.lock().insert(key, value)
    }

    /// Returns a clone of the value for `key`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.entries.lock().get(key).cloned()
    }

    /// Removes and returns the value for `key`.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.lock().remove(key)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Runs `f` on the entry for `key`, inserting a default value first if
    /// needed.
    ///
    /// The lock is held while `f` runs; `f` must not touch the store.
    pub fn with_entry<R>(&self, key: K, f: impl FnOnce(&mut V) -> R) -> R
    where
        V: Default,
    {
        let mut entries = self.entries.lock();
        f(entries.entry(key).or_default())
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let store: SessionStore<&str, u32> = SessionStore::new();
        let other = store.clone();

        assert_eq!(store.insert("U1", 1), None);
        assert_eq!(other.get(&"U1"), Some(1));
        assert_eq!(other.insert("U1", 2), Some(1));
        assert!(store.contains(&"U1"));
        assert_eq!(store.remove(&"U1"), Some(2));
        assert!(other.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates() {
        let store: SessionStore<String, u32> = SessionStore::new();
        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.with_entry(format!("U{}", i % 4), |n| *n += 1);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.len(), 4);
        for i in 0..4 {
            assert_eq!(store.get(&format!("U{i}")), Some(8));
        }
    }
}

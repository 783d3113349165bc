//! One independently-locked cache partition.

use parking_lot::Mutex;

use crate::tree::{self, Link, Node};

/// Eviction policy: between two entries, prefer the one written longer ago.
fn older<'a, K, V>(a: &'a Node<K, V>, b: &'a Node<K, V>) -> &'a Node<K, V> {
    if b.touched_at < a.touched_at {
        b
    } else {
        a
    }
}

/// A shard pairs one tree root with the mutex that guards it.
///
/// The tree is only ever read or mutated while the lock is held; every
/// method takes it for the duration of the call and the guard releases it on
/// all paths. Shards know nothing about each other or about capacity.
pub(crate) struct Shard<K, V> {
    root: Mutex<Link<K, V>>,
}

impl<K: Ord, V: Clone> Shard<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            root: Mutex::new(None),
        }
    }

    /// Look up a key, cloning the value out under the lock.
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        let root = self.root.lock();
        tree::lookup(&root, key).cloned()
    }

    /// Store an entry. Returns whether a new node was created rather than an
    /// existing one updated in place. Never rejects: shards have no local
    /// capacity limit.
    pub(crate) fn put(&self, key: K, value: V, touched_at: u64) -> bool {
        let mut root = self.root.lock();
        let (new_root, created) = tree::insert(root.take(), key, value, touched_at);
        *root = new_root;
        created
    }

    /// Remove a key, reporting whether it was actually present.
    pub(crate) fn remove(&self, key: &K) -> bool {
        let mut root = self.root.lock();
        let (new_root, removed) = tree::delete(root.take(), key);
        *root = new_root;
        removed
    }

    /// Key and timestamp of this shard's oldest entry, if any. The key is
    /// cloned out so nothing borrowed escapes the lock.
    pub(crate) fn oldest(&self) -> Option<(K, u64)>
    where
        K: Clone,
    {
        let root = self.root.lock();
        let oldest = tree::fold_extremum(&root, &older)?;
        Some((oldest.key.clone(), oldest.touched_at))
    }

    /// Exact number of entries in this shard. O(n).
    pub(crate) fn len(&self) -> usize {
        tree::count(&self.root.lock())
    }

    /// Drop every entry in this shard.
    pub(crate) fn clear(&self) {
        *self.root.lock() = None;
    }

    /// This shard's keys in sorted order.
    #[cfg(test)]
    pub(crate) fn keys_in_order(&self) -> Vec<K>
    where
        K: Clone,
    {
        let root = self.root.lock();
        let mut keys = Vec::new();
        tree::push_in_order(&root, &mut keys);
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_put_get_remove() {
        let shard: Shard<u64, String> = Shard::new();

        assert!(shard.put(1, "one".to_string(), 10));
        assert!(shard.put(2, "two".to_string(), 20));
        assert_eq!(shard.get(&1), Some("one".to_string()));
        assert_eq!(shard.get(&3), None);
        assert_eq!(shard.len(), 2);

        assert!(shard.remove(&1));
        assert!(!shard.remove(&1));
        assert_eq!(shard.get(&1), None);
        assert_eq!(shard.len(), 1);
    }

    #[test]
    fn test_shard_put_existing_updates() {
        let shard: Shard<u64, &str> = Shard::new();

        assert!(shard.put(7, "old", 10));
        assert!(!shard.put(7, "new", 20));
        assert_eq!(shard.get(&7), Some("new"));
        assert_eq!(shard.len(), 1);
    }

    #[test]
    fn test_shard_oldest() {
        let shard: Shard<u64, &str> = Shard::new();
        assert_eq!(shard.oldest(), None);

        shard.put(1, "a", 30);
        shard.put(2, "b", 10);
        shard.put(3, "c", 20);
        assert_eq!(shard.oldest(), Some((2, 10)));

        // Rewriting the oldest entry refreshes it past the others.
        shard.put(2, "b2", 40);
        assert_eq!(shard.oldest(), Some((3, 20)));
    }

    #[test]
    fn test_shard_clear() {
        let shard: Shard<u64, &str> = Shard::new();
        shard.put(1, "a", 1);
        shard.put(2, "b", 2);

        shard.clear();
        assert_eq!(shard.len(), 0);
        assert_eq!(shard.get(&1), None);
    }
}

//! Sharded cache: hash routing, approximate capacity, two-phase eviction.

use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use ahash::RandomState;

use crate::error::{Error, Result};
use crate::shard::Shard;
use crate::stats::CacheStats;

/// Default number of partitions.
pub const DEFAULT_NUM_SHARDS: usize = 1024;

/// Default capacity in entries.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Thread-safe, bounded key-value cache partitioned into independently
/// locked shards.
///
/// Keys hash to a fixed shard; each shard serializes access to its own
/// ordered tree behind one mutex. No operation holds more than one shard
/// lock at a time, including the eviction scan, so shards never deadlock
/// against each other.
///
/// ## Capacity and drift
///
/// Capacity is approximate. A write claims a slot in the shared size gauge
/// before touching any shard and triggers eviction when the gauge crosses
/// capacity, so the entry being written is not yet visible to the eviction
/// scan and concurrent writers can transiently over- or undershoot the
/// bound. The gauge itself is a relaxed atomic outside every shard lock:
/// treat it as a best-effort reading, not a linearizable count.
///
/// ## Eviction
///
/// Eviction removes the entry with the oldest last-write timestamp, found
/// by scanning every shard one lock at a time and folding the per-shard
/// candidates into a global winner. Lookups do not refresh timestamps, so
/// this approximates least-recently-*written*, not strict LRU.
///
/// # Example
///
/// ```
/// use shardcache::ShardedCache;
///
/// let cache = ShardedCache::with_config(8, 128).unwrap();
/// cache.put(1u64, "one");
///
/// assert_eq!(cache.get(&1), Some("one"));
/// assert!(cache.remove(&1));
/// assert_eq!(cache.get(&1), None);
/// ```
pub struct ShardedCache<K, V> {
    shards: Box<[Shard<K, V>]>,
    hasher: RandomState,
    /// Best-effort entry gauge; see the type docs on drift.
    size: AtomicI64,
    capacity: usize,
    epoch: Instant,
    stats: CacheStats,
}

impl<K, V> std::fmt::Debug for ShardedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedCache")
            .field("num_shards", &self.shards.len())
            .field("size", &self.size.load(Ordering::Relaxed))
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<K, V> ShardedCache<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the default shard count and capacity.
    pub fn new() -> Self {
        Self::build(DEFAULT_NUM_SHARDS, DEFAULT_CAPACITY)
    }

    /// Create a cache with explicit configuration.
    ///
    /// `num_shards` and `capacity` are independent knobs: shard count trades
    /// memory for lower lock contention, capacity bounds the entry count.
    /// Both must be positive.
    pub fn with_config(num_shards: usize, capacity: usize) -> Result<Self> {
        if num_shards == 0 {
            return Err(Error::ZeroShards);
        }
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(Self::build(num_shards, capacity))
    }

    fn build(num_shards: usize, capacity: usize) -> Self {
        let shards: Box<[Shard<K, V>]> = (0..num_shards).map(|_| Shard::new()).collect();
        Self {
            shards,
            hasher: RandomState::new(),
            size: AtomicI64::new(0),
            capacity,
            epoch: Instant::now(),
            stats: CacheStats::new(),
        }
    }

    /// Shard index for a key; stable for the lifetime of this cache.
    fn route(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) as usize) % self.shards.len()
    }

    /// Milliseconds since this cache was constructed.
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Look up a key.
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.shards[self.route(key)].get(key);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    /// Store an entry, evicting the oldest one first if the cache is full.
    ///
    /// Writing an existing key updates its value and refreshes its
    /// timestamp without growing the cache. Always succeeds: capacity
    /// pressure is resolved by eviction, never by rejecting the write.
    pub fn put(&self, key: K, value: V) -> bool {
        self.put_at(key, value, self.now_ms())
    }

    /// Timestamped insertion seam shared by `put` and the deterministic
    /// eviction tests.
    fn put_at(&self, key: K, value: V, touched_at: u64) -> bool {
        // Claim the slot before inserting so growth is bounded up front.
        let claimed = self.size.fetch_add(1, Ordering::Relaxed) + 1;
        if claimed > self.capacity as i64 {
            self.evict_oldest();
        }

        let created = self.shards[self.route(&key)].put(key, value, touched_at);
        if created {
            self.stats.record_insert();
        } else {
            // In-place update: hand the claimed slot back.
            self.size.fetch_sub(1, Ordering::Relaxed);
            self.stats.record_update();
        }
        true
    }

    /// Remove a key, reporting whether it was actually present.
    ///
    /// The gauge is decremented only on an actual removal; a miss changes
    /// nothing.
    pub fn remove(&self, key: &K) -> bool {
        let removed = self.shards[self.route(key)].remove(key);
        if removed {
            self.size.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Evict the entry with the oldest last-write timestamp, if any.
    ///
    /// Runs in two phases. The scan visits shards in index order, holding
    /// one lock at a time, and folds each shard's oldest entry into a
    /// running winner. The removal then re-acquires the winner's shard
    /// lock. The phases are not atomic: the candidate may have been
    /// removed or rewritten in between, in which case the removal misses
    /// and this returns `false`. An empty cache is a no-op.
    pub fn evict_oldest(&self) -> bool {
        let mut candidate: Option<(K, u64)> = None;
        for shard in self.shards.iter() {
            let Some(local) = shard.oldest() else {
                continue;
            };
            candidate = match candidate {
                Some(best) if best.1 <= local.1 => Some(best),
                _ => Some(local),
            };
        }

        let Some((key, _)) = candidate else {
            return false;
        };

        let evicted = self.remove(&key);
        if evicted {
            self.stats.record_eviction();
        }
        evicted
    }

    /// Exact entry count, summing shard walks one lock at a time. O(n).
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// The size gauge maintained by `put`/`remove`. Cheap, but may drift
    /// transiently from [`len`](Self::len) under concurrent eviction.
    pub fn approx_len(&self) -> usize {
        self.size.load(Ordering::Relaxed).max(0) as usize
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity in entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of partitions.
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Drop every entry and reset the gauge and statistics.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
        self.size.store(0, Ordering::Relaxed);
        self.stats.reset();
    }

    /// Activity counters for this cache.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V> Default for ShardedCache<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

//! # shardcache
//!
//! Thread-safe, bounded in-memory key-value cache with approximate
//! oldest-write eviction.
//!
//! ## Architecture
//! - **Routing**: keys hash (AHash) to one of a fixed set of shards
//! - **Shards**: each pairs an ordered binary search tree with its own mutex
//! - **Eviction**: crossing capacity triggers a cross-shard scan for the
//!   entry with the oldest last-write timestamp
//!
//! Locks are never nested: every operation, the eviction scan included,
//! holds at most one shard lock at a time. Capacity is approximate by
//! design; see [`ShardedCache`] for the drift semantics.

#![warn(missing_docs)]

mod cache;
mod error;
mod shard;
mod stats;
mod tree;

pub use cache::{ShardedCache, DEFAULT_CAPACITY, DEFAULT_NUM_SHARDS};
pub use error::{Error, Result};
pub use stats::CacheStats;

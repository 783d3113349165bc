//! Synthetic load driver for shardcache
//!
//! Spawns worker threads that exercise put/get/remove over a shared cache
//! and reports anomalies. A lookup miss on a key that was inserted usually
//! means the entry was evicted; the driver surfaces those as warnings
//! rather than failures.

use std::ops::Range;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use shardcache::ShardedCache;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Worker threads per pass
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Total number of keys spread across the workers
    #[arg(short, long, default_value_t = 1024)]
    keys: u64,

    /// Number of cache shards
    #[arg(short, long, default_value_t = 1024)]
    shards: usize,

    /// Cache capacity (number of entries)
    #[arg(short, long, default_value_t = 1024)]
    capacity: usize,

    /// Run read and delete passes concurrently after the insert pass
    #[arg(long)]
    churn: bool,
}

/// Value stored by the driver; stands in for a small application record.
#[derive(Clone, Debug)]
struct Payload {
    worker: usize,
    seq: u64,
}

type Cache = ShardedCache<u64, Payload>;

/// Contiguous slice of the key space owned by one worker; the remainder
/// goes to the last worker.
fn key_range(worker: usize, threads: usize, keys: u64) -> Range<u64> {
    let per_worker = keys / threads as u64;
    let start = worker as u64 * per_worker;
    let end = if worker + 1 == threads {
        keys
    } else {
        start + per_worker
    };
    start..end
}

/// Every worker inserts its own disjoint key range.
fn insert_pass(cache: &Arc<Cache>, args: &Args) {
    let mut handles = Vec::new();
    for worker in 0..args.threads {
        let cache = Arc::clone(cache);
        let range = key_range(worker, args.threads, args.keys);
        handles.push(thread::spawn(move || {
            for (seq, key) in range.enumerate() {
                cache.put(
                    key,
                    Payload {
                        worker,
                        seq: seq as u64,
                    },
                );
            }
        }));
    }
    for handle in handles {
        handle.join().expect("insert worker panicked");
    }
    info!("insert pass done: {} keys", args.keys);
}

/// Worker that inserted a given key, per the `key_range` split.
fn owner(key: u64, threads: usize, keys: u64) -> usize {
    (0..threads)
        .find(|&worker| key_range(worker, threads, keys).contains(&key))
        .unwrap_or(threads.saturating_sub(1))
}

/// Every worker reads the full key set, counting misses and checking that
/// surviving entries still carry the payload their owner stored.
fn read_pass(cache: &Arc<Cache>, args: &Args) -> u64 {
    let mut handles = Vec::new();
    for worker in 0..args.threads {
        let cache = Arc::clone(cache);
        let keys = args.keys;
        let threads = args.threads;
        handles.push(thread::spawn(move || {
            let mut misses = 0u64;
            for key in 0..keys {
                match cache.get(&key) {
                    Some(payload) => {
                        let expected_worker = owner(key, threads, keys);
                        let expected_seq = key - key_range(expected_worker, threads, keys).start;
                        if payload.worker != expected_worker || payload.seq != expected_seq {
                            warn!("[read-{worker}] key {key} holds unexpected {payload:?}");
                        }
                    }
                    None => {
                        misses += 1;
                        warn!("[read-{worker}] key {key} not found, possibly evicted");
                    }
                }
            }
            misses
        }));
    }
    let misses: u64 = handles
        .into_iter()
        .map(|handle| handle.join().expect("read worker panicked"))
        .sum();
    info!("read pass done: {misses} misses");
    misses
}

/// Every worker deletes its own disjoint key range, counting misses.
fn delete_pass(cache: &Arc<Cache>, args: &Args) -> u64 {
    let mut handles = Vec::new();
    for worker in 0..args.threads {
        let cache = Arc::clone(cache);
        let range = key_range(worker, args.threads, args.keys);
        handles.push(thread::spawn(move || {
            let mut misses = 0u64;
            for key in range {
                if !cache.remove(&key) {
                    misses += 1;
                    warn!("[delete-{worker}] key {key} not found, possibly evicted");
                }
            }
            misses
        }));
    }
    let misses: u64 = handles
        .into_iter()
        .map(|handle| handle.join().expect("delete worker panicked"))
        .sum();
    info!("delete pass done: {misses} misses");
    misses
}

/// Readers and deleters race over the same key set; misses are expected
/// and the cache just has to stay coherent.
fn churn_pass(cache: &Arc<Cache>, args: &Args) {
    let mut readers = Vec::new();
    for _ in 0..args.threads {
        let cache = Arc::clone(cache);
        let keys = args.keys;
        readers.push(thread::spawn(move || {
            (0..keys).filter(|key| cache.get(key).is_some()).count() as u64
        }));
    }

    let mut deleters = Vec::new();
    for worker in 0..args.threads {
        let cache = Arc::clone(cache);
        let range = key_range(worker, args.threads, args.keys);
        deleters.push(thread::spawn(move || {
            range.filter(|key| cache.remove(key)).count() as u64
        }));
    }

    let hits: u64 = readers
        .into_iter()
        .map(|handle| handle.join().expect("churn reader panicked"))
        .sum();
    let deleted: u64 = deleters
        .into_iter()
        .map(|handle| handle.join().expect("churn deleter panicked"))
        .sum();
    info!("churn pass done: {hits} reads hit, {deleted} keys deleted");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting shardload v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "threads={} keys={} shards={} capacity={} churn={}",
        args.threads, args.keys, args.shards, args.capacity, args.churn
    );

    let cache: Arc<Cache> = Arc::new(
        ShardedCache::with_config(args.shards, args.capacity)
            .context("invalid cache configuration")?,
    );

    let started = Instant::now();

    insert_pass(&cache, &args);
    if args.churn {
        churn_pass(&cache, &args);
    } else {
        read_pass(&cache, &args);
        delete_pass(&cache, &args);
    }

    let stats = cache.stats();
    info!("elapsed: {:?}", started.elapsed());
    info!(
        "entries: {} (gauge: {}), capacity: {}",
        cache.len(),
        cache.approx_len(),
        cache.capacity()
    );
    info!(
        "hits: {} misses: {} hit_ratio: {:.3}",
        stats.hits(),
        stats.misses(),
        stats.hit_ratio()
    );
    info!(
        "inserts: {} updates: {} evictions: {}",
        stats.inserts(),
        stats.updates(),
        stats.evictions()
    );

    Ok(())
}

//! Error types for shardcache

use std::fmt;

/// Result type alias for shardcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors.
///
/// Runtime cache operations never fail: absence is reported through
/// `Option`/`bool` outcomes, and capacity pressure is resolved by eviction
/// rather than by rejecting writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Shard count must be positive
    ZeroShards,

    /// Capacity must be positive
    ZeroCapacity,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroShards => write!(f, "shard count must be greater than zero"),
            Error::ZeroCapacity => write!(f, "capacity must be greater than zero"),
        }
    }
}

impl std::error::Error for Error {}

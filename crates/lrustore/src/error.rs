//! Error types for lrustore

use std::fmt;

/// Result type alias for lrustore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by configuration parsing and structural validation.
///
/// Regular cache operations never fail; these only surface from
/// [`StoreConfig::from_json_str`](crate::StoreConfig::from_json_str) and
/// [`LruStore::validate`](crate::LruStore::validate).
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be parsed
    Config(String),

    /// Index and recency list disagree on the number of entries
    IndexMismatch {
        /// Keys in the lookup index
        indexed: usize,
        /// Entries reachable between the sentinels
        linked: usize,
    },

    /// A prev/next link does not point back at its neighbour
    BrokenLink {
        /// Slot whose links are inconsistent
        slot: usize,
    },

    /// More entries stored than the capacity allows
    OverCapacity {
        /// Stored entries
        len: usize,
        /// Configured capacity
        capacity: u32,
    },

    /// Capacity dropped below 1
    ZeroCapacity,

    /// Index entry points at a slot that does not hold its key
    StaleIndex {
        /// Slot referenced by the index
        slot: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Config error: {}", msg),
            Error::IndexMismatch { indexed, linked } => write!(
                f,
                "Index mismatch: {} indexed keys, {} linked entries",
                indexed, linked
            ),
            Error::BrokenLink { slot } => write!(f, "Broken link at slot {}", slot),
            Error::OverCapacity { len, capacity } => {
                write!(f, "Over capacity: {} entries (capacity {})", len, capacity)
            }
            Error::ZeroCapacity => write!(f, "Capacity is zero"),
            Error::StaleIndex { slot } => write!(f, "Stale index entry for slot {}", slot),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

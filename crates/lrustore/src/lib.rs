//! # lrustore
//!
//! Fixed-capacity key-value store with least-recently-used eviction.
//!
//! ## Architecture
//! - **HashMap**: AHash index from key to arena slot (O(1))
//! - **Recency list**: doubly-linked by slot index between two sentinels (O(1))
//! - **Capacity**: loosely typed input normalized to a positive `u32`
//! - **Materialization**: values shared by `Rc` or deep-copied at the boundary
//!
//! ```
//! use lrustore::LruStore;
//!
//! let mut store = LruStore::with_capacity(2);
//! store.put("a", 1);
//! store.put("b", 2);
//! store.put("c", 3);
//!
//! assert_eq!(store.get(&"a"), None);
//! assert_eq!(store.least_recent(), Some(&"b"));
//!
//! store.set_capacity("1");
//! assert_eq!(store.len(), 1);
//! ```

#![warn(missing_docs)]

mod capacity;
mod config;
mod error;
mod materialize;
mod stats;
mod store;

pub use capacity::{
    initial_capacity, normalize_capacity, IntoCapacity, DEFAULT_CAPACITY, MIN_CAPACITY,
};
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use materialize::Materialize;
pub use stats::CacheStats;
pub use store::{Iter, LruStore};

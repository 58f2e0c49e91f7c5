//! Store configuration
//!
//! ```
//! use lrustore::{LruStore, Materialize, StoreConfig};
//!
//! let config = StoreConfig::from_json_str(r#"{ "capacity": "8", "materialize": "deep_copy" }"#)?;
//! assert_eq!(config.capacity(), 8);
//!
//! let store: LruStore<String, Vec<u8>> = LruStore::with_config(config);
//! assert_eq!(store.materialize(), Materialize::DeepCopy);
//! # Ok::<(), lrustore::Error>(())
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::capacity::{initial_capacity, IntoCapacity, DEFAULT_CAPACITY};
use crate::error::Result;
use crate::materialize::Materialize;

/// Construction parameters for an [`LruStore`](crate::LruStore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of entries, normalized like a constructor argument
    #[serde(deserialize_with = "deserialize_capacity")]
    capacity: u32,

    /// Value materialization policy
    materialize: Materialize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            materialize: Materialize::default(),
        }
    }
}

impl StoreConfig {
    /// Default configuration: capacity 3, shared values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document
    ///
    /// Missing fields take their defaults. `capacity` accepts any JSON value
    /// and never fails; only malformed JSON or an unknown `materialize`
    /// policy is an error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the capacity; unusable input falls back to the default capacity
    pub fn with_capacity<C: IntoCapacity>(mut self, capacity: C) -> Self {
        self.capacity = initial_capacity(capacity);
        self
    }

    /// Set the materialization policy
    pub fn with_materialize(mut self, materialize: Materialize) -> Self {
        self.materialize = materialize;
        self
    }

    /// Configured capacity
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Configured materialization policy
    pub fn materialize(&self) -> Materialize {
        self.materialize
    }
}

fn deserialize_capacity<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(initial_capacity(&value))
}

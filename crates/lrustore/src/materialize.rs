//! Value materialization policy
//!
//! Decides whether a value handed to `put` or returned from `get` is shared
//! with the store or copied on the way in and out.

use std::rc::Rc;

use serde::Deserialize;

/// How values cross the store boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Materialize {
    /// Store and return the caller's `Rc`; both sides see the same allocation
    #[default]
    Shared,

    /// Clone the value on `put_rc` and again on every `get`; `put` already
    /// hands over sole ownership and stores the value as is
    DeepCopy,
}

impl Materialize {
    /// Prepare a value handed to `put_rc` for storage
    pub(crate) fn store<V: Clone>(self, value: Rc<V>) -> Rc<V> {
        match self {
            Materialize::Shared => value,
            Materialize::DeepCopy => Rc::new((*value).clone()),
        }
    }

    /// Produce the value returned from `get`
    pub(crate) fn load<V: Clone>(self, stored: &Rc<V>) -> Rc<V> {
        match self {
            Materialize::Shared => Rc::clone(stored),
            Materialize::DeepCopy => Rc::new((**stored).clone()),
        }
    }
}

//! Cache Entry Module
//!
//! Values handed back by the process cache.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CoreError, Result};

// == Cache Entry ==
/// A value read out of the process cache.
///
/// The cache stores whatever it was given and never checks shape on read.
/// Converting to a concrete type is the caller's step, and a wrong guess
/// surfaces there as [`CoreError::TypeMismatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    // == Cast ==
    /// Converts the stored value into `T`.
    pub fn cast<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone()).map_err(|e| CoreError::TypeMismatch(e.to_string()))
    }

    // == Into Inner ==
    /// Returns the raw stored value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

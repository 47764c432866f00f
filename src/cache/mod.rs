//! Cache Module
//!
//! Lazily-created process cache with tag-composed keys.

mod entry;
mod stats;
mod store;
pub mod tags;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::ProcessCache;
pub use tags::{MARKER_TAG, TAG_SEPARATOR};

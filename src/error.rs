//! Error types for the portfolio core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Core Error Enum ==
/// Unified error type for the cache, limiter and user service layers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The process cache has not been created yet
    #[error("cache not initialized")]
    NotInitialized,

    /// A rate-limited lane refused the call
    #[error("Too many requests on lane: {0}")]
    RateLimited(String),

    /// No limiter is registered for the lane
    #[error("Unknown rate limit lane: {0}")]
    UnknownLane(String),

    /// The caller is not permitted to perform the action
    #[error("Not allowed: {0}")]
    NotAllowed(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A stored value did not have the shape the caller asked for
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Input text could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the portfolio core.
pub type Result<T> = std::result::Result<T, CoreError>;

//! Portfolio Core - cache, rate limiting and memoization for the portfolio site
//!
//! Provides a lazily-created process cache with tag-composed keys, a
//! fixed-window rate limiter, identity-keyed memoization and the numeric
//! helpers the site's pages use.

pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod helpers;
pub mod lifecycle;
pub mod limiter;
pub mod memo;
pub mod models;
pub mod services;

pub use config::Config;
pub use context::{Core, SharedCore};
pub use error::{CoreError, Result};
pub use lifecycle::{InitOptions, InitOutcome};
pub use limiter::{create_rate_limiter, RateLimiter, WindowPolicy};
pub use memo::{expensive_calculation, IdentityMemo, Measure};
pub use services::UserService;

//! Fixed-Window Rate Limiter
//!
//! Each limiter counts calls since its window start and allows a call while
//! the count is within the configured limit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{system_clock, SharedClock};

/// Default window length in milliseconds.
pub const DEFAULT_WINDOW_MS: u64 = 1000;

// == Window Policy ==
/// What happens to the window start when the counter resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// The window start is never moved. Once the first window has elapsed,
    /// every call resets the counter, so the limiter allows everything from
    /// then on (for `limit >= 1`).
    #[default]
    Sticky,
    /// The window start moves to the reset time, giving a real fixed window.
    Rolling,
}

impl FromStr for WindowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sticky" => Ok(Self::Sticky),
            "rolling" => Ok(Self::Rolling),
            other => Err(format!("unknown window policy: {}", other)),
        }
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sticky => f.write_str("sticky"),
            Self::Rolling => f.write_str("rolling"),
        }
    }
}

// == Rate Limiter ==
/// Fixed-window call counter for one lane.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: u64,
    window_ms: u64,
    policy: WindowPolicy,
    count: u64,
    window_start_ms: u64,
    clock: SharedClock,
}

impl RateLimiter {
    /// Creates a limiter on the system clock with a 1000 ms sticky window.
    pub fn new(limit: u64) -> Self {
        Self::with_clock(limit, system_clock())
    }

    /// Creates a limiter reading time from `clock`. The window starts now.
    pub fn with_clock(limit: u64, clock: SharedClock) -> Self {
        let window_start_ms = clock.now_ms();
        Self {
            limit,
            window_ms: DEFAULT_WINDOW_MS,
            policy: WindowPolicy::Sticky,
            count: 0,
            window_start_ms,
            clock,
        }
    }

    /// Sets the window length.
    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Sets the reset policy.
    pub fn policy(mut self, policy: WindowPolicy) -> Self {
        self.policy = policy;
        self
    }

    // == Allow ==
    /// Records a call and returns whether it is within the limit.
    pub fn allow(&mut self) -> bool {
        let now = self.clock.now_ms();
        if now.saturating_sub(self.window_start_ms) > self.window_ms {
            self.count = 0;
            if self.policy == WindowPolicy::Rolling {
                self.window_start_ms = now;
            }
            debug!(policy = %self.policy, "rate limiter window reset");
        }

        self.count = self.count.saturating_add(1);
        let allowed = self.count <= self.limit;
        if !allowed {
            warn!(count = self.count, limit = self.limit, "rate limit exceeded");
        }
        allowed
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Calls counted in the current window.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn window_start_ms(&self) -> u64 {
        self.window_start_ms
    }
}

/// Returns a stateful predicate allowing `limit` calls per window.
pub fn create_rate_limiter(limit: u64) -> impl FnMut() -> bool {
    let mut limiter = RateLimiter::new(limit);
    move || limiter.allow()
}

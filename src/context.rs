//! Core Context
//!
//! Owns every piece of process state (cache, lifecycle flag, memo, limiter
//! lanes) so nothing lives in a module-level global.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, ProcessCache};
use crate::clock::{system_clock, SharedClock};
use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::lifecycle::{InitOptions, InitOutcome, Lifecycle};
use crate::limiter::RateLimiter;
use crate::memo::{expensive_calculation, Measure, MeasureMemo};

// == Core ==
/// All process state for one composing application.
#[derive(Debug)]
pub struct Core {
    config: Config,
    clock: SharedClock,
    lifecycle: Lifecycle,
    cache: ProcessCache,
    memo: MeasureMemo,
    lanes: HashMap<String, RateLimiter>,
}

impl Core {
    /// Creates a context on the system clock. The cache starts absent.
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Creates a context whose limiters read time from `clock`.
    pub fn with_clock(config: Config, clock: SharedClock) -> Self {
        let lifecycle = Lifecycle::new(Duration::from_millis(config.preload_delay_ms));
        Self {
            config,
            clock,
            lifecycle,
            cache: ProcessCache::new(),
            memo: MeasureMemo::new(),
            lanes: HashMap::new(),
        }
    }

    /// Returns the configuration this context was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the clock shared by every limiter lane.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    // == Lifecycle ==
    /// Runs the one-shot initialization; see [`Lifecycle::initialize`].
    pub async fn initialize(&mut self, options: InitOptions) -> Result<InitOutcome> {
        self.lifecycle.initialize(&mut self.cache, options).await
    }

    /// Returns true once `initialize` has run, with or without preload.
    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    // == Cache ==
    /// Stores `value` under `key` plus tags; appends `"used"` to `tags`.
    pub fn remember(&mut self, key: &str, value: Value, tags: &mut Vec<String>) -> Result<()> {
        self.cache.remember(key, value, tags)
    }

    /// [`Core::remember`] with an empty tag list.
    pub fn remember_untagged(&mut self, key: &str, value: Value) -> Result<()> {
        self.cache.remember_untagged(key, value)
    }

    /// Like [`Core::remember`] but leaves `tags` untouched; returns the tags used.
    pub fn remember_pure(&mut self, key: &str, value: Value, tags: &[String]) -> Result<Vec<String>> {
        self.cache.remember_pure(key, value, tags)
    }

    /// Reads the value stored at exactly `key`, unchecked.
    pub fn read(&mut self, key: &str) -> Result<Option<CacheEntry>> {
        self.cache.read(key)
    }

    /// Returns hit/miss counters and the current entry count of the process cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // == Rate Limiting ==
    /// Installs a fresh limiter for `lane`, replacing any existing one.
    pub fn register_lane(&mut self, lane: impl Into<String>, limit: u64) {
        let lane = lane.into();
        let limiter = RateLimiter::with_clock(limit, Arc::clone(&self.clock))
            .window_ms(self.config.rate_window_ms)
            .policy(self.config.window_policy);
        info!(lane = %lane, limit, "rate limit lane registered");
        self.lanes.insert(lane, limiter);
    }

    /// Counts a call on `lane` and returns whether it is allowed.
    pub fn allow(&mut self, lane: &str) -> Result<bool> {
        let limiter = self
            .lanes
            .get_mut(lane)
            .ok_or_else(|| CoreError::UnknownLane(lane.to_string()))?;
        let allowed = limiter.allow();
        debug!(lane, allowed, "rate limit check");
        Ok(allowed)
    }

    // == Memoization ==
    /// Doubles `input.value`, memoized by allocation identity.
    pub fn expensive_calculation(&mut self, input: &Arc<Measure>) -> f64 {
        expensive_calculation(&mut self.memo, input)
    }

    /// Returns hit/miss counters for the calculation memo.
    pub fn memo_stats(&self) -> CacheStats {
        self.memo.stats()
    }
}

// == Shared Core ==
/// Context shared across tasks.
///
/// Every operation takes the write lock, and `initialize` holds it across the
/// preload delay, so concurrent callers cannot both create the cache.
#[derive(Clone, Debug)]
pub struct SharedCore {
    pub core: Arc<RwLock<Core>>,
}

impl SharedCore {
    /// Wraps `core` for sharing across tasks.
    pub fn new(core: Core) -> Self {
        Self {
            core: Arc::new(RwLock::new(core)),
        }
    }

    /// Builds a fresh [`Core`] on the system clock and wraps it.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Core::new(config.clone()))
    }

    pub async fn initialize(&self, options: InitOptions) -> Result<InitOutcome> {
        self.core.write().await.initialize(options).await
    }

    pub async fn is_initialized(&self) -> bool {
        self.core.read().await.is_initialized()
    }

    pub async fn remember(&self, key: &str, value: Value, tags: &mut Vec<String>) -> Result<()> {
        self.core.write().await.remember(key, value, tags)
    }

    pub async fn remember_untagged(&self, key: &str, value: Value) -> Result<()> {
        self.core.write().await.remember_untagged(key, value)
    }

    /// See [`Core::remember_pure`].
    pub async fn remember_pure(&self, key: &str, value: Value, tags: &[String]) -> Result<Vec<String>> {
        self.core.write().await.remember_pure(key, value, tags)
    }

    pub async fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        // Write lock: reads update hit/miss counters
        self.core.write().await.read(key)
    }

    pub async fn register_lane(&self, lane: impl Into<String>, limit: u64) {
        self.core.write().await.register_lane(lane, limit)
    }

    pub async fn allow(&self, lane: &str) -> Result<bool> {
        self.core.write().await.allow(lane)
    }

    pub async fn expensive_calculation(&self, input: &Arc<Measure>) -> f64 {
        self.core.write().await.expensive_calculation(input)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.core.read().await.cache_stats()
    }

    /// Current time according to the context's clock.
    pub async fn now_ms(&self) -> u64 {
        self.core.read().await.clock().now_ms()
    }
}

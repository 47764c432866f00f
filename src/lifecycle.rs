//! Lifecycle Module
//!
//! One-shot initialization that optionally creates the process cache.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::ProcessCache;
use crate::error::Result;

// == Init Options ==
/// Options for the first [`Lifecycle::initialize`] call.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Create the process cache during initialization
    pub preload: bool,
    /// Entries written into the freshly created cache, stored at their exact keys
    pub seed: Vec<(String, Value)>,
}

impl InitOptions {
    /// Options that create the cache.
    pub fn preload() -> Self {
        Self {
            preload: true,
            seed: Vec::new(),
        }
    }

    /// Options that only flip the initialized flag.
    pub fn lazy() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, key: impl Into<String>, value: Value) -> Self {
        self.seed.push((key.into(), value));
        self
    }
}

// == Init Outcome ==
/// What a [`Lifecycle::initialize`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Flag set and cache created
    Preloaded,
    /// Flag set, cache left absent
    FlagOnly,
    /// Already initialized, nothing done
    AlreadyInitialized,
}

// == Lifecycle ==
/// The process-wide `initialized` flag. Set once, never reset.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    initialized: bool,
    preload_delay: Duration,
}

impl Lifecycle {
    /// Creates an uninitialized lifecycle that waits `preload_delay` before creating the cache.
    pub fn new(preload_delay: Duration) -> Self {
        Self {
            initialized: false,
            preload_delay,
        }
    }

    /// Returns true once any initialize call has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Runs the first initialization; later calls return
    /// [`InitOutcome::AlreadyInitialized`] without touching `cache`.
    ///
    /// Without `preload` the flag is still set, so the cache stays absent
    /// for the rest of the process and every access reports
    /// `NotInitialized`.
    pub async fn initialize(
        &mut self,
        cache: &mut ProcessCache,
        options: InitOptions,
    ) -> Result<InitOutcome> {
        if self.initialized {
            debug!("initialize called again, ignoring");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let outcome = if options.preload {
            tokio::time::sleep(self.preload_delay).await;
            cache.create();
            let seeded = options.seed.len();
            for (key, value) in options.seed {
                cache.insert(key, value)?;
            }
            info!(seeded, "process cache preloaded");
            InitOutcome::Preloaded
        } else {
            info!("initialized without preload, process cache left absent");
            InitOutcome::FlagOnly
        };

        self.initialized = true;
        Ok(outcome)
    }
}

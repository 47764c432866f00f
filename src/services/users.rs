//! User Service
//!
//! Login tracking and profile lookups backed by the process cache.
//!
//! Writes go through the tag-composed key, reads use the key as given.
//! With the default empty tag list a record remembered under `user:1` lands
//! at `user:1used`, so [`UserService::get_user`] for the same id misses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::context::SharedCore;
use crate::error::{CoreError, Result};
use crate::helpers::{average_with, can_delete, normalize_users, HelperMode};
use crate::lifecycle::{InitOptions, InitOutcome};
use crate::models::{LoginRecord, PreparedUser, User, UserPatch, UserRecord};

/// Rate limit lane consulted by [`UserService::track_login`].
pub const LOGIN_LANE: &str = "login";

/// Cache key for the most recent login.
const LOGIN_KEY: &str = "login";

/// 30 days in milliseconds.
const ELIGIBILITY_WINDOW_MS: u64 = 2_592_000_000;
const MIN_ELIGIBLE_SCORES: usize = 3;
const MIN_ELIGIBLE_AVERAGE: f64 = 75.0;

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| CoreError::Internal(e.to_string()))
}

// == User Service ==
#[derive(Debug)]
pub struct UserService {
    core: SharedCore,
    helper_mode: HelperMode,
    login_attempts: AtomicU64,
    /// Side directory of records, separate from the process cache
    directory: RwLock<HashMap<String, UserRecord>>,
}

impl UserService {
    /// Creates the service and registers the login lane on `core`.
    pub async fn new(core: SharedCore) -> Self {
        let (limit, helper_mode) = {
            let guard = core.core.read().await;
            (guard.config().login_rate_limit, guard.config().helper_mode)
        };
        core.register_lane(LOGIN_LANE, limit).await;

        Self {
            core,
            helper_mode,
            login_attempts: AtomicU64::new(0),
            directory: RwLock::new(HashMap::new()),
        }
    }

    // == Boot ==
    pub async fn boot(&self, preload: bool) -> Result<InitOutcome> {
        let options = InitOptions {
            preload,
            ..InitOptions::default()
        };
        let outcome = self.core.initialize(options).await?;
        info!(?outcome, preload, "user service booted");
        Ok(outcome)
    }

    // == Logins ==
    /// Records a login for `user_id`, refused with `RateLimited` once the
    /// login lane is exhausted.
    pub async fn track_login(&self, user_id: &str) -> Result<()> {
        if !self.core.allow(LOGIN_LANE).await? {
            warn!(user_id, "login refused by rate limiter");
            return Err(CoreError::RateLimited(LOGIN_LANE.to_string()));
        }

        self.login_attempts.fetch_add(1, Ordering::SeqCst);
        let record = LoginRecord {
            user_id: user_id.to_string(),
            at: self.core.now_ms().await,
        };
        self.core.remember_untagged(LOGIN_KEY, to_value(&record)?).await
    }

    /// Logins that passed the rate limiter.
    pub fn login_attempts(&self) -> u64 {
        self.login_attempts.load(Ordering::SeqCst)
    }

    /// Timestamp of the last login stored at the plain `login` key.
    pub async fn last_login(&self) -> Result<u64> {
        let entry = self
            .core
            .read(LOGIN_KEY)
            .await?
            .ok_or_else(|| CoreError::NotFound(LOGIN_KEY.to_string()))?;
        Ok(entry.cast::<LoginRecord>()?.at)
    }

    // == Scores ==
    pub fn user_score(&self, record: &UserRecord) -> f64 {
        average_with(self.helper_mode, &record.scores)
    }

    /// At least three scores, average above 75, logged in within 30 days.
    pub async fn is_eligible(&self, record: &UserRecord) -> bool {
        let now = self.core.now_ms().await;
        record.scores.len() >= MIN_ELIGIBLE_SCORES
            && self.user_score(record) > MIN_ELIGIBLE_AVERAGE
            && now.saturating_sub(record.last_login.unwrap_or(0)) < ELIGIBILITY_WINDOW_MS
    }

    // == Permissions ==
    pub fn delete_user(&self, user: Option<&User>) -> Result<()> {
        if !can_delete(user) {
            return Err(CoreError::NotAllowed("delete user".to_string()));
        }
        Ok(())
    }

    /// Normalizes a batch of users and flags each one as prepared.
    pub fn prepare_users(&self, mut users: Vec<User>) -> Vec<PreparedUser> {
        normalize_users(&mut users);
        users
            .into_iter()
            .map(|user| PreparedUser {
                user,
                prepared: true,
            })
            .collect()
    }

    // == Profiles ==
    pub async fn register_user(&self, record: &UserRecord) -> Result<()> {
        self.core
            .remember_untagged(&user_key(&record.id), to_value(record)?)
            .await
    }

    pub async fn get_user(&self, id: &str) -> Result<UserRecord> {
        let key = user_key(id);
        let entry = self.core.read(&key).await?;
        entry.ok_or(CoreError::NotFound(key))?.cast()
    }

    /// Like [`UserService::get_user`] with every failure reported as `None`.
    pub async fn safe_get_user(&self, id: &str) -> Option<UserRecord> {
        let entry = self.core.read(&user_key(id)).await.ok()??;
        entry.cast().ok()
    }

    // == Directory ==
    pub async fn cache_user(&self, record: UserRecord) {
        self.directory.write().await.insert(record.id.clone(), record);
    }

    pub async fn update_cached_user(&self, id: &str, patch: UserPatch) -> Result<UserRecord> {
        let mut directory = self.directory.write().await;
        let record = directory
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        patch.apply(record);
        Ok(record.clone())
    }
}

//! User records
//!
//! Serialized with camelCase field names so cached values keep the shape the
//! site's front end writes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account role used by delete permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// An account with an optional role and free-form metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl User {
    pub fn new(id: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            id: id.into(),
            role,
            metadata: None,
        }
    }
}

/// Profile record with score history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub scores: Vec<f64>,
    /// Unix milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_scores(mut self, scores: Vec<f64>) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_last_login(mut self, at_ms: u64) -> Self {
        self.last_login = Some(at_ms);
        self
    }
}

/// Partial update applied to a cached [`UserRecord`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub scores: Option<Vec<f64>>,
    pub last_login: Option<u64>,
    pub email: Option<String>,
}

impl UserPatch {
    /// Overwrites every field the patch carries.
    pub fn apply(self, record: &mut UserRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(scores) = self.scores {
            record.scores = scores;
        }
        if let Some(at) = self.last_login {
            record.last_login = Some(at);
        }
        if let Some(email) = self.email {
            record.email = Some(email);
        }
    }
}

/// Value remembered on each tracked login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub user_id: String,
    /// Unix milliseconds
    pub at: u64,
}

/// A [`User`] after normalization, flagged for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedUser {
    #[serde(flatten)]
    pub user: User,
    pub prepared: bool,
}

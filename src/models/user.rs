//! Signed-in user and session models

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// An authenticated account as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account id (recorded as `owner_id` on listings)
    pub id: String,
    /// Email address, if the account has one
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Label for display
    pub fn label(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// A signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for API requests
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
    /// Unix timestamp (seconds) when the access token expires
    pub expires_at: i64,
    /// The signed-in account
    pub user: User,
}

/// Seconds before expiry at which a session counts as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

impl Session {
    /// Whether the access token is expired (or about to be)
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() + EXPIRY_MARGIN_SECS >= self.expires_at
    }
}

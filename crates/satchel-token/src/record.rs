//! Stored token records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A token as stored in the session.
///
/// Serialized as `{"token": ..., "time": ..., "lifetime": ...}` so it sits
/// in the session like any other record value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,

    /// Unix time of issue, in seconds.
    #[serde(rename = "time")]
    pub issued_at: i64,

    #[serde(rename = "lifetime")]
    pub lifetime_secs: u64,
}

impl TokenRecord {
    pub fn new(token: String, issued_at: i64, lifetime_secs: u64) -> Self {
        Self {
            token,
            issued_at,
            lifetime_secs,
        }
    }

    /// Decode a stored value; anything that is not a token record yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    /// Read only the `token` field of a stored value.
    pub fn token_of(value: &Value) -> Option<String> {
        value.get("token").and_then(Value::as_str).map(str::to_string)
    }

    pub fn to_value(&self) -> Value {
        json!({
            "token": self.token,
            "time": self.issued_at,
            "lifetime": self.lifetime_secs,
        })
    }

    /// First instant (unix seconds) at which the token no longer validates.
    pub fn expires_at(&self) -> i64 {
        let lifetime = i64::try_from(self.lifetime_secs).unwrap_or(i64::MAX);
        self.issued_at.saturating_add(lifetime)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at()
    }

    /// Seconds of validity left at `now`, zero once expired.
    pub fn remaining_secs(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at().saturating_sub(now)).unwrap_or(0)
    }

    /// Display information at `now`. Leaves the token value out.
    pub fn info(&self, now: i64) -> TokenInfo {
        TokenInfo {
            issued_at: DateTime::from_timestamp(self.issued_at, 0),
            lifetime_secs: self.lifetime_secs,
            expires_in_secs: self.remaining_secs(now),
            is_expired: self.is_expired(now),
        }
    }
}

/// Information about a stored token for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// `None` if the stored time is out of chrono's range.
    pub issued_at: Option<DateTime<Utc>>,
    pub lifetime_secs: u64,
    pub expires_in_secs: u64,
    pub is_expired: bool,
}

impl TokenInfo {
    pub fn expires_in_display(&self) -> String {
        if self.is_expired {
            "Expired".to_string()
        } else {
            let minutes = self.expires_in_secs / 60;
            let seconds = self.expires_in_secs % 60;
            format!("{}m {}s", minutes, seconds)
        }
    }
}

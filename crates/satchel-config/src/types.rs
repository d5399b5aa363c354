//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Namespace used when a caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "*";

/// Namespace reserved for token records.
pub const DEFAULT_TOKEN_NAMESPACE: &str = "-token-";

/// Token lifetime used when `create` is called without one (5 minutes).
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 300;

/// Random bytes per token. 32 bytes encode to 43 URL-safe characters.
pub const DEFAULT_TOKEN_ENTROPY_BYTES: usize = 32;

/// Smallest accepted entropy; 24 bytes encode to 32 characters.
pub const MIN_TOKEN_ENTROPY_BYTES: usize = 24;

// ─────────────────────────────────────────────────────────────────────────────
// Root Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Both sections are optional so that a layer only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatchelConfig {
    /// Namespaced store settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    /// Token manager settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenConfig>,
}

impl SatchelConfig {
    /// Create an empty config (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: SatchelConfig) {
        if other.session.is_some() {
            self.session = other.session;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
    }

    /// Effective session settings.
    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Effective token settings.
    pub fn token(&self) -> TokenConfig {
        self.token.clone().unwrap_or_default()
    }

    /// Check both sections, including rules that span them.
    pub fn validate(&self) -> Result<()> {
        let session = self.session();
        let token = self.token();
        session.validate()?;
        token.validate()?;

        if token.namespace == session.default_namespace {
            return Err(ConfigError::invalid(
                "token.namespace",
                format!(
                    "'{}' collides with session.default_namespace",
                    token.namespace
                ),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Namespaced store configuration.
///
/// ```toml
/// [session]
/// default_namespace = "*"
/// strict_start = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Namespace used by the unscoped operations.
    pub default_namespace: String,

    /// Fail `open` when the backend cannot start, instead of running
    /// detached over an empty store.
    pub strict_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            strict_start: false,
        }
    }
}

impl SessionConfig {
    /// Set the unscoped namespace.
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    /// Enable or disable strict start.
    pub fn with_strict_start(mut self, strict: bool) -> Self {
        self.strict_start = strict;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_namespace.is_empty() {
            return Err(ConfigError::invalid(
                "session.default_namespace",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Token manager configuration.
///
/// ```toml
/// [token]
/// namespace = "-token-"
/// default_lifetime_secs = 300
/// entropy_bytes = 32
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Namespace holding the token records.
    pub namespace: String,
    /// Lifetime applied by `create` when none is given.
    pub default_lifetime_secs: u64,
    /// Random bytes drawn per token.
    pub entropy_bytes: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_TOKEN_NAMESPACE.to_string(),
            default_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            entropy_bytes: DEFAULT_TOKEN_ENTROPY_BYTES,
        }
    }
}

impl TokenConfig {
    /// Set the reserved namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the default lifetime.
    pub fn with_default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime_secs = lifetime.as_secs();
        self
    }

    /// Set the entropy per token.
    pub fn with_entropy_bytes(mut self, bytes: usize) -> Self {
        self.entropy_bytes = bytes;
        self
    }

    /// Default lifetime as a `Duration`.
    pub fn default_lifetime(&self) -> Duration {
        Duration::from_secs(self.default_lifetime_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(ConfigError::invalid("token.namespace", "must not be empty"));
        }
        if self.default_lifetime_secs == 0 {
            return Err(ConfigError::invalid(
                "token.default_lifetime_secs",
                "must be greater than zero",
            ));
        }
        if self.entropy_bytes < MIN_TOKEN_ENTROPY_BYTES {
            return Err(ConfigError::invalid(
                "token.entropy_bytes",
                format!("must be at least {}", MIN_TOKEN_ENTROPY_BYTES),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

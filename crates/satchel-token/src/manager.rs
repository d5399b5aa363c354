//! Token manager over a reserved session namespace.

use std::time::Duration;

use satchel_config::TokenConfig;
use satchel_session::{NamespacedStore, SessionBackend};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::generate::{constant_time_eq, generate_token};
use crate::record::{TokenInfo, TokenRecord};

/// Creates, validates and deletes named tokens for one request.
///
/// Records live in the namespace named by [`TokenConfig::namespace`]
/// (`"-token-"` by default). The namespace is fixed for the manager's
/// lifetime; no operation takes a namespace argument.
pub struct TokenManager<'s, B: SessionBackend, C: Clock = SystemClock> {
    store: &'s mut NamespacedStore<B>,
    config: TokenConfig,
    clock: C,
}

impl<'s, B: SessionBackend> TokenManager<'s, B, SystemClock> {
    /// Token manager with default settings and the wall clock.
    pub fn new(store: &'s mut NamespacedStore<B>) -> Self {
        Self::with_config(store, TokenConfig::default(), SystemClock)
    }
}

impl<'s, B: SessionBackend, C: Clock> TokenManager<'s, B, C> {
    /// Token manager with explicit settings and time source.
    pub fn with_config(store: &'s mut NamespacedStore<B>, config: TokenConfig, clock: C) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// The reserved namespace.
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn store(&self) -> &NamespacedStore<B> {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut NamespacedStore<B> {
        &mut *self.store
    }

    /// Remove every token.
    pub fn clear(&mut self) {
        self.store.clear_in(&self.config.namespace);
        debug!(namespace = %self.config.namespace, "Tokens cleared");
    }

    /// Create a token with the default lifetime, replacing any previous
    /// token of the same name.
    pub fn create(&mut self, name: &str) -> String {
        let lifetime = self.config.default_lifetime();
        self.create_with_lifetime(name, lifetime)
    }

    /// Create a token valid for `lifetime`.
    ///
    /// Lifetimes are stored in whole seconds, rounded up, and never below
    /// one second, so the returned token always validates right away.
    pub fn create_with_lifetime(&mut self, name: &str, lifetime: Duration) -> String {
        let token = generate_token(self.config.entropy_bytes);
        let record = TokenRecord::new(token.clone(), self.clock.now(), lifetime_secs(lifetime));

        self.store.set_in(&self.config.namespace, name, record.to_value());
        debug!(name = %name, lifetime_secs = record.lifetime_secs, "Token created");

        token
    }

    /// The stored token string, without checking expiry.
    ///
    /// Only the `token` field is read, so a record with a damaged time or
    /// lifetime still yields its token here while failing validation.
    pub fn get(&self, name: &str) -> Option<String> {
        self.store
            .get_in(&self.config.namespace, name)
            .and_then(TokenRecord::token_of)
    }

    /// Whether anything is stored under `name`, expired or not.
    pub fn has(&self, name: &str) -> bool {
        self.store.has_in(&self.config.namespace, name)
    }

    /// Check a submitted token.
    ///
    /// Fails if no record exists or the record has expired; an expired
    /// token matches nothing, an empty submission included.
    pub fn is_valid(&self, name: &str, submitted: &str) -> bool {
        let Some(record) = self.record(name) else {
            trace!(name = %name, "No token to validate against");
            return false;
        };

        if record.is_expired(self.clock.now()) {
            debug!(name = %name, expired_at = record.expires_at(), "Token expired");
            return false;
        }

        constant_time_eq(submitted, &record.token)
    }

    /// Validate and, on success, delete the token so it cannot be replayed.
    ///
    /// A failed attempt leaves the stored token in place.
    pub fn consume(&mut self, name: &str, submitted: &str) -> bool {
        if !self.is_valid(name, submitted) {
            return false;
        }
        self.delete(name);
        true
    }

    /// Remove one token. The reserved namespace goes with the last token.
    pub fn delete(&mut self, name: &str) {
        self.store.delete_in(&self.config.namespace, name);
        debug!(name = %name, "Token deleted");
    }

    /// Expiry information for a token.
    pub fn info(&self, name: &str) -> Option<TokenInfo> {
        self.record(name).map(|r| r.info(self.clock.now()))
    }

    /// Delete every expired token and return how many were removed.
    ///
    /// Values under the namespace that are not token records are kept.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .store
            .get_all_in(&self.config.namespace)
            .iter()
            .filter(|(_, value)| {
                TokenRecord::from_value(value).is_some_and(|r| r.is_expired(now))
            })
            .map(|(name, _)| name.clone())
            .collect();

        for name in &expired {
            self.store.delete_in(&self.config.namespace, name);
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "Purged expired tokens");
        }
        expired.len()
    }

    fn record(&self, name: &str) -> Option<TokenRecord> {
        self.store
            .get_in(&self.config.namespace, name)
            .and_then(TokenRecord::from_value)
    }
}

/// Whole seconds covering `lifetime`, at least one.
fn lifetime_secs(lifetime: Duration) -> u64 {
    let secs = lifetime.as_secs() + u64::from(lifetime.subsec_nanos() > 0);
    secs.max(1)
}

//! Per-logger access tokens
//!
//! A token authorizes one (client, logger) pair for a bounded time. A
//! client holds at most one live token per logger; issuing a new one
//! replaces the old. Validation compares in constant time and judges
//! liveness against the request's receive time, never the dispatch-time
//! clock.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use subtle::ConstantTimeEq;

/// Length of generated token values
pub const TOKEN_LEN: usize = 24;

/// An issued access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    issued_at: u64,
    life: u64,
}

impl Token {
    /// The opaque token value handed to the client
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Epoch seconds of issuance
    #[inline]
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    /// Lifetime in seconds; 0 means non-expiring
    #[inline]
    pub fn life(&self) -> u64 {
        self.life
    }

    /// Whether the token covers the given instant
    ///
    /// The boundary is exclusive: a token of life 60 issued at 0 is
    /// dead at 60 and alive at 59.
    #[inline]
    pub fn is_valid(&self, now: u64) -> bool {
        self.life == 0 || self.issued_at + self.life > now
    }
}

/// Store of live tokens keyed by (client id, logger id)
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: RwLock<HashMap<(String, String), Token>>,
}

impl TokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a (client, logger) pair
    ///
    /// Replaces any prior entry for the same pair; latest wins.
    pub fn issue(&self, client_id: &str, logger_id: &str, life: u64, now: u64) -> Token {
        let token = Token {
            value: generate_token_value(),
            issued_at: now,
            life,
        };
        self.inner.write().insert(
            (client_id.to_string(), logger_id.to_string()),
            token.clone(),
        );
        token
    }

    /// Validate a presented token value
    ///
    /// True iff an entry exists for the pair, the stored value matches
    /// by constant-time compare, and the token is alive at `now`.
    pub fn validate(&self, client_id: &str, logger_id: &str, value: &str, now: u64) -> bool {
        let inner = self.inner.read();
        let Some(token) = inner.get(&(client_id.to_string(), logger_id.to_string())) else {
            return false;
        };
        let matches = bool::from(token.value.as_bytes().ct_eq(value.as_bytes()));
        matches && token.is_valid(now)
    }

    /// Drop every token held by a client (used on eviction)
    pub fn revoke_client(&self, client_id: &str) -> usize {
        let mut inner = self.inner.write();
        let before = inner.len();
        inner.retain(|(cid, _), _| cid != client_id);
        before - inner.len()
    }

    /// Remove tokens that are dead at `now`; returns how many
    pub fn sweep_expired(&self, now: u64) -> usize {
        let mut inner = self.inner.write();
        let before = inner.len();
        inner.retain(|_, token| token.is_valid(now));
        before - inner.len()
    }

    /// Number of live entries
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Generate a random token value
fn generate_token_value() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let store = TokenStore::new();
        let token = store.issue("c1", "app", 300, 1050);

        assert!(store.validate("c1", "app", token.value(), 1100));
        assert!(!store.validate("c1", "app", "wrong-value", 1100));
        assert!(!store.validate("c1", "other", token.value(), 1100));
        assert!(!store.validate("c2", "app", token.value(), 1100));
    }

    #[test]
    fn test_expiry_boundary() {
        let store = TokenStore::new();
        let token = store.issue("c1", "app", 60, 0);

        assert!(store.validate("c1", "app", token.value(), 59));
        // Exactly at issued_at + life the token is dead
        assert!(!store.validate("c1", "app", token.value(), 60));
    }

    #[test]
    fn test_zero_life_never_expires() {
        let store = TokenStore::new();
        let token = store.issue("c1", "app", 0, 0);
        assert!(store.validate("c1", "app", token.value(), u64::MAX));
    }

    #[test]
    fn test_reissue_latest_wins() {
        let store = TokenStore::new();
        let first = store.issue("c1", "app", 300, 1000);
        let second = store.issue("c1", "app", 300, 1001);

        assert!(!store.validate("c1", "app", first.value(), 1100));
        assert!(store.validate("c1", "app", second.value(), 1100));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sweep_expired() {
        let store = TokenStore::new();
        store.issue("c1", "app", 60, 0);
        store.issue("c1", "db", 600, 0);
        store.issue("c2", "app", 0, 0);

        assert_eq!(store.sweep_expired(100), 1);
        assert_eq!(store.len(), 2);
        // Idempotent at the same instant
        assert_eq!(store.sweep_expired(100), 0);
    }

    #[test]
    fn test_revoke_client() {
        let store = TokenStore::new();
        store.issue("c1", "app", 300, 0);
        store.issue("c1", "db", 300, 0);
        let survivor = store.issue("c2", "app", 300, 0);

        assert_eq!(store.revoke_client("c1"), 2);
        assert_eq!(store.len(), 1);
        assert!(store.validate("c2", "app", survivor.value(), 10));
    }

    #[test]
    fn test_token_values_are_random() {
        let store = TokenStore::new();
        let a = store.issue("c1", "app", 300, 0);
        let b = store.issue("c2", "app", 300, 0);
        assert_eq!(a.value().len(), TOKEN_LEN);
        assert_ne!(a.value(), b.value());
    }
}

//! Client sessions
//!
//! A `Client` is one authenticated remote log source: an opaque id, the
//! RSA public key it presented at CONNECT, the session key generated
//! for it, and a lease (`date_created` + `age`).
//!
//! The registry hands out `Arc<Client>` snapshots. A snapshot held
//! across an integrity sweep may describe an evicted session; holders
//! that straddle a sweep must re-resolve by id before trusting it
//! again.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use residue_crypto::{RsaPublicKey, SymmetricKey};

/// Length of generated client ids
pub const CLIENT_ID_LEN: usize = 16;

/// An authenticated remote log source
#[derive(Debug, Clone)]
pub struct Client {
    id: String,
    rsa_public_key: RsaPublicKey,
    symmetric_key: SymmetricKey,
    date_created: u64,
    age: u64,
    is_known: bool,
    user: Option<String>,
}

impl Client {
    /// Create a session record
    pub fn new(
        id: impl Into<String>,
        rsa_public_key: RsaPublicKey,
        symmetric_key: SymmetricKey,
        date_created: u64,
        age: u64,
        is_known: bool,
    ) -> Self {
        Self {
            id: id.into(),
            rsa_public_key,
            symmetric_key,
            date_created,
            age,
            is_known,
            user: None,
        }
    }

    /// Attach the user identity configured for a known client
    #[must_use]
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    /// User identity from configuration, if any
    #[inline]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Session id
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The RSA public key presented at CONNECT
    #[inline]
    pub fn rsa_public_key(&self) -> &RsaPublicKey {
        &self.rsa_public_key
    }

    /// The AES session key
    #[inline]
    pub fn symmetric_key(&self) -> &SymmetricKey {
        &self.symmetric_key
    }

    /// Epoch seconds the lease started
    #[inline]
    pub fn date_created(&self) -> u64 {
        self.date_created
    }

    /// Lease length in seconds; 0 means the client never expires
    #[inline]
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Whether the client id is declared in configuration
    #[inline]
    pub fn is_known(&self) -> bool {
        self.is_known
    }

    /// Whether the lease covers the given instant
    ///
    /// The boundary is exclusive: a request received exactly at
    /// `date_created + age` finds the client dead.
    #[inline]
    pub fn is_alive(&self, now: u64) -> bool {
        self.age == 0 || self.date_created + self.age > now
    }
}

/// Generate a random session id
pub fn generate_client_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CLIENT_ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Default)]
struct RegistryInner {
    clients: HashMap<String, Arc<Client>>,
    /// Bumped on every write so long-lived readers can detect churn
    generation: u64,
}

/// In-memory map of live client sessions
///
/// Readers many, writers few: connection handlers add sessions, the
/// integrity task sweeps them. A write-preferred rw-lock covers both.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    inner: RwLock<RegistryInner>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a session; returns the stored snapshot
    pub fn add(&self, client: Client) -> Arc<Client> {
        let client = Arc::new(client);
        let mut inner = self.inner.write();
        inner.generation += 1;
        inner
            .clients
            .insert(client.id().to_string(), Arc::clone(&client));
        client
    }

    /// Look up a session by id
    #[inline]
    pub fn find(&self, client_id: &str) -> Option<Arc<Client>> {
        self.inner.read().clients.get(client_id).cloned()
    }

    /// Explicit unregister; returns the removed snapshot
    pub fn remove(&self, client_id: &str) -> Option<Arc<Client>> {
        let mut inner = self.inner.write();
        let removed = inner.clients.remove(client_id);
        if removed.is_some() {
            inner.generation += 1;
        }
        removed
    }

    /// Restart a session's lease; returns the refreshed snapshot
    pub fn touch(&self, client_id: &str, now: u64) -> Option<Arc<Client>> {
        let mut inner = self.inner.write();
        let entry = inner.clients.get_mut(client_id)?;
        let refreshed = Arc::new(Client {
            date_created: now,
            ..(**entry).clone()
        });
        *entry = Arc::clone(&refreshed);
        inner.generation += 1;
        Some(refreshed)
    }

    /// Remove sessions whose lease has elapsed at `now`
    ///
    /// Returns the removed ids so callers can drop dependent state
    /// (tokens). Idempotent: a second sweep at the same instant removes
    /// nothing.
    pub fn sweep(&self, now: u64) -> Vec<String> {
        let mut inner = self.inner.write();
        let dead: Vec<String> = inner
            .clients
            .values()
            .filter(|c| !c.is_alive(now))
            .map(|c| c.id().to_string())
            .collect();
        for id in &dead {
            inner.clients.remove(id);
        }
        if !dead.is_empty() {
            inner.generation += 1;
        }
        dead
    }

    /// Number of live sessions
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.read().clients.len()
    }

    /// Whether the registry is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.read().clients.is_empty()
    }

    /// Write-generation counter
    #[inline]
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }
}

//! Client integrity task
//!
//! Periodically evicts expired clients and tokens, then advances the
//! execution clock. Dispatchers compare their last client validation
//! against [`IntegrityClock::last_execution`] to detect that a retained
//! client snapshot may be stale and must be re-resolved by id.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::ServerState;
use crate::util::epoch_now;

/// Epoch seconds of the task's last completed sweep
#[derive(Debug, Default)]
pub struct IntegrityClock(AtomicU64);

impl IntegrityClock {
    /// When the task last completed; 0 means it has never run
    #[inline]
    pub fn last_execution(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Record a completed sweep
    #[inline]
    pub fn record_execution(&self, now: u64) {
        self.0.store(now, Ordering::Release);
    }
}

/// Result of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Clients evicted
    pub clients_removed: usize,
    /// Tokens dropped (eviction plus expiry)
    pub tokens_removed: usize,
}

/// Run one sweep at the given instant
///
/// Evicting a client also revokes its tokens; expired tokens of live
/// clients are swept independently. The execution clock advances last,
/// after the registry lock is released.
pub fn run_once(state: &ServerState, now: u64) -> SweepStats {
    let removed = state.registry.sweep(now);
    let mut tokens_removed = 0;
    for client_id in &removed {
        tokens_removed += state.tokens.revoke_client(client_id);
    }
    tokens_removed += state.tokens.sweep_expired(now);

    state.integrity.record_execution(now);

    let stats = SweepStats {
        clients_removed: removed.len(),
        tokens_removed,
    };
    if stats.clients_removed > 0 || stats.tokens_removed > 0 {
        info!(
            clients_removed = stats.clients_removed,
            tokens_removed = stats.tokens_removed,
            "integrity sweep evicted expired state"
        );
    } else {
        debug!("integrity sweep found nothing to evict");
    }
    stats
}

/// Spawn the periodic integrity task
pub fn spawn(state: Arc<ServerState>, cancel: CancellationToken) -> JoinHandle<()> {
    let interval = state.config.client_integrity_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The immediate first tick would sweep an empty registry
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    run_once(&state, epoch_now());
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "integrity_test.rs"]
mod tests;

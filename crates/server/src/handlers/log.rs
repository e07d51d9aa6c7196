//! Log ingestion handler and dispatch worker
//!
//! The session side is deliberately thin: a framed log payload is
//! acknowledged with STATUS_OK and pushed into the dual-buffer queue
//! still encrypted, so the client never waits on decryption or
//! validation. A single background dispatch task drains the queue in
//! rounds and drives each record through decode, client resolution,
//! policy and the sink.
//!
//! # Bulk re-validation
//!
//! Bulk processing amortizes one client resolution over many items by
//! caching the resolved session. The integrity task may evict that
//! session between items; the loop detects this by comparing its last
//! validation time against the task's execution clock and forces an
//! id-based re-resolution. A session snapshot obtained before the last
//! sweep is never trusted again without that re-resolution.
//!
//! # One dispatch task
//!
//! There is exactly one dispatch task per queue. Client-observed
//! latency is dominated by the enqueue, not the dispatch; a second
//! dispatcher would require holding the producer lock across the whole
//! drain loop, stalling sessions for longer than the extra thread could
//! ever win back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use residue_auth::Client;
use residue_protocol::{LogPayload, LogRequest, RawRequest};
use residue_sinks::{LogSink, RecordContext};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::handlers::{FrameHandler, FrameOutcome};
use crate::policy;
use crate::queue::DualBufferQueue;
use crate::state::ServerState;
use crate::util::epoch_now;

/// Dispatch pipeline metrics
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Frames accepted and queued
    pub frames_enqueued: AtomicU64,

    /// Records written to the sink
    pub records_dispatched: AtomicU64,

    /// Records dropped by resolution or policy
    pub records_rejected: AtomicU64,

    /// Payloads dropped at decode (bad frame, unknown client, bad key)
    pub decode_failures: AtomicU64,

    /// Payloads dropped at parse (not JSON, invalid single record)
    pub invalid_payloads: AtomicU64,

    /// Bulks truncated at the item cap
    pub bulk_overflows: AtomicU64,

    /// Validated records lost to a sink write failure
    pub sink_errors: AtomicU64,
}

impl DispatchMetrics {
    #[inline]
    fn frame_enqueued(&self) {
        self.frames_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_dispatched(&self) {
        self.records_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn invalid_payload(&self) {
        self.invalid_payloads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn bulk_overflow(&self) {
        self.bulk_overflows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            frames_enqueued: self.frames_enqueued.load(Ordering::Relaxed),
            records_dispatched: self.records_dispatched.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            invalid_payloads: self.invalid_payloads.load(Ordering::Relaxed),
            bulk_overflows: self.bulk_overflows.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of dispatch metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchSnapshot {
    pub frames_enqueued: u64,
    pub records_dispatched: u64,
    pub records_rejected: u64,
    pub decode_failures: u64,
    pub invalid_payloads: u64,
    pub bulk_overflows: u64,
    pub sink_errors: u64,
}

/// Handler for the logging endpoint plus its dispatch worker
pub struct LogRequestHandler {
    state: Arc<ServerState>,
    queue: DualBufferQueue<RawRequest>,
    sink: Arc<dyn LogSink>,
    metrics: DispatchMetrics,
    stopped: AtomicBool,
}

impl LogRequestHandler {
    /// Create the handler
    pub fn new(state: Arc<ServerState>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            state,
            queue: DualBufferQueue::new(),
            sink,
            metrics: DispatchMetrics::default(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Items currently waiting on the producer side
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Ask the dispatcher to stop between items
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Spawn the single dispatch worker
    ///
    /// The loop runs one drain round, then sleeps `poll_interval` (or
    /// returns on cancellation). Items still queued at shutdown are
    /// dropped; redelivery is the client's responsibility.
    pub fn spawn_dispatcher(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let handler = Arc::clone(self);
        tokio::spawn(async move {
            info!("log dispatcher started");
            let poll_interval = handler.state.config.server.poll_interval;
            loop {
                handler.drain_round().await;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
                if handler.stopped.load(Ordering::Relaxed) {
                    break;
                }
            }
            handler.stopped.store(true, Ordering::Relaxed);
            info!("log dispatcher stopped");
        })
    }

    /// Run one drain round
    ///
    /// Records the drain length once, pulls exactly that many items,
    /// flushes the sink and switches the queue context. Items pushed
    /// while the round runs wait for the next round.
    pub async fn drain_round(&self) {
        let total = self.queue.drain_len();
        let dispatch_delay = self.state.config.dispatch_delay;

        for _ in 0..total {
            if self.stopped.load(Ordering::Relaxed) {
                break;
            }
            if !dispatch_delay.is_zero() {
                tokio::time::sleep(dispatch_delay).await;
            }
            let Some(raw) = self.queue.pull() else { break };
            self.process_raw(&raw);
        }

        if total > 0
            && let Err(e) = self.sink.flush()
        {
            error!(error = %e, "sink flush failed");
        }

        self.queue.switch_context();
    }

    /// Decode one raw payload and run its records through the pipeline
    fn process_raw(&self, raw: &RawRequest) {
        let (envelope_client, plaintext) =
            match codec::decode_log_payload(&self.state, &raw.payload) {
                Ok(decoded) => decoded,
                Err(e) => {
                    self.metrics.decode_failure();
                    error!(error = %e, ip = %raw.ip_addr, "failed to decode log payload");
                    return;
                }
            };

        let payload = match LogPayload::parse(&plaintext) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.invalid_payload();
                error!(error = %e, ip = %raw.ip_addr, "failed to parse log payload");
                return;
            }
        };

        match payload {
            LogPayload::Single(mut request) => {
                request.set_envelope(&raw.ip_addr, raw.date_received);
                if let Some(client) = &envelope_client {
                    request.client_id = client.id().to_string();
                }
                self.process_request(&mut request, envelope_client.as_ref(), None, true);
            }
            LogPayload::Bulk(items) => {
                if !self.state.config.allow_bulk_log_request {
                    error!(ip = %raw.ip_addr, "bulk log requests are not allowed");
                    return;
                }
                self.process_bulk(&items, envelope_client, raw);
            }
        }
    }

    /// Process a bulk, re-validating the cached client across
    /// integrity sweeps
    fn process_bulk(
        &self,
        items: &[Value],
        envelope_client: Option<Arc<Client>>,
        raw: &RawRequest,
    ) {
        let max_items = self.state.config.max_items_in_bulk;
        let mut item_count = 0usize;
        let mut last_client_validation = epoch_now();
        let mut last_known_client_id = envelope_client
            .as_ref()
            .map(|c| c.id().to_string())
            .unwrap_or_default();
        let mut current_client = envelope_client;
        let mut force_client_validation = true;

        for value in items {
            if item_count == max_items {
                self.metrics.bulk_overflow();
                error!(
                    max_items,
                    "maximum number of bulk items reached, ignoring the rest"
                );
                break;
            }

            let mut item = match LogRequest::from_value(value) {
                Ok(item) => item,
                Err(e) => {
                    error!(error = %e, "invalid request in bulk");
                    continue;
                }
            };
            item.set_envelope(&raw.ip_addr, raw.date_received);

            // The integrity task ran since our last validation: the
            // cached session may be gone. Drop it and make this item
            // re-resolve by the last id that worked.
            if !force_client_validation
                && self.state.integrity.last_execution() >= last_client_validation
            {
                info!(
                    client_id = %last_known_client_id,
                    "re-forcing client validation after integrity sweep"
                );
                force_client_validation = true;
                current_client = None;
                item.client_id = last_known_client_id.clone();
                last_client_validation = epoch_now();
            }

            if self.process_request(
                &mut item,
                None,
                Some(&mut current_client),
                force_client_validation,
            ) {
                last_known_client_id = current_client
                    .as_ref()
                    .map(|c| c.id().to_string())
                    .unwrap_or_default();
                force_client_validation = false;
            } else {
                force_client_validation = true;
            }
            item_count += 1;
        }
    }

    /// Resolve the client for one record, run the checks and dispatch
    ///
    /// `bypass_checks` holds when a cached client from an earlier bulk
    /// item is still trusted: aliveness and policy were already
    /// established for this (client, bulk) and are not repeated.
    fn process_request(
        &self,
        request: &mut LogRequest,
        envelope_client: Option<&Arc<Client>>,
        cache: Option<&mut Option<Arc<Client>>>,
        force_check: bool,
    ) -> bool {
        let config = &self.state.config;

        let cached_client: Option<Arc<Client>> = cache.as_ref().and_then(|c| (**c).clone());
        let bypass_checks = !force_check && cached_client.is_some();
        let mut client = cached_client.or_else(|| envelope_client.cloned());

        if client.is_none() {
            let logger_known = config.access.is_known_logger(&request.logger_id);
            let plain_allowed_for_logger = config.access.logger_allows_plain(&request.logger_id)
                || (!logger_known && config.allow_unknown_loggers);

            if config.allow_plain_log_request
                && plain_allowed_for_logger
                && !request.client_id.is_empty()
            {
                client = self.state.registry.find(&request.client_id);
            } else if request.client_id.is_empty() {
                warn!(logger = %request.logger_id, "invalid request, no client id found");
            }
        }

        if let Some(cache) = cache {
            *cache = client.clone();
        }

        let Some(client) = client else {
            warn!(
                client_id = %request.client_id,
                logger = %request.logger_id,
                "invalid request, no client found"
            );
            if config.allow_plain_log_request {
                debug!(
                    "check that the logger allows plain requests and the payload carries a client id"
                );
            }
            self.metrics.record_rejected();
            return false;
        };

        if !bypass_checks && !client.is_alive(request.date_received) {
            warn!(client_id = %client.id(), "client is dead");
            debug!(
                date_received = request.date_received,
                date_created = client.date_created(),
                age = client.age(),
                "lease arithmetic for dead client"
            );
            self.metrics.record_rejected();
            return false;
        }

        request.client_id = client.id().to_string();

        // A known client vouches for the unknown loggers it creates
        if !bypass_checks
            && client.is_known()
            && config.allow_unknown_loggers
            && !config.access.is_known_logger(&request.logger_id)
            && let Some(user) = client.user()
        {
            self.state
                .attach_unknown_logger_user(&request.logger_id, user);
        }

        if !bypass_checks && !policy::is_allowed(&self.state, request) {
            self.metrics.record_rejected();
            return false;
        }

        self.dispatch(request)
    }

    /// Emit one validated record with its dispatch context bound
    fn dispatch(&self, request: &LogRequest) -> bool {
        let record = RecordContext {
            request,
            client_id: &request.client_id,
            ip_addr: &request.ip_addr,
        };
        match self.sink.write(&record) {
            Ok(()) => {
                self.metrics.record_dispatched();
                true
            }
            Err(e) => {
                // The record was valid; only the storage failed
                self.metrics.sink_error();
                error!(error = %e, logger = %request.logger_id, "sink write failed");
                true
            }
        }
    }
}

#[async_trait]
impl FrameHandler for LogRequestHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    /// Acknowledge and enqueue; all processing happens off-session
    async fn on_frame(&self, payload: Bytes, peer_ip: &str, date_received: u64) -> FrameOutcome {
        self.metrics.frame_enqueued();
        self.queue.push(RawRequest {
            payload,
            ip_addr: peer_ip.to_string(),
            date_received,
        });
        FrameOutcome::ok()
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod tests;

//! TCP endpoints and session I/O
//!
//! Each endpoint owns one listener and spawns a task per connection. A
//! session reads length-prefixed frames, stamps the envelope metadata
//! (peer address, receive time), hands the payload to the endpoint's
//! handler and immediately writes the status line back. Framing errors
//! close the session after a BAD_REQUEST.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use residue_protocol::{FrameCodec, StatusCode};
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, ServerError};
use crate::handlers::FrameHandler;
use crate::util::epoch_now;

/// Endpoint transport settings
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Endpoint name (connect, token, logging)
    pub name: &'static str,

    /// Bind address, e.g. "0.0.0.0:8779"
    pub bind_addr: String,

    /// Read buffer size per connection
    pub buffer_size: usize,

    /// Enable TCP_NODELAY
    pub no_delay: bool,

    /// Enable TCP keepalive
    pub keepalive: bool,
}

/// Session metrics for one endpoint
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// Currently open connections
    pub connections_active: AtomicU64,

    /// Connections accepted since start
    pub connections_total: AtomicU64,

    /// Complete frames read
    pub frames_received: AtomicU64,

    /// Payload bytes read
    pub bytes_received: AtomicU64,

    /// Sessions closed for framing errors
    pub bad_frames: AtomicU64,
}

impl SessionMetrics {
    #[inline]
    fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    fn frame_received(&self, bytes: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    fn bad_frame(&self) {
        self.bad_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> SessionMetricsSnapshot {
        SessionMetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bad_frames: self.bad_frames.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of session metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub bad_frames: u64,
}

/// One bound TCP endpoint
pub struct Endpoint {
    config: EndpointConfig,
    codec: FrameCodec,
    handler: Arc<dyn FrameHandler>,
    metrics: Arc<SessionMetrics>,
    listener: TcpListener,
}

impl Endpoint {
    /// Bind the listener
    pub async fn bind(
        config: EndpointConfig,
        codec: FrameCodec,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| ServerError::Bind {
                name: config.name,
                addr: config.bind_addr.clone(),
                source: e,
            })?;

        Ok(Self {
            config,
            codec,
            handler,
            metrics: Arc::new(SessionMetrics::default()),
            listener,
        })
    }

    /// The actual bound address (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to this endpoint's metrics
    pub fn metrics(&self) -> Arc<SessionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Accept connections until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(
            endpoint = self.config.name,
            address = %self.local_addr()?,
            "endpoint listening"
        );

        let endpoint = Arc::new(self);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = endpoint.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            endpoint.metrics.connection_opened();
                            let endpoint = Arc::clone(&endpoint);
                            tokio::spawn(async move {
                                if let Err(e) = endpoint.handle_connection(stream, peer_addr).await
                                    && e.kind() != std::io::ErrorKind::UnexpectedEof
                                {
                                    tracing::debug!(
                                        endpoint = endpoint.config.name,
                                        peer = %peer_addr,
                                        error = %e,
                                        "session error"
                                    );
                                }
                                endpoint.metrics.connection_closed();
                            });
                        }
                        Err(e) => {
                            // Transient accept errors - log and continue
                            tracing::warn!(endpoint = endpoint.config.name, error = %e, "accept error");
                        }
                    }
                }
            }
        }

        tracing::info!(endpoint = endpoint.config.name, "endpoint stopped");
        Ok(())
    }

    /// Drive one session: read frames, respond, loop until EOF
    async fn handle_connection(
        &self,
        mut stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> std::io::Result<()> {
        self.configure_socket(&stream);

        let peer_ip = peer_addr.ip().to_string();
        let mut buf = BytesMut::with_capacity(self.config.buffer_size);

        loop {
            if stream.read_buf(&mut buf).await? == 0 {
                return Ok(());
            }

            // Process every complete frame in the buffer
            loop {
                match self.codec.peek(&buf) {
                    Ok(Some(frame)) => {
                        let payload =
                            Bytes::copy_from_slice(&buf[frame.payload_start..frame.end()]);
                        buf.advance(frame.end());
                        self.metrics.frame_received(payload.len() as u64);

                        let outcome = self
                            .handler
                            .on_frame(payload, &peer_ip, epoch_now())
                            .await;

                        stream.write_all(&outcome.status.wire_line()).await?;
                        if let Some(body) = &outcome.body {
                            stream.write_all(body).await?;
                            stream.write_all(b"\r\n").await?;
                        }
                        if outcome.close {
                            return Ok(());
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        self.metrics.bad_frame();
                        tracing::debug!(
                            endpoint = self.config.name,
                            peer = %peer_ip,
                            error = %e,
                            "bad frame, closing session"
                        );
                        let _ = stream.write_all(&StatusCode::BadRequest.wire_line()).await;
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Apply low-level socket options not exposed by tokio
    fn configure_socket(&self, stream: &TcpStream) {
        let socket = SockRef::from(stream);

        if self.config.no_delay && socket.set_nodelay(true).is_err() {
            tracing::debug!("failed to set TCP_NODELAY");
        }

        if self.config.keepalive {
            let keepalive = TcpKeepalive::new()
                .with_time(Duration::from_secs(60))
                .with_interval(Duration::from_secs(10));
            if let Err(e) = socket.set_tcp_keepalive(&keepalive) {
                tracing::debug!(error = %e, "failed to set TCP keepalive");
            }
        }
    }
}

// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervised WebSocket client with automatic reconnection.
//!
//! A single supervisor task owns the connection lifecycle: connect, run
//! until the connection dies, back off, reconnect. Retries continue
//! forever until [`PushChannel::disconnect`] cancels the supervisor.
//! Outbound sends while disconnected fail immediately; nothing is queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vitrine_config::ChannelConfig;
use vitrine_core::{now_ms, ConnectionState, StateChange, VitrineError};

use crate::backoff::ReconnectBackoff;
use crate::events::{
    HandlerRegistry, SubscriptionId, WireFrame, EVENT_PING, EVENT_PONG, EVENT_STATE_CHANGE,
};

/// Handle to the push channel. Cheap to clone; all clones share one
/// connection and one handler registry.
#[derive(Clone)]
pub struct PushChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    url: String,
    heartbeat_interval: Duration,
    reconnect_initial: Duration,
    reconnect_max: Duration,
    backoff_multiplier: f64,
    state: RwLock<ConnectionState>,
    registry: HandlerRegistry,
    outbound: Mutex<Option<mpsc::UnboundedSender<WireFrame>>>,
    supervisor: Mutex<Option<SupervisorHandle>>,
    shutting_down: AtomicBool,
}

struct SupervisorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PushChannel {
    pub fn new(ws_url: &str, config: &ChannelConfig) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                url: ws_url.to_string(),
                heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
                reconnect_initial: Duration::from_millis(config.reconnect_initial_delay_ms),
                reconnect_max: Duration::from_secs(config.reconnect_max_delay_secs),
                backoff_multiplier: config.backoff_multiplier,
                state: RwLock::new(ConnectionState::Disconnected),
                registry: HandlerRegistry::new(),
                outbound: Mutex::new(None),
                supervisor: Mutex::new(None),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Register a handler for the named event. `state:change` handlers see
    /// a [`StateChange`] payload; everything else sees the frame's `data`.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.registry.subscribe(event, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.registry.unsubscribe(id);
    }

    /// Send a frame now. Fails if the channel is not connected; frames are
    /// never queued for later delivery.
    pub fn send(&self, event: &str, data: Value) -> Result<(), VitrineError> {
        if self.state() != ConnectionState::Connected {
            return Err(VitrineError::Channel {
                message: format!("cannot send '{event}': channel is not connected"),
                source: None,
            });
        }
        let sender = lock(&self.inner.outbound).clone();
        match sender {
            Some(sender) => sender
                .send(WireFrame::new(event, data))
                .map_err(|e| VitrineError::Channel {
                    message: format!("cannot send '{event}': connection task gone: {e}"),
                    source: None,
                }),
            None => Err(VitrineError::Channel {
                message: format!("cannot send '{event}': channel is not connected"),
                source: None,
            }),
        }
    }

    /// Start the connection supervisor and wait for the first attempt.
    ///
    /// Returns the outcome of the initial connect. On failure the
    /// supervisor stays alive and keeps retrying with backoff, so an `Err`
    /// here does not mean the channel gave up.
    pub async fn connect(&self) -> Result<(), VitrineError> {
        self.inner.shutting_down.store(false, Ordering::SeqCst);
        let rx = {
            let mut guard = lock(&self.inner.supervisor);
            if let Some(handle) = guard.as_ref() {
                if !handle.task.is_finished() {
                    debug!("connect: supervisor already running");
                    return Ok(());
                }
            }
            let cancel = CancellationToken::new();
            let (tx, rx) = oneshot::channel();
            let task = tokio::spawn(supervise(Arc::clone(&self.inner), cancel.clone(), tx));
            *guard = Some(SupervisorHandle { cancel, task });
            rx
        };
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(VitrineError::Channel {
                message: "supervisor exited before the first connection attempt".into(),
                source: None,
            }),
        }
    }

    /// Stop the supervisor and close the connection. No further reconnect
    /// attempts happen until `connect` is called again.
    pub async fn disconnect(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        let handle = lock(&self.inner.supervisor).take();
        if let Some(handle) = handle {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }
        self.inner.set_state(ConnectionState::Disconnected);
    }
}

impl ChannelInner {
    /// Transition the connection state, dispatching a synthetic
    /// `state:change` event when the value actually changes.
    fn set_state(&self, new: ConnectionState) {
        let old = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let old = *guard;
            *guard = new;
            old
        };
        if old != new {
            info!(old = %old, new = %new, "channel state changed");
            if let Ok(payload) = serde_json::to_value(StateChange { old, new }) {
                self.registry.dispatch(EVENT_STATE_CHANGE, &payload);
            }
        }
    }

    fn clear_outbound(&self) {
        *lock(&self.outbound) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connection supervisor: connect, run, back off, repeat. Runs until
/// cancelled. The first-attempt result is reported through `first`.
async fn supervise(
    inner: Arc<ChannelInner>,
    cancel: CancellationToken,
    first: oneshot::Sender<Result<(), VitrineError>>,
) {
    let mut backoff = ReconnectBackoff::new(
        inner.reconnect_initial,
        inner.reconnect_max,
        inner.backoff_multiplier,
    );
    let mut first = Some(first);

    loop {
        if cancel.is_cancelled() {
            break;
        }
        inner.set_state(ConnectionState::Connecting);

        match connect_async(&inner.url).await {
            Ok((stream, _response)) => {
                backoff.reset();
                if let Some(tx) = first.take() {
                    let _ = tx.send(Ok(()));
                }
                inner.set_state(ConnectionState::Connected);
                let reason = run_connection(&inner, stream, &cancel).await;
                inner.clear_outbound();
                inner.set_state(ConnectionState::Disconnected);
                if cancel.is_cancelled() {
                    break;
                }
                warn!(reason, "push channel connection ended");
            }
            Err(e) => {
                warn!(url = %inner.url, error = %e, "push channel connect failed");
                if let Some(tx) = first.take() {
                    let _ = tx.send(Err(VitrineError::Channel {
                        message: format!("connect to {} failed: {e}", inner.url),
                        source: Some(Box::new(e)),
                    }));
                }
                inner.set_state(ConnectionState::Error);
            }
        }

        let delay = backoff.next_delay();
        debug!(delay_ms = delay.as_millis() as u64, attempt = backoff.attempt(), "scheduling reconnect");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    inner.clear_outbound();
    inner.set_state(ConnectionState::Disconnected);
}

/// Drive one live connection until it dies. Returns a short reason string
/// for logging.
async fn run_connection(
    inner: &ChannelInner,
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    cancel: &CancellationToken,
) -> &'static str {
    let (mut sink, mut reader) = stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WireFrame>();
    *lock(&inner.outbound) = Some(tx);

    let mut heartbeat = tokio::time::interval(inner.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately and doubles as the opening ping.
    let liveness_limit = inner.heartbeat_interval * 2;
    let mut last_pong = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return "cancelled";
            }

            frame = rx.recv() => {
                let Some(frame) = frame else {
                    return "outbound queue closed";
                };
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(event = %frame.event, error = %e, "dropping unserializable frame");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!(error = %e, "send failed");
                    return "send failed";
                }
            }

            _ = heartbeat.tick() => {
                if last_pong.elapsed() >= liveness_limit {
                    // Two intervals without a pong: the socket is silently dead.
                    return "heartbeat timeout";
                }
                let ping = WireFrame::new(
                    EVENT_PING,
                    serde_json::json!({ "timestamp": now_ms() }),
                );
                let json = match serde_json::to_string(&ping) {
                    Ok(json) => json,
                    Err(_) => continue,
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!(error = %e, "ping send failed");
                    return "ping send failed";
                }
            }

            message = reader.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WireFrame>(text.as_str()) {
                            Ok(frame) => {
                                if frame.event == EVENT_PONG {
                                    last_pong = tokio::time::Instant::now();
                                } else {
                                    inner.registry.dispatch(&frame.event, &frame.data);
                                }
                            }
                            Err(e) => {
                                // Malformed frames are logged and skipped, never fatal.
                                warn!(error = %e, "unparseable frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => return "closed by server",
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "read failed");
                        return "read failed";
                    }
                    None => return "stream ended",
                }
            }
        }
    }
}

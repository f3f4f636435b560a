//! Connection supervision: a single long-lived connection per process.
//!
//! [`SessionManager`] owns the supervisor task; the composition root creates
//! exactly one and shares cheap [`SessionHandle`] clones with everything
//! that needs to send intents or observe state. The supervisor is an event
//! loop over one queue: caller commands, transport lifecycle events, and the
//! reconnect timer all funnel through a single `tokio::select!`, so state
//! transitions are serialized by construction.
//!
//! Connection states:
//!
//! ```text
//! Idle ──ensure_connected──▶ Connecting ──opened──▶ Open
//!   ▲                            │                    │
//!   │ normal close (1000/1001)   │ connect error      │ abnormal close
//!   └────────────────────────────┼────────────────────┤
//!                                ▼                    ▼
//!                             Backoff ◀── single fixed-delay retry ──┘
//! ```
//!
//! A failure schedules exactly one retry; the next attempt's own failure
//! schedules the next. Retries continue indefinitely until a normal closure
//! or teardown.

use std::sync::Arc;

use desk_core::notice::Notice;
use desk_core::protocol::{self, Outbound};
use desk_core::reconnect::{ReconnectPolicy, is_normal_close};
use desk_core::session::SessionStore;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::transport::{Transport, TransportConn, TransportError, TransportEvent};

/// Command queue depth. Commands are tiny and handled promptly; a full
/// queue only happens if the supervisor task is gone.
const COMMAND_BUFFER: usize = 32;

/// Notice fan-out capacity. Slow subscribers lag rather than block.
const NOTICE_BUFFER: usize = 64;

/// Everything the supervisor needs to open and bootstrap a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Resolved WebSocket URL (see [`crate::endpoint::resolve_ws_url`]).
    pub url: String,
    /// Username for the bootstrap handshake.
    pub username: String,
    /// Starting capital for a fresh account.
    pub initial_capital: f64,
    /// Retry policy for abnormal disconnects.
    pub reconnect: ReconnectPolicy,
}

/// Caller requests, serialized through the supervisor's event queue.
#[derive(Debug)]
enum Command {
    EnsureConnected,
    Send(Outbound),
    Teardown,
}

/// Supervisor connection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConnState {
    /// No connection and none wanted. Also the post-teardown and
    /// post-normal-close resting state.
    Idle,
    /// A transport connect is in flight or awaiting its open event.
    Connecting,
    /// Live connection; frames flow.
    Open,
    /// Abnormally disconnected; one retry is scheduled.
    Backoff,
}

/// Cheap clonable handle to the supervisor.
///
/// All methods are safe to call from any task; they enqueue commands rather
/// than touching connection state directly.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    session: SessionStore,
    notices: broadcast::Sender<Notice>,
}

impl SessionHandle {
    /// Ask the supervisor to connect if it is idle.
    ///
    /// Idempotent: while connecting, open, or backing off this is a no-op,
    /// so any number of callers may request a connection without spawning
    /// duplicates.
    pub async fn ensure_connected(&self) {
        if self.commands.send(Command::EnsureConnected).await.is_err() {
            warn!("session supervisor is gone; ensure_connected dropped");
        }
    }

    /// Send an outbound message over the live connection.
    ///
    /// If the connection is not open the intent is dropped and an error
    /// notice is emitted; the caller's state is never left half-applied.
    pub async fn send(&self, message: Outbound) {
        if self.commands.send(Command::Send(message)).await.is_err() {
            warn!("session supervisor is gone; message dropped");
        }
    }

    /// Read access to the shared session state.
    #[must_use]
    pub fn session(&self) -> SessionStore {
        self.session.clone()
    }

    /// Subscribe to transient user-facing notices.
    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }
}

/// Owner of the supervisor task. Create one per process at the composition
/// root; share [`SessionHandle`] clones from there.
pub struct SessionManager {
    handle: SessionHandle,
    task: tokio::task::JoinHandle<()>,
}

impl SessionManager {
    /// Spawn the supervisor task. The connection is not opened until the
    /// first [`SessionHandle::ensure_connected`].
    #[must_use]
    pub fn spawn<T: Transport>(config: SessionConfig, transport: T) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (notices_tx, _) = broadcast::channel(NOTICE_BUFFER);
        let session = SessionStore::new();
        let dispatcher = Dispatcher::new(session.clone(), notices_tx.clone());

        let supervisor = Supervisor {
            transport: Arc::new(transport),
            config,
            dispatcher,
            state: ConnState::Idle,
            outbound: None,
            events: None,
            dial: None,
            retry_at: None,
        };
        let task = tokio::spawn(supervisor.run(commands_rx));

        Self {
            handle: SessionHandle {
                commands: commands_tx,
                session,
                notices: notices_tx,
            },
            task,
        }
    }

    /// A clonable handle for collaborators.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Close the connection with a normal code and stop the supervisor.
    pub async fn shutdown(self) {
        let _ = self.handle.commands.send(Command::Teardown).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "session supervisor task panicked");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event loop
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one spawned connect attempt.
type DialResult = Result<TransportConn, TransportError>;

struct Supervisor<T: Transport> {
    transport: Arc<T>,
    config: SessionConfig,
    dispatcher: Dispatcher,
    state: ConnState,
    /// Send half of the live connection, when one exists. Dropping it tells
    /// the transport to close with a normal code.
    outbound: Option<mpsc::Sender<String>>,
    /// Event stream of the live connection.
    events: Option<mpsc::Receiver<TransportEvent>>,
    /// In-flight connect attempt. The dial runs on its own task so a slow
    /// handshake never stalls command handling; at most one is in flight.
    dial: Option<oneshot::Receiver<DialResult>>,
    /// Deadline of the single scheduled retry. Overwritten, never
    /// accumulated, so at most one retry can ever be pending.
    retry_at: Option<Instant>,
}

impl<T: Transport> Supervisor<T> {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            // Guards are computed up front so the select arms borrow
            // disjoint fields.
            let events_open = self.events.is_some();
            let dial_pending = self.dial.is_some();
            let retry_pending = self.retry_at.is_some();
            let retry_deadline = self.retry_at.unwrap_or_else(Instant::now);

            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(Command::Teardown) | None => {
                            self.teardown();
                            break;
                        }
                        Some(Command::EnsureConnected) => {
                            if self.state == ConnState::Idle {
                                self.connect();
                            } else {
                                debug!(state = ?self.state, "ensure_connected is a no-op");
                            }
                        }
                        Some(Command::Send(message)) => self.send_message(message).await,
                    }
                }
                result = next_dial(&mut self.dial), if dial_pending => {
                    self.dial = None;
                    self.handle_dial(result);
                }
                event = next_event(&mut self.events), if events_open => {
                    self.handle_event(event).await;
                }
                () = tokio::time::sleep_until(retry_deadline), if retry_pending => {
                    self.retry_at = None;
                    metrics::counter!("desk_ws_reconnects_total").increment(1);
                    info!("reconnect timer fired");
                    self.connect();
                }
            }
        }
    }

    async fn handle_event(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Opened) => {
                self.state = ConnState::Open;
                info!(url = %self.config.url, "connection open");
                let bootstrap = Outbound::Bootstrap {
                    username: self.config.username.clone(),
                    initial_capital: self.config.initial_capital,
                };
                self.send_message(bootstrap).await;
            }
            Some(TransportEvent::Frame(text)) => {
                if let Some(follow_up) = self.dispatcher.handle_frame(&text) {
                    self.send_message(follow_up).await;
                }
            }
            Some(TransportEvent::Closed { code }) => {
                self.drop_connection();
                if is_normal_close(code) {
                    info!(?code, "connection closed normally; staying idle");
                    self.state = ConnState::Idle;
                } else {
                    warn!(?code, "connection closed abnormally");
                    self.schedule_retry();
                }
            }
            Some(TransportEvent::Errored(reason)) => {
                warn!(%reason, "connection errored");
                self.drop_connection();
                self.schedule_retry();
            }
            None => {
                // Pump ended without a terminal event; treat as abnormal.
                warn!("transport event stream ended unexpectedly");
                self.drop_connection();
                self.schedule_retry();
            }
        }
    }

    /// Start a connect attempt on its own task. The loop keeps serving
    /// commands while the dial is in flight and picks the result up as an
    /// event.
    fn connect(&mut self) {
        self.state = ConnState::Connecting;
        // A starting attempt always owns the retry slot.
        self.retry_at = None;
        debug!(url = %self.config.url, "connecting");
        let transport = Arc::clone(&self.transport);
        let url = self.config.url.clone();
        let (result_tx, result_rx) = oneshot::channel();
        drop(tokio::spawn(async move {
            let _ = result_tx.send(transport.connect(&url).await);
        }));
        self.dial = Some(result_rx);
    }

    fn handle_dial(&mut self, result: Result<DialResult, oneshot::error::RecvError>) {
        match result {
            Ok(Ok(conn)) => {
                self.outbound = Some(conn.outbound);
                self.events = Some(conn.events);
                // State stays Connecting until the Opened event arrives.
            }
            Ok(Err(e)) => {
                warn!(error = %e, url = %self.config.url, "connect failed");
                metrics::counter!("desk_ws_connect_failures_total").increment(1);
                self.schedule_retry();
            }
            Err(_) => {
                // Dial task died without reporting; treat as a failure.
                warn!(url = %self.config.url, "connect attempt vanished");
                metrics::counter!("desk_ws_connect_failures_total").increment(1);
                self.schedule_retry();
            }
        }
    }

    /// Schedule the single retry. An existing deadline is overwritten, so
    /// overlapping failure signals collapse into one pending attempt.
    fn schedule_retry(&mut self) {
        self.state = ConnState::Backoff;
        let delay = self.config.reconnect.next_delay();
        self.retry_at = Some(Instant::now() + delay);
        debug!(delay_ms = delay.as_millis() as u64, "retry scheduled");
    }

    async fn send_message(&mut self, message: Outbound) {
        if self.state != ConnState::Open {
            debug!(state = ?self.state, "dropping outbound message while not connected");
            metrics::counter!("desk_ws_send_not_connected_total").increment(1);
            self.dispatcher
                .notify(Notice::error("Not connected to server"));
            return;
        }
        let frame = match protocol::encode(&message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to encode outbound message");
                return;
            }
        };
        if let Some(tx) = &self.outbound {
            if tx.send(frame).await.is_err() {
                // Pump is gone; the event stream will surface the close.
                warn!("outbound channel closed mid-send");
            }
        }
    }

    fn drop_connection(&mut self) {
        self.outbound = None;
        self.events = None;
    }

    fn teardown(&mut self) {
        info!("session teardown");
        self.drop_connection();
        // Abandoning the receiver makes a late dial result land on a dead
        // channel; the connection it carries is dropped and closes itself.
        self.dial = None;
        self.retry_at = None;
        self.state = ConnState::Idle;
    }
}

/// Await the in-flight dial. Guarded by `dial_pending` in the select, so
/// the `None` arm never resolves; it must still not panic.
async fn next_dial(
    dial: &mut Option<oneshot::Receiver<DialResult>>,
) -> Result<DialResult, oneshot::error::RecvError> {
    match dial {
        Some(rx) => rx.await,
        None => std::future::pending().await,
    }
}

/// Receive from the live connection's event stream. The `events_open`
/// select guard makes the `None` arm unreachable, but it must not panic.
async fn next_event(
    events: &mut Option<mpsc::Receiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

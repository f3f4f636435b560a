//! Transport endpoint — thin client over `tokio-tungstenite`.
//!
//! A [`Transport`] owns exactly one physical duplex connection per
//! [`TransportConn`] it hands out, and is responsible only for the
//! open/send/receive/close primitives plus delivering lifecycle events.
//! Supervision, decoding, and routing live upstream.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, warn};

/// Outbound frame buffer. Sends are fire-and-forget; a full buffer means
/// the peer stopped reading and the pump will surface a close shortly.
const OUTBOUND_BUFFER: usize = 64;

/// Inbound event buffer between the pump task and the supervisor loop.
const EVENT_BUFFER: usize = 256;

/// Transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),
}

/// Low-level lifecycle events delivered by a live connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection finished opening and can carry frames.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// The connection closed, with the peer's close code when present.
    Closed {
        /// WebSocket close code (1000 = normal, 1001 = going away, …).
        code: Option<u16>,
    },
    /// The connection failed mid-stream.
    Errored(String),
}

/// One live connection: an outbound frame channel and an inbound event
/// stream. Dropping `outbound` closes the connection with a normal code.
pub struct TransportConn {
    /// Send half: text frames to the server.
    pub outbound: mpsc::Sender<String>,
    /// Receive half: lifecycle events in arrival order.
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Anything that can open a duplex text-frame connection.
///
/// The seam the supervisor is tested through: production uses
/// [`WsTransport`], tests script a channel-backed fake.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a new connection to `url`.
    ///
    /// On success the connection is established and an
    /// [`TransportEvent::Opened`] will be the first event delivered.
    async fn connect(&self, url: &str) -> Result<TransportConn, TransportError>;
}

/// Production transport over `tokio-tungstenite`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> Result<TransportConn, TransportError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        drop(tokio::spawn(pump(ws, outbound_rx, event_tx)));

        Ok(TransportConn {
            outbound: outbound_tx,
            events: event_rx,
        })
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Per-connection read/write loop.
///
/// Forwards text frames in arrival order, answers pings, and maps the end
/// of the stream to exactly one terminal event (`Closed` or `Errored`).
/// When the outbound channel is dropped, sends a normal-closure frame.
async fn pump(
    ws: WsStream,
    mut outbound: mpsc::Receiver<String>,
    events: mpsc::Sender<TransportEvent>,
) {
    let (mut write, mut read) = ws.split();

    if events.send(TransportEvent::Opened).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            let _ = events.send(TransportEvent::Errored(e.to_string())).await;
                            return;
                        }
                    }
                    None => {
                        // Supervisor dropped its handle: normal closure.
                        let close = CloseFrame {
                            code: CloseCode::Normal,
                            reason: "".into(),
                        };
                        if let Err(e) = write.send(Message::Close(Some(close))).await {
                            debug!(error = %e, "close frame send failed");
                        }
                        return;
                    }
                }
            }
            message = read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(TransportEvent::Frame(text.to_string())).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if let Err(e) = write.send(Message::Pong(payload)).await {
                            let _ = events.send(TransportEvent::Errored(e.to_string())).await;
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.map(|f| u16::from(f.code));
                        let _ = events.send(TransportEvent::Closed { code }).await;
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket read error");
                        let _ = events.send(TransportEvent::Errored(e.to_string())).await;
                        return;
                    }
                    None => {
                        let _ = events.send(TransportEvent::Closed { code: None }).await;
                        return;
                    }
                }
            }
        }
    }
}

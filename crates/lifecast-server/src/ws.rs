//! `WebSocket` transport for one instance's live subscription channel.
//!
//! Clients connect to `GET /ws/world/{id}`. On connect the socket is
//! registered as a listener on the instance and immediately receives a
//! world-state snapshot; after that it receives one binary frame per
//! committed generation. Binary frames sent by the client are decoded as
//! control messages (stop, start, reseed) and answered on the socket
//! itself with an acknowledgement or an error frame.
//!
//! World-state frames pass through a bounded per-socket queue. The
//! simulation only ever does a non-blocking `try_send` into it, so a slow
//! client loses world-state frames rather than stalling the run loop.
//! Control replies bypass that queue and are never dropped.
//!
//! The server pings every half idle timeout. Any inbound message, pongs
//! included, counts as activity, so a client that only watches stays
//! connected as long as it answers pings. A socket is dropped when a write
//! exceeds the write timeout or nothing arrives for the idle timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use bytes::Bytes;
use lifecast_core::Simulation;
use lifecast_core::config::ListenerSettings;
use lifecast_core::frame::{
    ControlMessage, TAG_STARTED, TAG_STOPPED, encode_error, encode_tag,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::handlers::lookup;
use crate::state::AppState;

/// Message transport beneath a listener session.
pub trait FrameTransport: Send {
    /// Write one message.
    fn send(&mut self, msg: Message) -> impl Future<Output = Result<(), axum::Error>> + Send;

    /// Read the next message. `None` once the peer is gone.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Message, axum::Error>>> + Send;
}

impl FrameTransport for WebSocket {
    async fn send(&mut self, msg: Message) -> Result<(), axum::Error> {
        Self::send(self, msg).await
    }

    async fn recv(&mut self) -> Option<Result<Message, axum::Error>> {
        Self::recv(self).await
    }
}

/// Upgrade to a `WebSocket` subscribed to one instance.
///
/// # Route
///
/// `GET /ws/world/{id}`
pub async fn ws_world(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let sim = lookup(&state, &id)?;
    let settings = state.listener.clone();
    Ok(ws.on_upgrade(move |socket| run_session(socket, sim, settings)))
}

/// Serve one listener until the peer leaves, a write times out, or the
/// idle deadline passes. The listener is always unregistered on return.
pub async fn run_session<T: FrameTransport>(
    mut transport: T,
    sim: Arc<Simulation>,
    settings: ListenerSettings,
) {
    let (tx, mut rx) = mpsc::channel(settings.queue_capacity.max(1));
    let listener = sim.add_listener(tx);
    let write_timeout = Duration::from_millis(settings.write_timeout_ms);
    let idle = Duration::from_secs(settings.idle_timeout_secs);

    debug!(instance = %sim.id(), %listener, "WebSocket listener connected");

    let idle_deadline = tokio::time::sleep(idle);
    tokio::pin!(idle_deadline);

    let period = heartbeat_period(idle);
    let mut heartbeat = tokio::time::interval_at(deadline_after(period), period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let outgoing = tokio::select! {
            frame = rx.recv() => match frame {
                Some(frame) => Message::Binary(frame),
                None => break,
            },
            _ = heartbeat.tick() => Message::Ping(Bytes::new()),
            msg = transport.recv() => {
                idle_deadline.as_mut().reset(deadline_after(idle));
                match msg {
                    Some(Ok(Message::Binary(data))) => match apply_control(&sim, &data) {
                        Some(reply) => Message::Binary(reply),
                        None => continue,
                    },
                    Some(Ok(Message::Ping(data))) => Message::Pong(data),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(%listener, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => continue,
                }
            }
            () = &mut idle_deadline => {
                debug!(instance = %sim.id(), %listener, "WebSocket listener idle, closing");
                break;
            }
        };

        match tokio::time::timeout(write_timeout, transport.send(outgoing)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(%listener, "WebSocket send failed: {e}");
                break;
            }
            Err(_elapsed) => {
                warn!(instance = %sim.id(), %listener, "WebSocket write timed out");
                break;
            }
        }
    }

    sim.remove_listener(listener);
    debug!(instance = %sim.id(), %listener, "WebSocket listener disconnected");
}

/// Ping period for a given idle timeout: half of it, at least one second.
fn heartbeat_period(idle: Duration) -> Duration {
    idle.checked_div(2)
        .unwrap_or(idle)
        .max(Duration::from_secs(1))
}

fn deadline_after(idle: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(idle).unwrap_or(now)
}

/// Apply one inbound control frame to `sim`.
///
/// Returns the frame to send back to the requesting listener, if any. A
/// successful reseed has no dedicated reply: the snapshot it broadcasts
/// already reaches every listener.
pub fn apply_control(sim: &Arc<Simulation>, data: &[u8]) -> Option<Bytes> {
    let message = match ControlMessage::decode(data) {
        Ok(message) => message,
        Err(e) => return Some(encode_error(&e.to_string())),
    };

    match message {
        ControlMessage::Stop => {
            sim.stop();
            Some(encode_tag(TAG_STOPPED))
        }
        ControlMessage::Start => match sim.start() {
            Ok(_handle) => Some(encode_tag(TAG_STARTED)),
            Err(e) => Some(encode_error(&e.to_string())),
        },
        ControlMessage::Reseed { seed, .. } => match sim.reseed(&seed) {
            Ok(_report) => None,
            Err(e) => Some(encode_error(&e.to_string())),
        },
    }
}

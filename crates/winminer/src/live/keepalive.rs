//! Background keep-alive activities of a live session.
//!
//! Two independent loops run for the lifetime of a session: an HTTP
//! protocol ping and a keep-alive frame written on the transport. Both
//! report failures on the session's error channel and keep running until
//! the session is cancelled.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::SinkExt;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::errors::LiveError;

use super::handshake::{HUB_NAME, HubClient, Transport};

/// Method literal of the transport keep-alive frame.
pub const KEEP_ALIVE_METHOD: &str = "KeepAlive";

/// The keep-alive text frame with sequence number `.0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeepAliveFrame(pub u64);

impl fmt::Display for KeepAliveFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"{{"H":"{HUB_NAME}","M":"{KEEP_ALIVE_METHOD}","A":[],"I":{}}}"#,
            self.0
        )
    }
}

fn ticker(interval: Duration) -> time::Interval {
    // First tick after one full interval, not immediately.
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    // A send held back by a blocked read is not made up for later.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn report(errors: &mpsc::UnboundedSender<LiveError>, err: LiveError) {
    error!(error = %err, "live connection error");
    let _ = errors.send(err);
}

/// Ping the hub every `interval` until `cancel` fires.
pub async fn run_protocol_ping(
    hub: HubClient,
    interval: Duration,
    cancel: CancellationToken,
    errors: mpsc::UnboundedSender<LiveError>,
) {
    let mut ticker = ticker(interval);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = hub.ping() => result,
                };
                match result {
                    Ok(()) => debug!(nonce = hub.nonce().current(), "protocol ping acknowledged"),
                    Err(err) => report(&errors, err),
                }
            }
        }
    }
    debug!("protocol ping stopped");
}

/// Write a keep-alive frame on `transport` every `interval` until `cancel`
/// fires.
///
/// Frame ids start at 1 and advance on every attempt, successful or not.
pub async fn run_transport_keep_alive(
    transport: Arc<Mutex<Transport>>,
    interval: Duration,
    cancel: CancellationToken,
    errors: mpsc::UnboundedSender<LiveError>,
) {
    let mut ticker = ticker(interval);
    let mut id: u64 = 1;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let frame = KeepAliveFrame(id).to_string();
                id += 1;
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    mut transport = transport.lock() => transport.send(Message::text(frame)).await,
                };
                match result {
                    Ok(()) => debug!(id = id - 1, "keep-alive frame sent"),
                    Err(err) => report(&errors, LiveError::KeepAlive(Box::new(err))),
                }
            }
        }
    }
    debug!("transport keep-alive stopped");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

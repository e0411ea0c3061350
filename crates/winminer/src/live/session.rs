//! An open live session.
//!
//! Owns the transport, the two keep-alive activities and the error channel
//! they report on. All transport I/O (foreground reads, background
//! keep-alive writes, the final close) goes through one async mutex.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use winminer_settings::LiveSettings;

use crate::errors::{DecodeError, LiveError};
use crate::http::HttpClient;

use super::envelope::{Envelope, decode_envelope};
use super::handshake::{self, Handshake, Transport};
use super::keepalive::{run_protocol_ping, run_transport_keep_alive};
use super::nonce::Nonce;

/// A live connection to the hub.
pub struct LiveSession {
    transport: Arc<Mutex<Transport>>,
    cancel: CancellationToken,
    errors: parking_lot::Mutex<mpsc::UnboundedReceiver<LiveError>>,
    tasks: Mutex<Option<Vec<JoinHandle<()>>>>,
    nonce: Arc<Nonce>,
    connection_id: String,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("connection_id", &self.connection_id)
            .finish_non_exhaustive()
    }
}

impl LiveSession {
    /// Run the handshake and start the keep-alive activities.
    pub async fn open(
        http: Arc<HttpClient>,
        auth_url: &str,
        client_type: i64,
        settings: &LiveSettings,
    ) -> Result<Self, LiveError> {
        let handshake = handshake::perform(http, auth_url, client_type).await?;
        Ok(Self::start(handshake, settings))
    }

    /// Take over a completed handshake and start the keep-alive activities.
    pub fn start(handshake: Handshake, settings: &LiveSettings) -> Self {
        let Handshake {
            hub,
            transport,
            negotiated,
        } = handshake;

        let transport = Arc::new(Mutex::new(transport));
        let cancel = CancellationToken::new();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let nonce = hub.nonce().clone();

        let ping = tokio::spawn(run_protocol_ping(
            hub,
            settings.ping_interval(),
            cancel.clone(),
            errors_tx.clone(),
        ));
        let keep_alive = tokio::spawn(run_transport_keep_alive(
            transport.clone(),
            settings.keep_alive_interval(),
            cancel.clone(),
            errors_tx,
        ));

        Self {
            transport,
            cancel,
            errors: parking_lot::Mutex::new(errors_rx),
            tasks: Mutex::new(Some(vec![ping, keep_alive])),
            nonce,
            connection_id: negotiated.connection_id,
        }
    }

    /// Read the next raw frame.
    ///
    /// Fails with [`LiveError::Closed`] once the session is closed and with
    /// [`LiveError::ConnectionBroken`] when a keep-alive activity has
    /// reported a failure since the last read. Both are checked before
    /// touching the transport.
    pub async fn read(&self) -> Result<Message, LiveError> {
        if self.cancel.is_cancelled() {
            return Err(LiveError::Closed);
        }
        if let Ok(err) = self.errors.lock().try_recv() {
            return Err(LiveError::ConnectionBroken(Box::new(err)));
        }

        let mut transport = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(LiveError::Closed),
            transport = self.transport.lock() => transport,
        };
        let frame = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(LiveError::Closed),
            frame = transport.next() => frame,
        };

        match frame {
            Some(Ok(message)) => {
                debug!(frame = ?message, "read frame");
                Ok(message)
            }
            Some(Err(err)) => Err(LiveError::Transport(Box::new(err))),
            None => Err(LiveError::ClosedByHost),
        }
    }

    /// Read until a relevant envelope arrives.
    ///
    /// Non-text frames, short keep-alive frames, frames that fail to parse
    /// and envelopes on other channels are skipped.
    pub async fn read_next_relevant(&self) -> Result<Envelope, LiveError> {
        loop {
            let text = match self.read().await? {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    debug!(?frame, "hub closed the connection");
                    return Err(LiveError::ClosedByHost);
                }
                _ => continue,
            };

            match decode_envelope(text.as_bytes()) {
                Ok(envelope) if envelope.is_relevant() => return Ok(envelope),
                Ok(envelope) => debug!(channel = %envelope.channel, "skipping envelope"),
                Err(DecodeError::TooShort { .. }) => debug!("skipping short frame"),
                Err(err) => warn!(error = %err, "unable to parse message"),
            }
        }
    }

    /// Close the session.
    ///
    /// Stops both keep-alive activities, waits for them to finish, then
    /// closes the transport. Closing an already-closed session is a no-op;
    /// a concurrent second call returns once the first has finished.
    pub async fn close(&self) {
        self.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        let Some(handles) = tasks.take() else {
            return;
        };
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "keep-alive task failed");
            }
        }

        let mut transport = self.transport.lock().await;
        if let Err(err) = transport.close(None).await {
            debug!(error = %err, "transport close failed");
        }
        info!(connection_id = %self.connection_id, "live session closed");
    }

    /// The most recently used nonce.
    pub fn nonce(&self) -> i64 {
        self.nonce.current()
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Connection ID assigned by negotiate.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

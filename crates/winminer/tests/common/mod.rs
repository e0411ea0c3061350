//! In-process mock of the WinMiner API and its SignalR hub.
//!
//! Serves the REST login, hub auth and the four SignalR endpoints on a
//! random local port, records every nonce and keep-alive frame it sees and
//! lets tests push frames to the connected client.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use winminer_settings::WinminerSettings;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Frame text that makes the hub send a close frame and drop the connection.
pub const CLOSE_FRAME: &str = "__close__";

/// Everything the mock hub has observed.
#[derive(Default)]
pub struct Recorded {
    pub authorizations: Vec<String>,
    pub negotiate_nonces: Vec<i64>,
    pub start_nonces: Vec<i64>,
    pub ping_nonces: Vec<i64>,
    pub connect_queries: Vec<HashMap<String, String>>,
    pub client_frames: Vec<String>,
}

pub struct HubState {
    base_url: Mutex<String>,
    pub recorded: Mutex<Recorded>,
    pub start_response: Mutex<String>,
    pub ping_response: Mutex<String>,
    pub connections: AtomicUsize,
    push_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

pub struct MockHub {
    pub base_url: String,
    pub state: Arc<HubState>,
    push: mpsc::UnboundedSender<String>,
}

impl MockHub {
    pub async fn start() -> Self {
        let (push, push_rx) = mpsc::unbounded_channel();
        let state = Arc::new(HubState {
            base_url: Mutex::new(String::new()),
            recorded: Mutex::new(Recorded::default()),
            start_response: Mutex::new("started".into()),
            ping_response: Mutex::new("pong".into()),
            connections: AtomicUsize::new(0),
            push_rx: tokio::sync::Mutex::new(push_rx),
        });

        let app = Router::new()
            .route("/user/login", post(login))
            .route("/hub/auth2", post(hub_auth))
            .route("/signalr/negotiate", get(negotiate))
            .route("/signalr/connect", get(connect))
            .route("/signalr/start", get(start))
            .route("/signalr/ping", get(ping))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        *state.base_url.lock() = base_url.clone();
        let _ = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            push,
        }
    }

    /// Settings pointing at this hub.
    pub fn settings(&self, ping: Duration, keep_alive: Duration) -> WinminerSettings {
        let mut settings = WinminerSettings::default();
        settings.api.base_url = self.base_url.clone();
        settings.api.request_timeout_ms = 5_000;
        settings.live.ping_interval_ms = u64::try_from(ping.as_millis()).unwrap();
        settings.live.keep_alive_interval_ms = u64::try_from(keep_alive.as_millis()).unwrap();
        settings
    }

    /// Queue a text frame for the connected client.
    pub fn push(&self, frame: impl Into<String>) {
        self.push.send(frame.into()).unwrap();
    }

    /// Wait until `check` holds for the recorded state.
    pub async fn wait_for(&self, check: impl Fn(&Recorded) -> bool) {
        tokio::time::timeout(TIMEOUT, async {
            while !check(&self.state.recorded.lock()) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }
}

/// A relevant envelope carrying the given invocations.
pub fn envelope(invocations: Value) -> String {
    json!({ "C": "d-1F2E3D4C-B,0|E,2|F,2|G,0", "M": invocations }).to_string()
}

/// An envelope on a channel that carries no device updates.
pub fn irrelevant_envelope(invocations: Value) -> String {
    json!({ "C": "d-1F2E3D4C-B,0|E,0|F,1|G,0", "M": invocations }).to_string()
}

fn nonce(query: &HashMap<String, String>) -> i64 {
    query.get("_").and_then(|n| n.parse().ok()).unwrap_or(-1)
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    assert_eq!(body["hubClientType"], 200);
    Json(json!({ "userToken": "user-token", "hubToken": "", "hubHost": "" }))
}

async fn hub_auth(
    State(state): State<Arc<HubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.recorded.lock().authorizations.push(authorization);
    assert_eq!(body["clientType"], 200);
    assert_eq!(body["loginToken"], "user-token");
    let host = state.base_url.lock().clone();
    Json(json!({ "host": host, "token": "live-token" }))
}

async fn negotiate(
    State(state): State<Arc<HubState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.recorded.lock().negotiate_nonces.push(nonce(&query));
    Json(json!({
        "Url": "/signalr",
        "ConnectionToken": "conn-token",
        "ConnectionId": "conn-id",
        "KeepAliveTimeout": 20.0,
        "DisconnectTimeout": 30.0,
        "ConnectionTimeout": 110.0,
        "TryWebSockets": true,
        "ProtocolVersion": "1.5",
        "TransportConnectionTimeout": 5.0,
        "LongPollDelay": 0.0
    }))
}

async fn start(
    State(state): State<Arc<HubState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.recorded.lock().start_nonces.push(nonce(&query));
    let response = state.start_response.lock().clone();
    Json(json!({ "Response": response }))
}

async fn ping(
    State(state): State<Arc<HubState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.recorded.lock().ping_nonces.push(nonce(&query));
    let response = state.ping_response.lock().clone();
    Json(json!({ "Response": response }))
}

async fn connect(
    State(state): State<Arc<HubState>>,
    Query(query): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    state.recorded.lock().connect_queries.push(query);
    let _ = state.connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| hub_session(socket, state))
}

async fn hub_session(mut socket: WebSocket, state: Arc<HubState>) {
    let mut push = state.push_rx.lock().await;
    loop {
        tokio::select! {
            frame = push.recv() => {
                let Some(frame) = frame else { break };
                if frame == CLOSE_FRAME {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    state.recorded.lock().client_frames.push(text.to_string());
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

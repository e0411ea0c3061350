//! SignalR handshake against the live hub.
//!
//! The handshake is a strict sequence: hub auth → negotiate → connect →
//! start. Each step consumes the previous step's output, and a failure at
//! any step aborts the whole handshake with an error naming that step.

use std::sync::Arc;

use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::errors::{ApiError, LiveError};
use crate::http::{ApiRequest, HttpClient};
use crate::types::{HubAuthRequest, HubAuthResponse, NegotiateResponse, SignalrResponse};

use super::nonce::Nonce;

/// Name of the hub all live traffic goes through.
pub const HUB_NAME: &str = "reportinghub";

const CLIENT_PROTOCOL: &str = "1.5";
const CONNECTION_DATA: &str = r#"[{"name":"reportinghub"}]"#;
const TRANSPORT: &str = "webSockets";
const TID: &str = "10";

const STARTED: &str = "started";
const PONG: &str = "pong";

/// The websocket transport of a live session.
pub type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Credentials and endpoints of an authenticated hub.
///
/// Cloning shares the nonce, so every clone keeps advancing the same
/// sequence.
#[derive(Clone)]
pub struct HubClient {
    http: Arc<HttpClient>,
    host: String,
    token: String,
    nonce: Arc<Nonce>,
}

impl HubClient {
    /// Step 1: exchange the user token for a live-auth token and hub host.
    #[tracing::instrument(skip_all)]
    pub async fn authenticate(
        http: Arc<HttpClient>,
        auth_url: &str,
        client_type: i64,
        nonce: Arc<Nonce>,
    ) -> Result<Self, LiveError> {
        let login_token = http
            .user_token()
            .ok_or(LiveError::Auth(ApiError::NotLoggedIn))?;
        let request = ApiRequest::post(auth_url)
            .authenticated()
            .json(&HubAuthRequest {
                client_type,
                login_token,
            })
            .map_err(LiveError::Auth)?;
        let resp: HubAuthResponse = http.call(request).await.map_err(LiveError::Auth)?;
        debug!(host = %resp.host, "hub auth succeeded");

        Ok(Self::for_host(http, resp.host, resp.token, nonce))
    }

    /// A client for a hub whose live-auth token was already issued.
    pub fn for_host(
        http: Arc<HttpClient>,
        host: impl Into<String>,
        token: impl Into<String>,
        nonce: Arc<Nonce>,
    ) -> Self {
        let host: String = host.into();
        Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            token: token.into(),
            nonce,
        }
    }

    /// Hub base URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The session nonce.
    pub fn nonce(&self) -> &Arc<Nonce> {
        &self.nonce
    }

    /// Step 2: negotiate a connection token, using the nonce's initial value.
    #[tracing::instrument(skip_all)]
    pub async fn negotiate(&self) -> Result<NegotiateResponse, LiveError> {
        let request = ApiRequest::get(format!("{}/signalr/negotiate", self.host))
            .query("clientProtocol", CLIENT_PROTOCOL)
            .query("connectionData", CONNECTION_DATA)
            .query("token", self.token.as_str())
            .query("_", self.nonce.current().to_string());
        self.http.call(request).await.map_err(LiveError::Negotiate)
    }

    /// The websocket URL for `connection_token`.
    ///
    /// The hub host's scheme is rewritten (`https` → `wss`, `http` → `ws`).
    pub fn connect_url(&self, connection_token: &str) -> Result<Url, LiveError> {
        let base = websocket_base(&self.host)?;
        let mut url = Url::parse(&format!("{base}/signalr/connect"))
            .map_err(|e| LiveError::InvalidHost(format!("{}: {e}", self.host)))?;
        let _ = url
            .query_pairs_mut()
            .append_pair("clientProtocol", CLIENT_PROTOCOL)
            .append_pair("connectionData", CONNECTION_DATA)
            .append_pair("token", &self.token)
            .append_pair("transport", TRANSPORT)
            .append_pair("tid", TID)
            .append_pair("connectionToken", connection_token);
        Ok(url)
    }

    /// Step 3: open the websocket transport.
    #[tracing::instrument(skip_all)]
    pub async fn connect(&self, connection_token: &str) -> Result<Transport, LiveError> {
        let url = self.connect_url(connection_token)?;
        let (transport, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::Connect(Box::new(e)))?;
        Ok(transport)
    }

    /// Step 4: send the start signal with the next nonce.
    #[tracing::instrument(skip_all)]
    pub async fn start(&self, connection_token: &str) -> Result<(), LiveError> {
        let request = ApiRequest::get(format!("{}/signalr/start", self.host))
            .query("clientProtocol", CLIENT_PROTOCOL)
            .query("connectionData", CONNECTION_DATA)
            .query("connectionToken", connection_token)
            .query("token", self.token.as_str())
            .query("_", self.nonce.advance().to_string())
            .query("transport", TRANSPORT);
        let resp: SignalrResponse = self.http.call(request).await.map_err(LiveError::Start)?;
        expect_acknowledgement("start", STARTED, resp)
    }

    /// Protocol ping with the next nonce.
    pub async fn ping(&self) -> Result<(), LiveError> {
        let request = ApiRequest::get(format!("{}/signalr/ping", self.host))
            .query("token", self.token.as_str())
            .query("_", self.nonce.advance().to_string());
        let resp: SignalrResponse = self.http.call(request).await.map_err(LiveError::Ping)?;
        expect_acknowledgement("ping", PONG, resp)
    }
}

fn expect_acknowledgement(
    endpoint: &'static str,
    expected: &'static str,
    resp: SignalrResponse,
) -> Result<(), LiveError> {
    if resp.response == expected {
        Ok(())
    } else {
        Err(LiveError::Acknowledgement {
            endpoint,
            expected,
            actual: resp.response,
        })
    }
}

fn websocket_base(host: &str) -> Result<String, LiveError> {
    if let Some(rest) = host.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = host.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else {
        Err(LiveError::InvalidHost(host.to_string()))
    }
}

/// Result of a completed handshake.
pub struct Handshake {
    /// The authenticated hub.
    pub hub: HubClient,
    /// The open transport.
    pub transport: Transport,
    /// Connection parameters from negotiate.
    pub negotiated: NegotiateResponse,
}

/// Run the full handshake with a nonce starting now.
pub async fn perform(
    http: Arc<HttpClient>,
    auth_url: &str,
    client_type: i64,
) -> Result<Handshake, LiveError> {
    perform_with_nonce(http, auth_url, client_type, Arc::new(Nonce::starting_now())).await
}

/// Run the full handshake with a caller-provided nonce.
pub async fn perform_with_nonce(
    http: Arc<HttpClient>,
    auth_url: &str,
    client_type: i64,
    nonce: Arc<Nonce>,
) -> Result<Handshake, LiveError> {
    let hub = HubClient::authenticate(http, auth_url, client_type, nonce).await?;
    let negotiated = hub.negotiate().await?;
    let transport = hub.connect(&negotiated.connection_token).await?;
    hub.start(&negotiated.connection_token).await?;
    info!(
        host = %hub.host(),
        connection_id = %negotiated.connection_id,
        "live session started"
    );

    Ok(Handshake {
        hub,
        transport,
        negotiated,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

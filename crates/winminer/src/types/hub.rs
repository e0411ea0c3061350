//! Shapes used by the live-session handshake.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /hub/auth2`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubAuthRequest {
    /// Client type tag; 200 for this client.
    pub client_type: i64,
    /// The durable user token.
    pub login_token: String,
}

/// Response to `POST /hub/auth2`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HubAuthResponse {
    /// Base URL of the hub, e.g. `https://live.winminer.com`.
    pub host: String,
    /// Short-lived live-auth token.
    pub token: String,
}

/// Response to `GET /signalr/negotiate`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NegotiateResponse {
    /// Relative SignalR endpoint path.
    pub url: String,
    /// Token identifying this connection in connect and start.
    pub connection_token: String,
    /// Server-assigned connection ID.
    pub connection_id: String,
    /// Seconds.
    pub keep_alive_timeout: Decimal,
    /// Seconds.
    pub disconnect_timeout: Decimal,
    /// Seconds.
    pub connection_timeout: Decimal,
    /// Whether the server offers the websocket transport.
    pub try_web_sockets: bool,
    /// Negotiated protocol version, `1.5`.
    pub protocol_version: String,
    /// Seconds.
    pub transport_connection_timeout: Decimal,
    /// Seconds.
    pub long_poll_delay: Decimal,
}

/// Body returned by both `/signalr/start` and `/signalr/ping`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalrResponse {
    /// Acknowledgement literal, `started` or `pong`.
    #[serde(rename = "Response")]
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_response_from_wire() {
        let resp: NegotiateResponse = serde_json::from_value(serde_json::json!({
            "Url": "/signalr",
            "ConnectionToken": "tok/+=",
            "ConnectionId": "c0ffee",
            "KeepAliveTimeout": 20.0,
            "DisconnectTimeout": 30.0,
            "ConnectionTimeout": 110.0,
            "TryWebSockets": true,
            "ProtocolVersion": "1.5",
            "TransportConnectionTimeout": 5.0,
            "LongPollDelay": 0.0
        }))
        .unwrap();

        assert_eq!(resp.connection_token, "tok/+=");
        assert_eq!(resp.connection_id, "c0ffee");
        assert!(resp.try_web_sockets);
        assert_eq!(resp.keep_alive_timeout, Decimal::from(20));
    }

    #[test]
    fn hub_auth_request_wire_names() {
        let body = serde_json::to_value(HubAuthRequest {
            client_type: 200,
            login_token: "user".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"clientType": 200, "loginToken": "user"}));
    }
}

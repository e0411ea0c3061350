//! End-to-end tests of the live session against an in-process hub.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use tokio::time::timeout;

use common::{CLOSE_FRAME, MockHub, TIMEOUT, envelope, irrelevant_envelope};
use winminer::live::KeepAliveFrame;
use winminer::{ApiClient, HandshakeStep, LiveError, LiveEvent, LiveState, StatusCode};

const SLOW: Duration = Duration::from_secs(3600);
const FAST: Duration = Duration::from_millis(50);

async fn logged_in(hub: &MockHub, ping: Duration, keep_alive: Duration) -> ApiClient {
    ApiClient::login("me@example.com", "secret", hub.settings(ping, keep_alive))
        .await
        .unwrap()
}

fn machine_record() -> serde_json::Value {
    json!({
        "machineName": "rig",
        "sid": "m1",
        "clientVersion": "3.1.0",
        "isAdmin": false,
        "isPortable": false,
        "key": "k",
        "devices": [
            { "id": "d1", "enabled": true, "name": "GPU 0", "type": "GPU", "status": { "status": 0 } },
            { "id": "d2", "enabled": true, "name": "GPU 1", "type": "GPU", "status": { "status": 0 } }
        ]
    })
}

#[tokio::test]
async fn reconciles_pushed_status_change() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, SLOW).await;
    let session = client.connect_live().await.unwrap();
    assert_eq!(session.connection_id(), "conn-id");

    hub.push(envelope(json!([
        { "H": "ReportingHub", "M": "SetSystemInfo", "A": ["client-1", "m1", machine_record()] }
    ])));
    hub.push("{}");
    hub.push(irrelevant_envelope(json!([
        { "H": "ReportingHub", "M": "StatusChanged", "A": ["m1", "d1", { "status": 8 }] }
    ])));
    hub.push(envelope(json!([
        { "H": "ReportingHub", "M": "StatusChanged", "A": ["m1", "d2", {
            "status": 8, "hashrates": [12.5], "profits": [0.01], "currency": "ETH", "tags": []
        }] }
    ])));

    let state = LiveState::new();
    for _ in 0..2 {
        let envelope = timeout(TIMEOUT, session.read_next_relevant())
            .await
            .unwrap()
            .unwrap();
        for event in envelope.events() {
            state.apply_event(&event.unwrap()).unwrap();
        }
    }

    let d2 = state.device("m1", "d2").unwrap();
    assert_eq!(d2.status.code(), Some(StatusCode::Mining));
    assert_eq!(d2.status.currency, "ETH");
    assert_eq!(state.device("m1", "d1").unwrap().status.status, 0);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.machines.len(), 1);
    assert_eq!(snapshot.devices_last_updated.len(), 1);
    assert!(snapshot.devices_last_updated.contains_key("d2"));

    assert_eq!(
        hub.state.recorded.lock().authorizations,
        vec!["Bearer user-token".to_string()]
    );
    client.close_live().await.unwrap();
}

#[tokio::test]
async fn unknown_device_is_reported_as_drift() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, SLOW).await;
    let session = client.connect_live().await.unwrap();

    hub.push(envelope(json!([
        { "H": "ReportingHub", "M": "SetSystemInfo", "A": ["client-1", "m1", machine_record()] },
        { "H": "ReportingHub", "M": "StatusChanged", "A": ["m1", "gone", { "status": 8 }] }
    ])));

    let envelope = timeout(TIMEOUT, session.read_next_relevant())
        .await
        .unwrap()
        .unwrap();
    let events: Vec<LiveEvent> = envelope.events().map(Result::unwrap).collect();
    let state = LiveState::new();
    state.apply_event(&events[0]).unwrap();
    let err = state.apply_event(&events[1]).unwrap_err();
    assert!(err.is_drift());

    let fresh = client.reconnect_live().await.unwrap();
    assert!(!Arc::ptr_eq(&session, &fresh));
    assert!(session.is_closed());
    assert!(!fresh.is_closed());
    assert_eq!(hub.state.connections.load(Ordering::SeqCst), 2);
    client.close_live().await.unwrap();
}

#[tokio::test]
async fn nonce_starts_at_negotiate_and_advances_per_call() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, FAST, SLOW).await;
    let session = client.connect_live().await.unwrap();

    hub.wait_for(|r| r.ping_nonces.len() >= 2).await;
    session.close().await;

    let recorded = hub.state.recorded.lock();
    let n0 = recorded.negotiate_nonces[0];
    assert_eq!(recorded.start_nonces, vec![n0 + 1]);
    assert_eq!(recorded.ping_nonces[0], n0 + 2);
    assert_eq!(recorded.ping_nonces[1], n0 + 3);
    assert!(session.nonce() >= n0 + 3);
}

#[tokio::test]
async fn connect_query_carries_protocol_literals() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, SLOW).await;
    let _session = client.connect_live().await.unwrap();

    {
        let recorded = hub.state.recorded.lock();
        let query = &recorded.connect_queries[0];
        assert_eq!(query["clientProtocol"], "1.5");
        assert_eq!(query["connectionData"], r#"[{"name":"reportinghub"}]"#);
        assert_eq!(query["token"], "live-token");
        assert_eq!(query["transport"], "webSockets");
        assert_eq!(query["tid"], "10");
        assert_eq!(query["connectionToken"], "conn-token");
    }
    client.close_live().await.unwrap();
}

#[tokio::test]
async fn keep_alive_frames_are_numbered_from_one() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, FAST).await;
    let session = client.connect_live().await.unwrap();

    hub.wait_for(|r| r.client_frames.len() >= 2).await;
    session.close().await;

    let recorded = hub.state.recorded.lock();
    assert_eq!(
        recorded.client_frames[0],
        r#"{"H":"reportinghub","M":"KeepAlive","A":[],"I":1}"#
    );
    assert_eq!(recorded.client_frames[1], KeepAliveFrame(2).to_string());
}

#[tokio::test]
async fn failed_ping_breaks_the_next_read() {
    let hub = MockHub::start().await;
    *hub.state.ping_response.lock() = "nope".into();
    let client = logged_in(&hub, FAST, SLOW).await;
    let session = client.connect_live().await.unwrap();

    hub.wait_for(|r| !r.ping_nonces.is_empty()).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = timeout(TIMEOUT, session.read()).await.unwrap().unwrap_err();
    assert_matches!(err, LiveError::ConnectionBroken(inner) => {
        assert_matches!(*inner, LiveError::Acknowledgement { endpoint: "ping", .. });
    });
    client.close_live().await.unwrap();
}

#[tokio::test]
async fn start_without_acknowledgement_fails_handshake() {
    let hub = MockHub::start().await;
    *hub.state.start_response.lock() = "stopped".into();
    let client = logged_in(&hub, SLOW, SLOW).await;

    let Err(err) = client.connect_live().await else {
        panic!("handshake should fail");
    };
    assert_eq!(err.handshake_step(), Some(HandshakeStep::Start));
    assert_matches!(client.close_live().await, Err(LiveError::NotConnected));
}

#[tokio::test]
async fn close_is_idempotent() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, FAST, FAST).await;
    let session = client.connect_live().await.unwrap();

    let _ = tokio::join!(session.close(), session.close());
    session.close().await;

    assert!(session.is_closed());
    assert_matches!(session.read().await, Err(LiveError::Closed));
    assert_matches!(session.read_next_relevant().await, Err(LiveError::Closed));

    client.close_live().await.unwrap();
    assert_matches!(client.close_live().await, Err(LiveError::NotConnected));
}

#[tokio::test]
async fn close_stops_background_activity() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, FAST, FAST).await;
    let session = client.connect_live().await.unwrap();

    hub.wait_for(|r| !r.ping_nonces.is_empty() && !r.client_frames.is_empty()).await;
    session.close().await;
    let (pings, frames) = {
        let recorded = hub.state.recorded.lock();
        (recorded.ping_nonces.len(), recorded.client_frames.len())
    };

    tokio::time::sleep(FAST * 4).await;
    let recorded = hub.state.recorded.lock();
    assert_eq!(recorded.ping_nonces.len(), pings);
    assert_eq!(recorded.client_frames.len(), frames);
}

#[tokio::test]
async fn connect_live_reuses_open_session() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, SLOW).await;

    let first = client.connect_live().await.unwrap();
    let second = client.connect_live().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(hub.state.connections.load(Ordering::SeqCst), 1);
    client.close_live().await.unwrap();
}

#[tokio::test]
async fn host_close_surfaces_as_closed_by_host() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, SLOW).await;
    let session = client.connect_live().await.unwrap();

    hub.push(CLOSE_FRAME);

    let err = timeout(TIMEOUT, session.read_next_relevant())
        .await
        .unwrap()
        .unwrap_err();
    assert_matches!(err, LiveError::ClosedByHost);
    session.close().await;
}

#[tokio::test]
async fn failed_keep_alive_breaks_the_next_read() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, FAST).await;
    let session = client.connect_live().await.unwrap();

    hub.wait_for(|r| !r.client_frames.is_empty()).await;
    hub.push(CLOSE_FRAME);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let err = timeout(TIMEOUT, session.read()).await.unwrap().unwrap_err();
    assert_matches!(err, LiveError::ConnectionBroken(inner) => {
        assert_matches!(*inner, LiveError::KeepAlive(_));
    });
    client.close_live().await.unwrap();
}

#[tokio::test]
async fn connect_live_replaces_directly_closed_session() {
    let hub = MockHub::start().await;
    let client = logged_in(&hub, SLOW, SLOW).await;

    let first = client.connect_live().await.unwrap();
    first.close().await;
    let second = client.connect_live().await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!second.is_closed());
    assert_eq!(hub.state.connections.load(Ordering::SeqCst), 2);

    hub.push(envelope(json!([
        { "H": "ReportingHub", "M": "ClientConnected", "A": ["client-1"] }
    ])));
    let envelope = timeout(TIMEOUT, second.read_next_relevant())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(envelope.invocations[0].method, "ClientConnected");
    client.close_live().await.unwrap();
}

//! `winminer live`: follow device status over the live API.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use winminer::{ApiClient, LiveError, LiveEvent, LiveSession, LiveState};

/// Print events until `limit` relevant envelopes were read (forever when
/// `None`), reconnecting whenever the reconciled state drifts.
pub async fn follow(client: &ApiClient, limit: Option<usize>) -> Result<()> {
    let state = LiveState::new();
    let mut session = client
        .connect_live()
        .await
        .context("unable to connect to the live API")?;
    info!(connection_id = session.connection_id(), "following live events");

    let mut seen = 0;
    while limit.is_none_or(|limit| seen < limit) {
        let envelope = match session.read_next_relevant().await {
            Ok(envelope) => envelope,
            Err(err @ (LiveError::ConnectionBroken(_) | LiveError::ClosedByHost)) => {
                warn!(error = %err, "live connection lost, reconnecting");
                session = reconnect(client).await?;
                continue;
            }
            Err(err) => return Err(err).context("unable to read from the live API"),
        };
        seen += 1;

        for event in envelope.events() {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "skipping undecodable invocation");
                    continue;
                }
            };
            print_event(&event)?;
            if let Err(err) = state.apply_event(&event) {
                warn!(error = %err, "live state drifted, reconnecting");
                session = reconnect(client).await?;
                break;
            }
        }
    }

    client.close_live().await.context("unable to close the live API")?;
    println!("{}", serde_json::to_string_pretty(&state.machines())?);
    Ok(())
}

async fn reconnect(client: &ApiClient) -> Result<Arc<LiveSession>> {
    client
        .reconnect_live()
        .await
        .context("unable to reconnect to the live API")
}

fn print_event(event: &LiveEvent) -> Result<()> {
    match event {
        LiveEvent::StatusChanged(change) => println!(
            "{} {}/{}: {}",
            event.method(),
            change.machine_id,
            change.device_id,
            serde_json::to_string(&change.status)?
        ),
        LiveEvent::StateChanged(change) => println!(
            "{} {}/{}: enabled={}",
            event.method(),
            change.machine_id,
            change.device_id,
            change.enabled
        ),
        LiveEvent::SystemInfo(info) => println!(
            "{} {} ({} devices)",
            event.method(),
            info.machine.sid,
            info.machine.devices.len()
        ),
        other => println!("{}", other.method()),
    }
    Ok(())
}

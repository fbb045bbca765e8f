use log::debug;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;

use crate::capture::session::SharedSession;
use crate::models::snapshot::TrafficSnapshot;

/// Pull delivery: drive a fixed-cadence snapshot poll whose lifetime is tied
/// to the session being active.
///
/// The loop re-checks the session state on every tick and terminates within
/// one period of the session leaving Active; there is no separate running
/// flag to drift out of sync. The receiver yields one snapshot per tick.
pub fn spawn_poller(
    session: SharedSession,
    period: Duration,
) -> mpsc::Receiver<TrafficSnapshot> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        // The first tick fires immediately; skip it so polling starts one
        // period after spawn.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let snapshot = {
                let session = session.read().await;
                if !session.is_active() {
                    break;
                }
                session.snapshot()
            };

            if tx.send(snapshot).await.is_err() {
                break;
            }
        }
        debug!("Snapshot poller stopped");
    });

    rx
}

/// Push delivery: a receiver of the engine's throttled snapshot events.
pub async fn subscribe(session: &SharedSession) -> broadcast::Receiver<TrafficSnapshot> {
    session.read().await.subscribe()
}

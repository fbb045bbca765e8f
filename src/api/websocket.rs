use actix_web::{web, Error, HttpRequest, Responder};
use actix_ws::{self, Message};
use futures_util::StreamExt;
use log::{debug, info, warn};
use serde::Serialize;
use std::time::Duration;
use tokio::time::interval;
use uuid::Uuid;

use crate::capture::session::SharedSession;
use crate::models::snapshot::TrafficSnapshot;

// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// WebSocket message types that can be sent to clients
#[derive(Serialize)]
#[serde(tag = "type")]
enum WsOutMessage {
    #[serde(rename = "traffic-update")]
    TrafficUpdate { snapshot: TrafficSnapshot },

    #[serde(rename = "status")]
    Status {
        state: crate::capture::session::SessionState,
        interface: Option<String>,
    },

    #[serde(rename = "ping")]
    Ping { timestamp: i64 },
}

/// Handle WebSocket connections: forward pushed traffic events to the client
/// until it disconnects.
pub async fn ws_index(
    req: HttpRequest,
    body: web::Payload,
    session_data: web::Data<SharedSession>,
) -> Result<impl Responder, Error> {
    let addr = req
        .peer_addr()
        .map_or_else(|| "unknown".to_string(), |a| a.to_string());
    info!("WebSocket connection from {addr}");

    let (response, ws, mut msg_stream) = actix_ws::handle(&req, body)?;
    let shared = session_data.into_inner().as_ref().clone();

    actix_web::rt::spawn(async move {
        let mut events = crate::capture::delivery::subscribe(&shared).await;

        // Send the current status up front so a client has something to
        // render before the first event arrives.
        let mut ws_out = ws.clone();
        if send_status(&mut ws_out, &shared).await.is_err() {
            return;
        }

        let client_task = {
            let mut ws = ws.clone();
            async move {
                while let Some(Ok(msg)) = msg_stream.next().await {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Text(text) => {
                            debug!("WebSocket client said: {text}");
                            if text.trim() == "status" && send_status(&mut ws, &shared).await.is_err()
                            {
                                break;
                            }
                        }
                        Message::Close(_) => {
                            info!("WebSocket client requested close");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        };

        let events_task = {
            let mut ws = ws.clone();
            async move {
                // Events from a previous session are recognizable by their
                // session id and logged when a restart happens.
                let mut current_session: Option<Uuid> = None;

                loop {
                    match events.recv().await {
                        Ok(snapshot) => {
                            if current_session != Some(snapshot.session_id) {
                                if current_session.is_some() {
                                    info!("New capture session, resetting WebSocket stream");
                                }
                                current_session = Some(snapshot.session_id);
                            }

                            let msg = WsOutMessage::TrafficUpdate { snapshot };
                            let Ok(json) = serde_json::to_string(&msg) else {
                                continue;
                            };
                            if ws.text(json).await.is_err() {
                                break;
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("WebSocket client lagged, skipped {skipped} events");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        };

        let heartbeat_task = {
            let mut ws = ws.clone();
            async move {
                let mut heartbeat = interval(HEARTBEAT_INTERVAL);
                loop {
                    heartbeat.tick().await;
                    let msg = WsOutMessage::Ping {
                        timestamp: chrono::Utc::now().timestamp(),
                    };
                    let Ok(json) = serde_json::to_string(&msg) else {
                        continue;
                    };
                    if ws.text(json).await.is_err() {
                        break;
                    }
                }
            }
        };

        tokio::select! {
            _ = client_task => {},
            _ = events_task => {},
            _ = heartbeat_task => {},
        }

        info!("WebSocket connection closed ({addr})");
    });

    Ok(response)
}

/// Send current session status to a WebSocket client
async fn send_status(
    ws: &mut actix_ws::Session,
    shared: &SharedSession,
) -> Result<(), actix_ws::Closed> {
    let session = shared.read().await;
    let msg = WsOutMessage::Status {
        state: session.state(),
        interface: session.interface().map(str::to_string),
    };
    drop(session);

    if let Ok(json) = serde_json::to_string(&msg) {
        ws.text(json).await?;
    }
    Ok(())
}

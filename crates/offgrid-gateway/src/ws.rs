//! WebSocket transport for the foreground bridge.
//!
//! Transitions from the health monitor are written as `{"type":"online"}` or
//! `{"type":"offline"}` text frames, and `{"type":"ack"}` frames from the
//! client are relayed back. Other frames are ignored. Only one client is
//! attached at a time. A notice lost to a dropped connection keeps the
//! monitor gated, so clients send an `ack` right after connecting.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use offgrid_core::MonitorMessage;
use offgrid_monitor::BridgeEndpoint;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::state::AppState;

pub async fn monitor_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let Some(bridge) = state.bridge.clone() else {
        return (StatusCode::NOT_FOUND, "Health monitor disabled").into_response();
    };

    let Ok(session) = bridge.try_lock_owned() else {
        return (StatusCode::CONFLICT, "Monitor session already attached").into_response();
    };

    ws.on_upgrade(move |socket| bridge_session(socket, session))
}

async fn bridge_session(mut socket: WebSocket, mut bridge: OwnedMutexGuard<BridgeEndpoint>) {
    info!("Foreground bridge attached");

    loop {
        tokio::select! {
            event = bridge.recv() => {
                let Some(event) = event else {
                    debug!("Health monitor stopped");
                    break;
                };
                if socket.send(Message::Text(event.to_json().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => match MonitorMessage::parse(text.as_str()) {
                    Some(MonitorMessage::Ack) => bridge.acknowledge(),
                    other => debug!(message = ?other, "Ignoring bridge message"),
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    }

    info!("Foreground bridge detached");
}

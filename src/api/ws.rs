// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! WebSocket transport for viewers.
//!
//! The channel is one-directional for canvas data: every message the server
//! sends is a [`CanvasMessage`]; frames from the client are acknowledged only
//! as liveness (they reset the idle clock) and are otherwise ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::protocol::CanvasMessage;
use crate::server::SharedCanvas;

pub async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<SharedCanvas>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedCanvas) {
    state.touch();

    // Join while holding the store lock so the snapshot and the subscription
    // cut the event stream at the same point.
    let mut session = {
        let store = state.store().lock().await;
        state.broadcaster().join(&store)
    };
    debug!(viewers = state.broadcaster().viewer_count(), "viewer connected");

    let mut shutdown = state.shutdown_signal();
    let (mut sender, mut receiver) = socket.split();

    for message in std::mem::take(&mut session.greeting) {
        if send_message(&mut sender, &message).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            outgoing = session.recv() => {
                let Some(message) = outgoing else {
                    break;
                };
                if send_message(&mut sender, &message).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => state.touch(),
                    Some(Err(err)) => {
                        debug!(error = %err, "viewer socket error");
                        break;
                    }
                }
            }
            // Wrapped so the watch guard is dropped inside the branch future
            // and the select stays Send.
            () = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    debug!(viewers = state.broadcaster().viewer_count().saturating_sub(1), "viewer disconnected");
}

async fn send_message(
    sender: &mut (impl SinkExt<Message> + Unpin),
    message: &CanvasMessage,
) -> Result<(), ()> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "failed to encode canvas message");
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

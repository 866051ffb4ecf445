pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::challenge::challenger_from_query;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub challenger: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: challenger={:?}",
        params.challenger
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Handle individual WebSocket connection (one quiz session)
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (out, mut outbox) = mpsc::unbounded_channel::<ServerMessage>();

    let mut session = state.new_session(challenger_from_query(params.challenger.as_deref()));
    let session_id = session.id().to_string();
    tracing::info!("WebSocket connected, session {}", session_id);

    // Writer: everything the handlers queue goes out in order
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbox.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to serialize server message: {}", e),
            }
        }
    });

    handlers::handle_connect(&mut session, &out).await;

    while let Some(ws_msg) = receiver.next().await {
        match ws_msg {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received message: {}", text);

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handlers::handle_message(client_msg, &mut session, &out).await;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse client message: {}", e);
                        let _ = out.send(ServerMessage::error(
                            "PARSE_ERROR",
                            format!("Invalid message format: {}", e),
                        ));
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("WebSocket closed");
                break;
            }
            // Pings are answered by axum
            Ok(_) => {}
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
        }

        if writer.is_finished() {
            break;
        }
    }

    drop(out);
    let _ = writer.await;

    tracing::info!(
        "WebSocket connection closed for session {} ({} answered)",
        session_id,
        session.score().answered()
    );
}

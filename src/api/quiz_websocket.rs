use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use warp::ws::{Message, WebSocket};

use crate::quiz::{ClientMessage, QuizMessageHandler, QuizServer};

pub async fn handle_quiz_websocket(websocket: WebSocket, server: Arc<QuizServer>) {
    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let mut handler = QuizMessageHandler::new(server, tx).await;
    tracing::info!(conn_id = %handler.conn_id(), "New quiz WebSocket connection");

    // Spawn task to send messages to client
    let sender_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_sender.send(message).await {
                tracing::error!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(message) => {
                handle_websocket_message(&mut handler, message).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "WebSocket error");
                break;
            }
        }
    }

    handler.cleanup().await;
    sender_task.abort();
    tracing::info!(conn_id = %handler.conn_id(), "Quiz WebSocket connection closed");
}

async fn handle_websocket_message(handler: &mut QuizMessageHandler, message: Message) {
    if let Ok(text) = message.to_str() {
        tracing::debug!("Received quiz message: {}", text);

        match serde_json::from_str::<ClientMessage>(text) {
            Ok(client_message) => {
                handler.handle_message(client_message).await;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_message = %text,
                    "Failed to parse quiz message"
                );
            }
        }
    }
}

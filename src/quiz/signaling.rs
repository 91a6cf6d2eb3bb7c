use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use warp::ws::Message;

use super::question_bank::Question;
use super::server::QuizServer;
use super::session::ComparisonEntry;

/// A start-game category is either a bare name or an object carrying one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Name(String),
    Object { name: String },
}

impl CategoryRef {
    pub fn name(&self) -> &str {
        match self {
            CategoryRef::Name(name) => name,
            CategoryRef::Object { name } => name,
        }
    }
}

/// Events delivered by clients over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Legacy handle-only join.
    #[serde(rename = "join-room", rename_all = "camelCase")]
    JoinRoom { room_code: String },

    #[serde(rename = "joinRoom")]
    JoinRoomNamed { room: String, username: String },

    #[serde(rename = "start-game", rename_all = "camelCase")]
    StartGame {
        room_code: String,
        category: CategoryRef,
    },

    #[serde(rename = "submit-answer", rename_all = "camelCase")]
    SubmitAnswer {
        room_code: String,
        question_index: usize,
        username: String,
        selected_option: String,
    },
}

/// Events broadcast by the server to room members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "user-joined", rename_all = "camelCase")]
    UserJoined { handle_id: String },

    #[serde(rename = "userJoined", rename_all = "camelCase")]
    UserJoinedNamed { joined_username: String },

    #[serde(rename = "roomUsers")]
    RoomUsers { users: Vec<String> },

    #[serde(rename = "room-ready")]
    RoomReady,

    #[serde(rename = "game-started", rename_all = "camelCase")]
    GameStarted {
        room_code: String,
        category: String,
        questions: Vec<Question>,
    },

    #[serde(rename = "next-question", rename_all = "camelCase")]
    NextQuestion {
        question_index: usize,
        question: Question,
        question_number: usize,
        total_questions: usize,
    },

    #[serde(rename = "quiz-ended", rename_all = "camelCase")]
    QuizEnded {
        scores: HashMap<String, u32>,
        winner: Option<String>,
        all_answers: Vec<ComparisonEntry>,
        players: Vec<String>,
        questions: Vec<Question>,
    },
}

fn generate_conn_id() -> String {
    let mut rng = rand::thread_rng();
    format!("conn-{:08x}", rng.gen::<u32>())
}

/// Routes one connection's inbound events into the quiz server.
pub struct QuizMessageHandler {
    server: Arc<QuizServer>,
    conn_id: String,
}

impl QuizMessageHandler {
    pub async fn new(server: Arc<QuizServer>, sender: mpsc::UnboundedSender<Message>) -> Self {
        let conn_id = generate_conn_id();
        server.register_connection(&conn_id, sender).await;
        Self { server, conn_id }
    }

    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    pub async fn handle_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::JoinRoom { room_code } => {
                self.server.join_room(&self.conn_id, &room_code, None).await;
            }
            ClientMessage::JoinRoomNamed { room, username } => {
                self.server
                    .join_room(&self.conn_id, &room, Some(username))
                    .await;
            }
            ClientMessage::StartGame { room_code, category } => {
                self.server.start_game(&room_code, category.name()).await;
            }
            ClientMessage::SubmitAnswer {
                room_code,
                question_index,
                username,
                selected_option,
            } => {
                self.server
                    .submit_answer(&room_code, question_index, &username, &selected_option)
                    .await;
            }
        }
    }

    pub async fn cleanup(&mut self) {
        self.server.disconnect(&self.conn_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_start_game_with_string_category() {
        let raw = json!({ "type": "start-game", "roomCode": "ABC123", "category": "DSA" });
        let message: ClientMessage = serde_json::from_value(raw).unwrap();
        match message {
            ClientMessage::StartGame { room_code, category } => {
                assert_eq!(room_code, "ABC123");
                assert_eq!(category.name(), "DSA");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_start_game_with_object_category() {
        let raw = json!({
            "type": "start-game",
            "roomCode": "ABC123",
            "category": { "name": "Basic Programming" }
        });
        let message: ClientMessage = serde_json::from_value(raw).unwrap();
        match message {
            ClientMessage::StartGame { category, .. } => {
                assert_eq!(category.name(), "Basic Programming");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_submit_answer() {
        let raw = json!({
            "type": "submit-answer",
            "roomCode": "ABC123",
            "questionIndex": 2,
            "username": "Alice",
            "selectedOption": "Queue"
        });
        let message: ClientMessage = serde_json::from_value(raw).unwrap();
        match message {
            ClientMessage::SubmitAnswer { question_index, username, .. } => {
                assert_eq!(question_index, 2);
                assert_eq!(username, "Alice");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_both_join_protocols() {
        let legacy: ClientMessage =
            serde_json::from_value(json!({ "type": "join-room", "roomCode": "ABC123" })).unwrap();
        assert!(matches!(legacy, ClientMessage::JoinRoom { .. }));

        let named: ClientMessage = serde_json::from_value(
            json!({ "type": "joinRoom", "room": "ABC123", "username": "Alice" }),
        )
        .unwrap();
        assert!(matches!(named, ClientMessage::JoinRoomNamed { .. }));
    }

    #[test]
    fn test_server_message_wire_names() {
        let ready = serde_json::to_value(&ServerMessage::RoomReady).unwrap();
        assert_eq!(ready["type"], "room-ready");

        let users = serde_json::to_value(&ServerMessage::RoomUsers {
            users: vec!["Alice".to_string(), "Bob".to_string()],
        })
        .unwrap();
        assert_eq!(users["type"], "roomUsers");
        assert_eq!(users["users"][0], "Alice");

        let joined = serde_json::to_value(&ServerMessage::UserJoinedNamed {
            joined_username: "Bob".to_string(),
        })
        .unwrap();
        assert_eq!(joined["type"], "userJoined");
        assert_eq!(joined["joinedUsername"], "Bob");
    }

    #[test]
    fn test_generated_conn_ids_are_prefixed() {
        let id = generate_conn_id();
        assert!(id.starts_with("conn-"));
        assert_eq!(id.len(), "conn-".len() + 8);
    }
}

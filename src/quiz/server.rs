use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{mpsc, RwLock};
use tokio::time::sleep;
use warp::ws::Message;

use crate::config::QuizConfig;
use crate::error::Result;

use super::question_bank;
use super::room::{normalize_code, RoomRegistry, Step};
use super::session::{RecordOutcome, ROOM_CAPACITY};
use super::signaling::ServerMessage;

/// Orchestrates rooms, sessions and broadcasts. All game progression is a
/// reaction to either an inbound client event or a question timer firing;
/// both paths funnel through the registry's guarded compare-and-advance.
pub struct QuizServer {
    config: QuizConfig,
    registry: RoomRegistry,
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>>,
}

impl QuizServer {
    pub fn new(config: QuizConfig) -> Self {
        Self {
            config,
            registry: RoomRegistry::new(),
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register_connection(&self, conn_id: &str, sender: mpsc::UnboundedSender<Message>) {
        let mut connections = self.connections.write().await;
        connections.insert(conn_id.to_string(), sender);
    }

    pub async fn create_room(&self) -> Result<String> {
        self.registry.create_room().await
    }

    /// Adds a connection to a room and emits the join notifications. The
    /// joined/roster notifications fire even on an idempotent re-join
    /// (at-least-once semantics); room-ready fires only when the list
    /// actually grows to capacity.
    pub async fn join_room(&self, conn_id: &str, room_code: &str, username: Option<String>) {
        let room_code = normalize_code(room_code);

        let Some(outcome) = self.registry.join(&room_code, conn_id, username.clone()).await else {
            tracing::debug!(room_code = %room_code, conn_id = %conn_id, "Join for unknown room ignored");
            return;
        };

        tracing::info!(
            room_code = %room_code,
            conn_id = %conn_id,
            named = username.is_some(),
            "Participant joined room"
        );

        match username {
            Some(name) => {
                self.broadcast_except(
                    &room_code,
                    conn_id,
                    &ServerMessage::UserJoinedNamed { joined_username: name },
                )
                .await;
                self.broadcast(&room_code, &ServerMessage::RoomUsers { users: outcome.roster })
                    .await;
            }
            None => {
                self.broadcast_except(
                    &room_code,
                    conn_id,
                    &ServerMessage::UserJoined { handle_id: conn_id.to_string() },
                )
                .await;
            }
        }

        if outcome.became_ready {
            self.broadcast(&room_code, &ServerMessage::RoomReady).await;
        }
    }

    /// Starts a quiz in a room. Rooms without exactly two players are
    /// rejected; unknown categories resolve to an empty list and finish
    /// immediately.
    pub async fn start_game(self: &Arc<Self>, room_code: &str, category: &str) {
        let room_code = normalize_code(room_code);
        let questions = question_bank::category_questions(category);

        let step = match self
            .registry
            .begin_quiz(&room_code, category, questions.clone())
            .await
        {
            Ok(step) => step,
            Err(e) => {
                tracing::warn!(room_code = %room_code, error = %e, "Rejected start-game");
                return;
            }
        };

        tracing::info!(
            room_code = %room_code,
            category = %category,
            total_questions = questions.len(),
            "Game starting"
        );

        self.broadcast(
            &room_code,
            &ServerMessage::GameStarted {
                room_code: room_code.clone(),
                category: category.to_string(),
                questions,
            },
        )
        .await;

        self.apply_step(&room_code, step).await;
    }

    /// Records one answer. When the live question reaches full capacity the
    /// sequencer advances immediately instead of waiting for the timer.
    pub async fn submit_answer(
        self: &Arc<Self>,
        room_code: &str,
        question_index: usize,
        username: &str,
        selected_option: &str,
    ) {
        let room_code = normalize_code(room_code);

        match self
            .registry
            .record_answer(&room_code, question_index, username, selected_option)
            .await
        {
            Some(RecordOutcome::Recorded { answers_for_question }) => {
                tracing::debug!(
                    room_code = %room_code,
                    question_index,
                    username = %username,
                    answers_for_question,
                    "Answer recorded"
                );
                if answers_for_question >= ROOM_CAPACITY {
                    let step = self.registry.advance_question(&room_code, question_index, true).await;
                    self.apply_step(&room_code, step).await;
                }
            }
            Some(RecordOutcome::StaleIndex) => {
                tracing::debug!(room_code = %room_code, question_index, "Stale answer ignored");
            }
            Some(RecordOutcome::AlreadyAnswered) => {
                tracing::debug!(
                    room_code = %room_code,
                    question_index,
                    username = %username,
                    "Duplicate answer ignored"
                );
            }
            None => {
                tracing::debug!(room_code = %room_code, "Answer for unknown room ignored");
            }
        }
    }

    pub async fn disconnect(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);

        if let Some(outcome) = self.registry.remove_connection(conn_id).await {
            tracing::info!(
                conn_id = %conn_id,
                room_code = %outcome.room_code,
                emptied = outcome.emptied,
                "Participant disconnected"
            );
        }
    }

    /// Applies one sequencer step: broadcast the next question and arm its
    /// timer, or broadcast the final results. Boxed because the question
    /// timer re-enters this path when it fires.
    fn apply_step<'a>(self: &'a Arc<Self>, room_code: &'a str, step: Step) -> BoxFuture<'a, ()> {
        async move {
            match step {
                Step::Question(dispatch) => {
                    let question_index = dispatch.question_index;
                    self.broadcast(
                        room_code,
                        &ServerMessage::NextQuestion {
                            question_index: dispatch.question_index,
                            question: dispatch.question,
                            question_number: dispatch.question_number,
                            total_questions: dispatch.total_questions,
                        },
                    )
                    .await;
                    self.arm_question_timer(room_code, question_index).await;
                }
                Step::Finished(summary) => {
                    let summary = *summary;
                    self.broadcast(
                        room_code,
                        &ServerMessage::QuizEnded {
                            scores: summary.scores,
                            winner: summary.winner,
                            all_answers: summary.all_answers,
                            players: summary.players,
                            questions: summary.questions,
                        },
                    )
                    .await;
                }
                Step::Stale => {}
            }
        }
        .boxed()
    }

    /// Arms the per-question timeout. The spawned task re-checks the live
    /// index through the registry guard, so a timer that lost the race to a
    /// completion-triggered advance is a no-op even if it was not aborted in
    /// time.
    async fn arm_question_timer(self: &Arc<Self>, room_code: &str, question_index: usize) {
        let server = self.clone();
        let code = room_code.to_string();
        let timeout = self.config.question_timeout;

        let handle = tokio::spawn(async move {
            sleep(timeout).await;
            tracing::debug!(room_code = %code, question_index, "Question timer fired");
            let step = server.registry.advance_question(&code, question_index, false).await;
            server.apply_step(&code, step).await;
        });

        self.registry.arm_timer(room_code, question_index, handle).await;
    }

    async fn broadcast(&self, room_code: &str, message: &ServerMessage) {
        self.send_to_members(room_code, None, message).await;
    }

    async fn broadcast_except(&self, room_code: &str, except: &str, message: &ServerMessage) {
        self.send_to_members(room_code, Some(except), message).await;
    }

    async fn send_to_members(&self, room_code: &str, except: Option<&str>, message: &ServerMessage) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast");
                return;
            }
        };

        let members = self.registry.members(room_code).await;
        let connections = self.connections.read().await;

        for conn_id in members {
            if except == Some(conn_id.as_str()) {
                continue;
            }
            if let Some(sender) = connections.get(&conn_id) {
                if sender.send(Message::text(text.clone())).is_err() {
                    tracing::debug!(conn_id = %conn_id, "Dropped message for closed connection");
                }
            }
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::{QuizError, Result};

use super::question_bank::Question;
use super::scoring::SessionSummary;
use super::session::{QuestionDispatch, RecordOutcome, Session, ROOM_CAPACITY};

const CODE_LENGTH: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CREATE_ATTEMPTS: u32 = 5;

/// Room codes are matched case-insensitively; everything is stored uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub conn_id: String,
    pub username: Option<String>,
}

impl Participant {
    /// Legacy handle-only joins have no username.
    pub fn display_name(&self) -> String {
        self.username.clone().unwrap_or_else(|| "User".to_string())
    }
}

/// One active room: its membership plus, while a quiz runs, its session.
#[derive(Debug, Default)]
struct Room {
    participants: Vec<Participant>,
    session: Option<Session>,
}

#[derive(Debug)]
pub struct JoinOutcome {
    /// False for an idempotent re-join of an already-present handle.
    pub newly_added: bool,
    /// True exactly when the participant list grew to capacity.
    pub became_ready: bool,
    /// Display names in join order.
    pub roster: Vec<String>,
}

#[derive(Debug)]
pub struct DisconnectOutcome {
    pub room_code: String,
    pub emptied: bool,
}

/// Result of one sequencer step: either the next question to broadcast, the
/// final results after session teardown, or nothing because the triggering
/// event referred to an index (or room) that is no longer live.
#[derive(Debug)]
pub enum Step {
    Question(QuestionDispatch),
    Finished(Box<SessionSummary>),
    Stale,
}

/// Owns every active room and its session state. All mutations for a room
/// happen inside a single write-lock critical section, so events for the
/// same room are applied strictly one at a time.
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
            .collect()
    }

    /// Reserves a fresh room code, retrying a bounded number of times on
    /// collision with an active room.
    pub async fn create_room(&self) -> Result<String> {
        let mut rooms = self.rooms.write().await;

        for _ in 0..CREATE_ATTEMPTS {
            let code = Self::generate_code();
            if !rooms.contains_key(&code) {
                rooms.insert(code.clone(), Room::default());
                tracing::info!(room_code = %code, "Room created");
                return Ok(code);
            }
        }

        Err(QuizError::CollisionExhausted(CREATE_ATTEMPTS))
    }

    /// Adds a connection to a room. Unknown rooms are a no-op (`None`).
    /// Re-joining is idempotent for the list but a named re-join may refresh
    /// the stored display name.
    pub async fn join(
        &self,
        code: &str,
        conn_id: &str,
        username: Option<String>,
    ) -> Option<JoinOutcome> {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&code)?;

        let newly_added = !room.participants.iter().any(|p| p.conn_id == conn_id);
        if newly_added {
            room.participants.push(Participant {
                conn_id: conn_id.to_string(),
                username,
            });
        } else if username.is_some() {
            if let Some(p) = room.participants.iter_mut().find(|p| p.conn_id == conn_id) {
                p.username = username;
            }
        }

        let became_ready = newly_added && room.participants.len() == ROOM_CAPACITY;
        if became_ready {
            tracing::info!(room_code = %code, "Room at capacity, ready to play");
        }

        Some(JoinOutcome {
            newly_added,
            became_ready,
            roster: room.participants.iter().map(Participant::display_name).collect(),
        })
    }

    /// Connection handles of everyone in the room, for broadcast fan-out.
    pub async fn members(&self, code: &str) -> Vec<String> {
        let code = normalize_code(code);
        let rooms = self.rooms.read().await;
        rooms
            .get(&code)
            .map(|room| room.participants.iter().map(|p| p.conn_id.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn room_exists(&self, code: &str) -> bool {
        let rooms = self.rooms.read().await;
        rooms.contains_key(&normalize_code(code))
    }

    /// Creates a fresh session for the room and dispatches question 0. A
    /// room without exactly two players cannot start; an empty question list
    /// finishes immediately without retaining a session.
    pub async fn begin_quiz(
        &self,
        code: &str,
        category: &str,
        questions: Vec<Question>,
    ) -> Result<Step> {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(&code)
            .ok_or_else(|| QuizError::RoomNotFound(code.clone()))?;

        if room.participants.len() != ROOM_CAPACITY {
            return Err(QuizError::RoomNotReady(code.clone()));
        }

        // Restarting replaces any game already in flight.
        if let Some(mut previous) = room.session.take() {
            previous.cancel_timer();
            tracing::warn!(room_code = %code, "Discarding in-flight session on restart");
        }

        let players = [
            room.participants[0].display_name(),
            room.participants[1].display_name(),
        ];
        let mut session = Session::new(category.to_string(), questions, players);

        match session.dispatch_current() {
            Some(dispatch) => {
                room.session = Some(session);
                Ok(Step::Question(dispatch))
            }
            None => Ok(Step::Finished(Box::new(session.into_summary()))),
        }
    }

    /// Guarded compare-and-advance. The caller names the index it believes
    /// just completed; if the live pointer has already moved past it (the
    /// other advance path won the race) the step is `Stale` and nothing
    /// changes. `cancel_timer` is set on the completion path so the pending
    /// timeout for the finished question is actively disarmed.
    pub async fn advance_question(
        &self,
        code: &str,
        completed_index: usize,
        cancel_timer: bool,
    ) -> Step {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(&code) else {
            return Step::Stale;
        };

        let dispatched = {
            let Some(session) = room.session.as_mut() else {
                return Step::Stale;
            };
            if session.current_index() != completed_index {
                return Step::Stale;
            }
            if cancel_timer {
                session.cancel_timer();
            }
            session.advance();
            session.dispatch_current()
        };

        match dispatched {
            Some(dispatch) => Step::Question(dispatch),
            None => match room.session.take() {
                Some(session) => {
                    tracing::info!(
                        room_code = %code,
                        category = %session.category(),
                        "Quiz finished"
                    );
                    Step::Finished(Box::new(session.into_summary()))
                }
                None => Step::Stale,
            },
        }
    }

    /// Records an answer against the room's live session. `None` means the
    /// room has no tracked session (missing room, or quiz not running).
    pub async fn record_answer(
        &self,
        code: &str,
        question_index: usize,
        username: &str,
        selected_option: &str,
    ) -> Option<RecordOutcome> {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let session = rooms.get_mut(&code)?.session.as_mut()?;
        Some(session.record_answer(question_index, username, selected_option))
    }

    /// Stores the timer handle for the question it was armed against. If the
    /// index already advanced while the timer task was being spawned, the
    /// handle is aborted instead of stored.
    pub async fn arm_timer(&self, code: &str, question_index: usize, handle: JoinHandle<()>) {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let session = rooms.get_mut(&code).and_then(|room| room.session.as_mut());
        match session {
            Some(session) if session.current_index() == question_index => {
                session.set_timer(handle);
            }
            _ => handle.abort(),
        }
    }

    /// Drops a connection from whichever room holds it. When the room
    /// empties, the room entry and all its session state are released
    /// atomically (cancelling any pending timer).
    pub async fn remove_connection(&self, conn_id: &str) -> Option<DisconnectOutcome> {
        let mut rooms = self.rooms.write().await;

        let code = rooms
            .iter()
            .find(|(_, room)| room.participants.iter().any(|p| p.conn_id == conn_id))
            .map(|(code, _)| code.clone())?;

        let room = rooms.get_mut(&code)?;
        room.participants.retain(|p| p.conn_id != conn_id);

        let emptied = room.participants.is_empty();
        if emptied {
            if let Some(mut room) = rooms.remove(&code) {
                if let Some(mut session) = room.session.take() {
                    session.cancel_timer();
                }
            }
            tracing::info!(room_code = %code, "Last participant left, room torn down");
        }

        Some(DisconnectOutcome { room_code: code, emptied })
    }
}

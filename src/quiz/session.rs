use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::question_bank::Question;
use super::scoring::{self, SessionSummary};

/// Designed room capacity. Winner computation and the "both answered"
/// completion condition assume exactly two players.
pub const ROOM_CAPACITY: usize = 2;

/// One recorded answer for one question index.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEntry {
    pub username: String,
    pub selected_option: String,
}

/// Per-question review entry broadcast in the final results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub question: String,
    pub correct_answer: String,
    pub user1_answer: String,
    pub user2_answer: String,
}

/// Payload data for a "next question" broadcast.
#[derive(Debug, Clone)]
pub struct QuestionDispatch {
    pub question_index: usize,
    pub question: Question,
    pub question_number: usize,
    pub total_questions: usize,
}

#[derive(Debug, PartialEq)]
pub enum RecordOutcome {
    Recorded { answers_for_question: usize },
    StaleIndex,
    AlreadyAnswered,
}

/// Mutable per-room game state. Exists only while a quiz is in progress and
/// is destroyed atomically when the quiz finishes or the room empties.
#[derive(Debug)]
pub struct Session {
    category: String,
    questions: Vec<Question>,
    /// Roster in join order; slot 0 is user1 in the comparison log.
    players: [String; 2],
    current_index: usize,
    answers: HashMap<usize, Vec<AnswerEntry>>,
    scores: HashMap<String, u32>,
    comparisons: Vec<ComparisonEntry>,
    timer: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(category: String, questions: Vec<Question>, players: [String; 2]) -> Self {
        Self {
            category,
            questions,
            players,
            current_index: 0,
            answers: HashMap::new(),
            scores: HashMap::new(),
            comparisons: Vec::new(),
            timer: None,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Moves the live pointer forward by exactly one question.
    pub fn advance(&mut self) {
        self.current_index += 1;
    }

    /// Opens the current question: creates its empty answer set and its
    /// comparison entry, and returns the broadcast payload. `None` means the
    /// pointer has run past the question list and the quiz is over.
    pub fn dispatch_current(&mut self) -> Option<QuestionDispatch> {
        let question = self.questions.get(self.current_index)?.clone();

        self.answers.entry(self.current_index).or_default();
        self.comparisons.push(ComparisonEntry {
            question: question.prompt.clone(),
            correct_answer: question.answer.clone(),
            user1_answer: String::new(),
            user2_answer: String::new(),
        });

        Some(QuestionDispatch {
            question_index: self.current_index,
            question,
            question_number: self.current_index + 1,
            total_questions: self.questions.len(),
        })
    }

    /// Records one answer for the live question. Stale indices and repeat
    /// submissions from the same participant are rejected without side
    /// effects. An exact string match against the correct option scores one
    /// point; either way the participant's score entry is created.
    pub fn record_answer(&mut self, index: usize, username: &str, selected: &str) -> RecordOutcome {
        if index != self.current_index {
            return RecordOutcome::StaleIndex;
        }
        let Some(question) = self.questions.get(index).cloned() else {
            return RecordOutcome::StaleIndex;
        };
        // The answer set only exists once the question has been dispatched.
        let Some(entries) = self.answers.get_mut(&index) else {
            return RecordOutcome::StaleIndex;
        };
        if entries.iter().any(|e| e.username == username) {
            return RecordOutcome::AlreadyAnswered;
        }

        entries.push(AnswerEntry {
            username: username.to_string(),
            selected_option: selected.to_string(),
        });

        let answers_for_question = entries.len();

        let score = self.scores.entry(username.to_string()).or_insert(0);
        if selected == question.answer {
            *score += 1;
        }

        let selected_by = |name: &str| {
            entries
                .iter()
                .find(|e| e.username == name)
                .map(|e| e.selected_option.clone())
                .unwrap_or_default()
        };
        let user1_answer = selected_by(&self.players[0]);
        let user2_answer = selected_by(&self.players[1]);

        // Create-or-update, matched by question text.
        match self.comparisons.iter_mut().find(|c| c.question == question.prompt) {
            Some(entry) => {
                entry.user1_answer = user1_answer;
                entry.user2_answer = user2_answer;
            }
            None => self.comparisons.push(ComparisonEntry {
                question: question.prompt.clone(),
                correct_answer: question.answer.clone(),
                user1_answer,
                user2_answer,
            }),
        }

        RecordOutcome::Recorded { answers_for_question }
    }

    /// Stores the timer handle for the live question, cancelling any handle
    /// left over from a previous question.
    pub fn set_timer(&mut self, handle: JoinHandle<()>) {
        self.cancel_timer();
        self.timer = Some(handle);
    }

    pub fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    /// Tears the session down into the final results payload.
    pub fn into_summary(mut self) -> SessionSummary {
        self.cancel_timer();
        let winner = scoring::compute_winner(&self.scores, &self.players);
        SessionSummary {
            scores: self.scores,
            winner,
            all_answers: self.comparisons,
            players: self.players.to_vec(),
            questions: self.questions,
        }
    }
}

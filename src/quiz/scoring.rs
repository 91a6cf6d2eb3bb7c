use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::question_bank::Question;
use super::session::{ComparisonEntry, ROOM_CAPACITY};

/// Winner value reported when both players finish on the same score.
pub const DRAW: &str = "Draw";

/// Final results payload broadcast as "quiz-ended".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub scores: HashMap<String, u32>,
    pub winner: Option<String>,
    pub all_answers: Vec<ComparisonEntry>,
    pub players: Vec<String>,
    pub questions: Vec<Question>,
}

/// Two-player comparison in roster order. Fewer than two recorded score
/// entries means nobody can be declared a winner.
pub fn compute_winner(scores: &HashMap<String, u32>, players: &[String; 2]) -> Option<String> {
    if scores.len() < ROOM_CAPACITY {
        return None;
    }

    let first = scores.get(&players[0]).copied().unwrap_or(0);
    let second = scores.get(&players[1]).copied().unwrap_or(0);

    if first > second {
        Some(players[0].clone())
    } else if second > first {
        Some(players[1].clone())
    } else {
        Some(DRAW.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> [String; 2] {
        ["A".to_string(), "B".to_string()]
    }

    fn scores(entries: &[(&str, u32)]) -> HashMap<String, u32> {
        entries.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    #[test]
    fn test_higher_score_wins() {
        let winner = compute_winner(&scores(&[("A", 5), ("B", 2)]), &roster());
        assert_eq!(winner.as_deref(), Some("A"));

        let winner = compute_winner(&scores(&[("A", 1), ("B", 4)]), &roster());
        assert_eq!(winner.as_deref(), Some("B"));
    }

    #[test]
    fn test_equal_scores_draw() {
        let winner = compute_winner(&scores(&[("A", 3), ("B", 3)]), &roster());
        assert_eq!(winner.as_deref(), Some(DRAW));
    }

    #[test]
    fn test_single_entry_has_no_winner() {
        assert_eq!(compute_winner(&scores(&[("A", 1)]), &roster()), None);
    }

    #[test]
    fn test_empty_scores_have_no_winner() {
        assert_eq!(compute_winner(&HashMap::new(), &roster()), None);
    }
}

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A single quiz question. `prompt` is serialized as `question` to match the
/// payload the browser client renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
}

static BANK: OnceLock<HashMap<&'static str, Vec<Question>>> = OnceLock::new();

fn question(prompt: &str, options: [&str; 4], answer: &str) -> Question {
    Question {
        prompt: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        answer: answer.to_string(),
    }
}

fn build_bank() -> HashMap<&'static str, Vec<Question>> {
    let mut bank = HashMap::new();

    bank.insert(
        "Computer Science",
        vec![
            question(
                "What does CPU stand for?",
                [
                    "Central Processing Unit",
                    "Computer Processing Unit",
                    "Central Performance Unit",
                    "Control Program Unit",
                ],
                "Central Processing Unit",
            ),
            question(
                "What is RAM used for?",
                ["Long-term storage", "Display", "Short-term memory", "Power supply"],
                "Short-term memory",
            ),
        ],
    );

    bank.insert(
        "General Knowledge",
        vec![
            question(
                "What is the capital of India?",
                ["Mumbai", "Delhi", "Chennai", "Kolkata"],
                "Delhi",
            ),
            question(
                "Which planet is known as the Red Planet?",
                ["Venus", "Jupiter", "Mars", "Saturn"],
                "Mars",
            ),
        ],
    );

    bank.insert(
        "DSA",
        vec![
            question(
                "Which data structure works on the principle of FIFO?",
                ["Stack", "Queue", "Tree", "Graph"],
                "Queue",
            ),
            question(
                "Which data structure works on the principle of LIFO?",
                ["Stack", "Queue", "Heap", "Graph"],
                "Stack",
            ),
            question(
                "What is the time complexity of binary search on a sorted array?",
                ["O(n)", "O(log n)", "O(n log n)", "O(1)"],
                "O(log n)",
            ),
            question(
                "Which data structure is used to implement breadth-first search?",
                ["Stack", "Queue", "Priority queue", "Linked list"],
                "Queue",
            ),
            question(
                "Which data structure backs recursive function calls?",
                ["Queue", "Heap", "Stack", "Graph"],
                "Stack",
            ),
        ],
    );

    bank.insert(
        "Output Prediction",
        vec![
            question(
                "What will be the output of: console.log(2 + '2');",
                ["22", "4", "Error", "undefined"],
                "22",
            ),
            question(
                "What will be the output of: console.log(typeof null);",
                ["null", "object", "undefined", "string"],
                "object",
            ),
        ],
    );

    bank.insert(
        "Syntactical Error",
        vec![
            question(
                "Find the syntax error: console.log('Hello World)",
                [
                    "Missing semicolon",
                    "Missing closing quote",
                    "Incorrect function name",
                    "Extra bracket",
                ],
                "Missing closing quote",
            ),
            question(
                "Find the syntax error: if(x = 5) { console.log(x); }",
                [
                    "Use of '=' instead of '==' or '==='",
                    "Missing parenthesis",
                    "Extra semicolon",
                    "Invalid variable name",
                ],
                "Use of '=' instead of '==' or '==='",
            ),
        ],
    );

    bank.insert(
        "Basic Programming",
        vec![
            question(
                "Which symbol is used to end a statement in C, C++, and Java?",
                [";", ":", ".", ","],
                ";",
            ),
            question(
                "Which keyword is used to define a function in Python?",
                ["function", "def", "fun", "define"],
                "def",
            ),
        ],
    );

    bank
}

fn bank() -> &'static HashMap<&'static str, Vec<Question>> {
    BANK.get_or_init(build_bank)
}

/// Questions for a category. Unknown categories resolve to an empty list,
/// which produces an immediate empty-game finish rather than an error.
pub fn category_questions(name: &str) -> Vec<Question> {
    bank().get(name).cloned().unwrap_or_default()
}

/// All known category names, sorted for stable output.
#[allow(dead_code)]
pub fn categories() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = bank().keys().copied().collect();
    names.sort_unstable();
    names
}

mod question_bank;
mod room;
mod scoring;
mod server;
mod session;
mod signaling;

pub use server::QuizServer;
pub use signaling::{ClientMessage, QuizMessageHandler};

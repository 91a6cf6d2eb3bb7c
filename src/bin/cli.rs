// Quiz Server CLI Validation Tool
// Exercises the HTTP endpoints and the WebSocket game protocol against a running server

use clap::{Parser, Subcommand};
use colored::*;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "quiz-cli")]
#[command(about = "Quiz Server CLI Validation Tool", long_about = None)]
struct Cli {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health endpoint
    Health,

    /// Create a room over HTTP and print its code
    CreateRoom,

    /// Test WebSocket connection
    Connect,

    /// Join a room and print every event the server broadcasts
    Watch {
        /// Room code to join
        #[arg(short, long)]
        room: String,

        /// Display name to join with
        #[arg(short, long)]
        username: String,
    },

    /// Join a room and immediately start a game in it
    StartGame {
        /// Room code to join
        #[arg(short, long)]
        room: String,

        /// Display name to join with
        #[arg(short, long)]
        username: String,

        /// Quiz category name
        #[arg(short, long)]
        category: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Health => check_health(&cli.server).await,
        Commands::CreateRoom => create_room(&cli.server).await,
        Commands::Connect => test_connect(&cli.server).await,
        Commands::Watch { room, username } => watch_room(&cli.server, &room, &username, None).await,
        Commands::StartGame { room, username, category } => {
            watch_room(&cli.server, &room, &username, Some(category)).await
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

async fn check_health(server: &str) -> CliResult {
    let url = format!("http://{}/api/health", server);
    let body: serde_json::Value = reqwest::get(&url).await?.json().await?;

    if body["status"] == "healthy" {
        println!("{} {}", "✓".green().bold(), "Server is healthy".green());
    } else {
        println!("{} unexpected response: {}", "✗".red().bold(), body);
    }
    Ok(())
}

async fn create_room(server: &str) -> CliResult {
    let url = format!("http://{}/api/create-room", server);
    let client = reqwest::Client::new();
    let resp = client.post(&url).send().await?;
    let status = resp.status();
    let body: serde_json::Value = resp.json().await?;

    if status.is_success() {
        let code = body["roomCode"].as_str().unwrap_or("?");
        println!("{} Room created: {}", "✓".green().bold(), code.cyan().bold());
    } else {
        println!("{} {}", "✗".red().bold(), body["error"]);
    }
    Ok(())
}

async fn test_connect(server: &str) -> CliResult {
    let url = format!("ws://{}/quiz", server);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("{} WebSocket connection established", "✓".green().bold());
    drop(ws_stream);
    Ok(())
}

/// Joins a room, optionally starts a game, and prints broadcasts until the
/// quiz ends or the connection closes.
async fn watch_room(
    server: &str,
    room: &str,
    username: &str,
    start_category: Option<String>,
) -> CliResult {
    let url = format!("ws://{}/quiz", server);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    let join = json!({ "type": "joinRoom", "room": room, "username": username });
    write.send(Message::Text(join.to_string())).await?;
    println!("{} Joined room {} as {}", "✓".green().bold(), room.cyan(), username.cyan());

    if let Some(category) = start_category {
        println!("{} Requesting game start ({})", "✓".green().bold(), category.cyan());
        let start = json!({ "type": "start-game", "roomCode": room, "category": category });
        write.send(Message::Text(start.to_string())).await?;
    }

    while let Some(message) = read.next().await {
        let message = message?;
        let Ok(text) = message.into_text() else { continue };
        if text.is_empty() {
            continue;
        }
        let event: serde_json::Value = match serde_json::from_str(&text) {
            Ok(event) => event,
            Err(_) => continue,
        };

        match event["type"].as_str() {
            Some("next-question") => {
                println!(
                    "{} Question {}/{}: {}",
                    "?".yellow().bold(),
                    event["questionNumber"],
                    event["totalQuestions"],
                    event["question"]["question"]
                );
            }
            Some("quiz-ended") => {
                println!("{} Quiz ended", "★".yellow().bold());
                println!("  scores: {}", event["scores"]);
                println!("  winner: {}", event["winner"].to_string().cyan().bold());
                break;
            }
            Some(event_type) => {
                println!("{} {}: {}", "·".blue(), event_type.blue(), event);
            }
            None => {}
        }
    }

    Ok(())
}

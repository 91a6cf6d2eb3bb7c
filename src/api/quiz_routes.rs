use std::sync::Arc;

use warp::http::StatusCode;
use warp::Filter;

use crate::quiz::QuizServer;

use super::quiz_websocket;

/// WebSocket endpoint carrying all game signaling.
pub fn quiz_websocket_route(
    server: Arc<QuizServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("quiz")
        .and(warp::ws())
        .and(with_server(server))
        .map(|ws: warp::ws::Ws, server: Arc<QuizServer>| {
            ws.on_upgrade(move |websocket| quiz_websocket::handle_quiz_websocket(websocket, server))
        })
}

/// POST /api/create-room -> 200 {roomCode} | 500 {error}
pub fn create_room_route(
    server: Arc<QuizServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "create-room")
        .and(warp::post())
        .and(with_server(server))
        .and_then(handle_create_room)
}

async fn handle_create_room(server: Arc<QuizServer>) -> Result<impl warp::Reply, warp::Rejection> {
    match server.create_room().await {
        Ok(room_code) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "roomCode": room_code })),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create room");
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({ "error": e.to_string() })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

pub fn health_check() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "health")
        .and(warp::get())
        .map(|| {
            warp::reply::json(&serde_json::json!({
                "status": "healthy",
                "service": "Quiz Server",
                "version": "1.0.0"
            }))
        })
}

/// The browser client; no semantic contract beyond being reachable.
pub fn static_assets(
    dir: &str,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::fs::dir(dir.to_string())
}

pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"])
}

fn with_server(
    server: Arc<QuizServer>,
) -> impl Filter<Extract = (Arc<QuizServer>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || server.clone())
}

mod api;
mod config;
mod error;
mod quiz;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use warp::Filter;

use config::Config;
use quiz::QuizServer;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = Arc::new(QuizServer::new(config.quiz.clone()));

    let routes = api::quiz_routes::quiz_websocket_route(server.clone())
        .or(api::quiz_routes::create_room_route(server))
        .or(api::quiz_routes::health_check())
        .or(api::quiz_routes::static_assets(&config.server.static_dir))
        .with(api::quiz_routes::cors());

    let addr = config.bind_address();
    tracing::info!(port = addr.1, "Quiz server listening");

    warp::serve(routes).run(addr).await;
}

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoodwink::config::CoordinatorConfig;
use hoodwink::questions::{DirQuestionProvider, FixedQuestionProvider, QuestionProvider};
use hoodwink::state::AppState;
use hoodwink::{api, tasks, ws};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoodwink=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hoodwink...");

    let config = CoordinatorConfig::from_env();

    // Question assets live outside this process; fall back to a
    // placeholder set so the coordinator still comes up without them.
    let questions: Arc<dyn QuestionProvider> = if config.question_root.is_dir() {
        Arc::new(DirQuestionProvider::new(config.question_root.clone()))
    } else {
        tracing::warn!(
            "Question root {:?} not found, using built-in placeholder set",
            config.question_root
        );
        Arc::new(FixedQuestionProvider::sample(12))
    };

    let port = config.port;
    let state = Arc::new(AppState::new(config, questions));

    // Background tasks: debounced room list broadcast and tombstone GC
    tasks::spawn_room_list_broadcaster(state.clone());
    tasks::spawn_closed_room_sweeper(state.clone());

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/rooms", get(api::list_rooms))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

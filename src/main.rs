#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{
    Router, middleware,
    http::{Method, header},
    routing::{get, post},
};
use flowboard::api::{AppState, auth, diagrams, middleware::auth_middleware};
use flowboard::{AppCore, paths};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "flowboard is working!".to_string(),
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flowboard=debug".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Flowboard server");

    let db_path =
        paths::ensure_database_path_string().expect("Failed to determine Flowboard database path");
    let core = Arc::new(AppCore::new(&db_path).expect("Failed to initialize app core"));
    let state = AppState::new(core);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(health))
        // Session management
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Diagram management (RESTful)
        .route(
            "/api/diagrams",
            get(diagrams::list_diagrams).post(diagrams::create_diagram),
        )
        .route(
            "/api/diagrams/{id}",
            get(diagrams::get_diagram)
                .put(diagrams::save_diagram)
                .delete(diagrams::delete_diagram),
        )
        .route("/api/diagrams/{id}/share", post(diagrams::share_diagram))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");

    tracing::info!("Flowboard running on http://localhost:3000");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

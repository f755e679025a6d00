//! Query surface — Axum web server over the signal store.
//!
//! Serves the outward-facing read/delete boundary as JSON.
//! CORS enabled for local dashboards.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::ApiState;

/// Start the API web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_api(state: ApiState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "API server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind API port");

        axum::serve(listener, app)
            .await
            .expect("API server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/signals", get(routes::get_signals))
        .route("/api/signals/:id", delete(routes::delete_signal))
        .route("/api/stats", get(routes::get_stats))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

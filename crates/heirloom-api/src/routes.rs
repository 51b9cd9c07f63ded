//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, and all
//! endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState, port: u16) -> Router {
    // CORS: allow localhost origins for the questionnaire page, on the
    // configured port plus port+1 for a dev server.
    let dev_port = port.saturating_add(1);
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
        format!("http://127.0.0.1:{}", dev_port),
        format!("http://localhost:{}", dev_port),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/submissions/{id}",
            get(handlers::get_submission).delete(handlers::delete_submission),
        )
        .route(
            "/api/submissions/{id}/answers",
            get(handlers::get_answers).put(handlers::upsert_answer),
        )
        .route("/api/timer/beacon", post(handlers::timer_beacon))
        .layer(DefaultBodyLimit::max(64 * 1024)) // answers are short text
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server, bound to localhost only.
pub async fn start_server(
    state: AppState,
    port: u16,
) -> Result<(), heirloom_core::error::HeirloomError> {
    let addr = format!("127.0.0.1:{}", port);
    let router = create_router(state, port);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| heirloom_core::error::HeirloomError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| heirloom_core::error::HeirloomError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

// Server module - HTTP server setup and routing
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::errors::ServerError;
pub use self::error::ApiError;
pub use self::state::AppState;

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState, cors_allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/writeups",
            get(handlers::list_writeups).post(handlers::create_writeup),
        )
        .route("/writeups/top", get(handlers::top_writeups))
        .route(
            "/writeups/:id",
            get(handlers::get_writeup).delete(handlers::delete_writeup),
        )
        .route("/writeups/:id/votes", post(handlers::cast_vote))
        .route("/writeups/:id/votes/me", get(handlers::current_vote))
        .layer(create_cors_layer(cors_allowed_origins))
        .with_state(state)
}

/// Create CORS layer for the configured browser origins
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Run the server on the specified address until a shutdown signal arrives
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

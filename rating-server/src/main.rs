//! Rating Server Main Entry Point
//!
//! Serves the writeup listing and voting API over HTTP.

use dotenv::dotenv;
use rating_server::config::LogFormat;
use rating_server::server::{AppState, create_app, run_server};
use rating_server::{Dependencies, ServerError, Settings};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("rating_server=info,rating_engine=info,rating_repository=info")
    });

    match LogFormat::from_env() {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
                .init();
        }
    }

    info!(
        service_name = "rating-server",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    dotenv().ok();
    init_tracing();

    info!("Starting Rating Server");

    let settings = Settings::from_env().inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    let addr = settings.listen_addr()?;

    let deps = match Dependencies::new(&settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let app = create_app(AppState::from(deps), &settings.cors_allowed_origins);

    match run_server(app, addr).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Server failed");
            Err(e)
        }
    }
}

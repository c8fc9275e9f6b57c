//! Dependency initialization and wiring for the rating server.

use std::sync::Arc;
use std::time::Duration;

use rating_engine::{
    AuthProvider, ContentService, StaticTokenAuthProvider, VotingService, VotingServiceConfig,
};
use rating_repository::postgres::run_migrations;
use rating_repository::{
    ContentRepository, InMemoryRepository, PostgresContentRepository, PostgresVotingRepository,
    VotingRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{ConnectionMode, Settings, StorageBackend};
use crate::errors::ServerError;

/// `Dependencies` holds the services the HTTP layer dispatches to.
pub struct Dependencies {
    pub voting: Arc<VotingService>,
    pub content: Arc<ContentService>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Dependencies {
    /// Build every service described by `settings`.
    ///
    /// For the postgres backend this connects (retrying if configured to)
    /// and applies pending migrations before returning.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServerError)` - If initialization fails (only in fail-fast mode for connectivity)
    pub async fn new(settings: &Settings) -> Result<Self, ServerError> {
        info!(
            storage_backend = ?settings.storage_backend,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            max_conflict_retries = settings.max_conflict_retries,
            "Initializing dependencies"
        );

        let (voting_repository, content_repository): (
            Arc<dyn VotingRepository>,
            Arc<dyn ContentRepository>,
        ) = match settings.storage_backend {
            StorageBackend::Postgres => {
                let database_url = settings.database_url.as_deref().ok_or_else(|| {
                    ServerError::config("DATABASE_URL must be set for the postgres backend")
                })?;
                let pool = Self::connect_to_postgres(
                    database_url,
                    settings.max_connections,
                    settings.connection_mode,
                    settings.retry_interval,
                )
                .await?;

                run_migrations(&pool).await?;
                info!("Database migrations applied");

                (
                    Arc::new(PostgresVotingRepository::new(pool.clone()).await?),
                    Arc::new(PostgresContentRepository::new(pool).await?),
                )
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage, data will not survive a restart");
                let repository = InMemoryRepository::new();
                (Arc::new(repository.clone()), Arc::new(repository))
            }
        };

        let auth = StaticTokenAuthProvider::parse(&settings.auth_tokens)?;
        if auth.is_empty() {
            warn!("AUTH_TOKENS is empty, every vote will be rejected as unauthenticated");
        } else {
            info!(principals = auth.len(), "Static auth tokens loaded");
        }

        Ok(Self::from_parts(
            voting_repository,
            content_repository,
            Arc::new(auth),
            VotingServiceConfig::with_max_conflict_retries(settings.max_conflict_retries),
        ))
    }

    /// Wire services around already constructed repositories.
    pub fn from_parts(
        voting_repository: Arc<dyn VotingRepository>,
        content_repository: Arc<dyn ContentRepository>,
        auth: Arc<dyn AuthProvider>,
        voting_config: VotingServiceConfig,
    ) -> Self {
        Self {
            voting: Arc::new(VotingService::with_config(voting_repository, voting_config)),
            content: Arc::new(ContentService::new(content_repository)),
            auth,
        }
    }

    /// Connect to PostgreSQL with retry logic based on connection mode.
    async fn connect_to_postgres(
        url: &str,
        max_connections: u32,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<PgPool, ServerError> {
        loop {
            match PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(url)
                .await
            {
                Ok(pool) => {
                    info!(max_connections, "PostgreSQL connection established");
                    return Ok(pool);
                }
                Err(e) => match mode {
                    ConnectionMode::FailFast => return Err(ServerError::Database(e)),
                    ConnectionMode::Retry => {
                        warn!(
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to PostgreSQL, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}

//! Application state - shared across all handlers.

use std::sync::Arc;

use inkpost_core::ports::{PasswordService, PostRepository, UserRepository};
use inkpost_infra::{Argon2PasswordService, InMemoryPostRepository, InMemoryStore, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use inkpost_infra::database::{DatabaseConnections, PostgresPostRepository, PostgresUserRepository};

use crate::config::AppConfig;
use crate::middleware::auth::SessionConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub passwords: Arc<dyn PasswordService>,
    pub session: SessionConfig,
    pub media_url: String,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state, falling back to the in-memory store when
    /// no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    if config.run_migrations {
                        run_migrations(&connections).await;
                    }

                    let conn = Arc::new(connections);
                    tracing::info!("Application state initialized (postgres)");
                    return Self {
                        posts: Arc::new(PostgresPostRepository::new(conn.main.clone())),
                        users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
                        passwords: Arc::new(Argon2PasswordService::new()),
                        session: config.session.clone(),
                        media_url: config.media_url.clone(),
                        db: Some(conn),
                    };
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        let mut state = Self::in_memory(config.session.clone());
        state.media_url = config.media_url.clone();
        tracing::info!("Application state initialized (in-memory)");
        state
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(session: SessionConfig) -> Self {
        let store = InMemoryStore::new();
        Self {
            posts: Arc::new(InMemoryPostRepository::new(store.clone())),
            users: Arc::new(InMemoryUserRepository::new(store)),
            passwords: Arc::new(Argon2PasswordService::new()),
            session,
            media_url: "/media/".to_string(),
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    /// Short name of the active storage backend.
    pub fn storage_backend(&self) -> &'static str {
        #[cfg(feature = "postgres")]
        if self.db.is_some() {
            return "postgres";
        }
        "memory"
    }
}

#[cfg(feature = "postgres")]
async fn run_migrations(connections: &DatabaseConnections) {
    use migration::{Migrator, MigratorTrait};

    match Migrator::up(&connections.main, None).await {
        Ok(()) => tracing::info!("Database migrations applied"),
        Err(e) => tracing::error!("Failed to apply migrations: {}", e),
    }
}

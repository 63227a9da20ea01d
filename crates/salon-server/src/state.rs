use crate::config::ServerConfig;
use salon_db::{PgStore, SalonStore};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Used directly by the auth handlers (users, refresh tokens)
    pub pool: PgPool,
    /// Persistence seam for the booking lifecycle
    pub store: Arc<dyn SalonStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(PgStore::new(pool.clone())),
            pool,
            config: Arc::new(config),
        }
    }
}

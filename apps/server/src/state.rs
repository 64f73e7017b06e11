//! Shared application state.
//!
//! Storage and identity are injected dependencies carried in the router
//! state — handlers receive everything through here, nothing lives in
//! module-level globals.

use std::sync::Arc;

use chrono::FixedOffset;

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use kiosk_db::Database;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (internally pooled, cheap to clone).
    pub db: Database,

    /// Token mint and validator.
    pub jwt: Arc<JwtManager>,

    /// The store's reporting offset, resolved once at startup.
    pub report_offset: FixedOffset,

    /// Loaded configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds the state from loaded configuration and a connected
    /// database.
    pub fn new(db: Database, config: ServerConfig, report_offset: FixedOffset) -> Self {
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_lifetime_secs,
        ));

        AppState {
            db,
            jwt,
            report_offset,
            config: Arc::new(config),
        }
    }
}

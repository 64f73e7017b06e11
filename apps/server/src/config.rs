//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! development defaults, and validated once at startup.

use chrono::FixedOffset;

use kiosk_core::DEFAULT_LOW_STOCK_THRESHOLD;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// JWT secret key for signing tokens.
    pub jwt_secret: String,

    /// JWT token lifetime in seconds.
    pub jwt_lifetime_secs: i64,

    /// Fixed reference offset for dashboard calendars, in hours east of
    /// UTC. The store this models runs at -5 (no DST).
    pub report_utc_offset_hours: i32,

    /// Stock threshold for the low-stock alert list.
    pub low_stock_threshold: i64,

    /// Credentials for the admin provisioned on an empty profiles table.
    pub bootstrap_admin_username: String,
    pub bootstrap_admin_password: String,
    pub bootstrap_admin_full_name: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),

            database_path: env_or("DATABASE_PATH", "./kiosk.db"),

            jwt_secret: env_or(
                "JWT_SECRET",
                // In production this MUST be set via environment variable
                "kiosk-dev-secret-change-in-production",
            ),

            jwt_lifetime_secs: env_or("JWT_LIFETIME_SECS", "28800") // 8 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()))?,

            report_utc_offset_hours: env_or("REPORT_UTC_OFFSET_HOURS", "-5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REPORT_UTC_OFFSET_HOURS".to_string()))?,

            low_stock_threshold: env_or(
                "LOW_STOCK_THRESHOLD",
                &DEFAULT_LOW_STOCK_THRESHOLD.to_string(),
            )
            .parse()
            .map_err(|_| ConfigError::InvalidValue("LOW_STOCK_THRESHOLD".to_string()))?,

            bootstrap_admin_username: env_or("ADMIN_USERNAME", "admin"),
            bootstrap_admin_password: env_or("ADMIN_PASSWORD", "admin-dev-password"),
            bootstrap_admin_full_name: env_or("ADMIN_FULL_NAME", "Administrator"),
        };

        // Reject offsets no real store could be in
        if !(-12..=14).contains(&config.report_utc_offset_hours) {
            return Err(ConfigError::InvalidValue(
                "REPORT_UTC_OFFSET_HOURS".to_string(),
            ));
        }

        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }

        Ok(config)
    }

    /// The reporting offset as a chrono type.
    pub fn report_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.report_utc_offset_hours * 3600).ok_or_else(|| {
            ConfigError::InvalidValue("REPORT_UTC_OFFSET_HOURS".to_string())
        })
    }

    /// A configuration suitable for in-process tests: in-memory-ish
    /// defaults, deterministic secrets.
    pub fn for_tests() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_lifetime_secs: 3600,
            report_utc_offset_hours: -5,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            bootstrap_admin_username: "admin".to_string(),
            bootstrap_admin_password: "admin-test-password".to_string(),
            bootstrap_admin_full_name: "Administrator".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

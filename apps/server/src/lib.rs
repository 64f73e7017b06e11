//! # Kiosk POS Server
//!
//! HTTP API for the Kiosk POS system: product catalog management,
//! barcode-driven checkout, sales history, low-stock alerts, dashboard
//! rollups and user administration, behind a JWT identity and role gate.
//!
//! The binary in `main.rs` wires configuration, the database and the
//! router together; everything else lives here so the router can also be
//! driven in-process by tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

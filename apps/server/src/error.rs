//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Flow in the Server                           │
//! │                                                                         │
//! │  Handler returns Result<Json<T>, ApiError>                              │
//! │         │                                                               │
//! │         ├── ValidationError / CoreError ──┐                             │
//! │         ├── DbError ──────────────────────┼──► ApiError { code, msg }   │
//! │         └── auth failures ────────────────┘           │                 │
//! │                                                       ▼                 │
//! │                              IntoResponse: HTTP status from the code,   │
//! │                              JSON body { "code": "...", "message": … }  │
//! │                                                                         │
//! │  Internals (SQL text, secrets) are logged via tracing and never leak    │
//! │  into the response body.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use kiosk_core::CoreError;
use kiosk_db::{CheckoutError, DbError};

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for product ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
///
/// Each code maps to exactly one HTTP status; clients switch on the code,
/// not on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No valid caller identity (401)
    Unauthorized,

    /// Caller role not allowed to do this (403)
    Forbidden,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate unique value, e.g. barcode or username (400)
    Duplicate,

    /// Deleting your own user is not allowed (400)
    SelfDeleteBlocked,

    /// Resource not found (404)
    NotFound,

    /// Checkout referenced a product that does not exist (404)
    ProductNotFound,

    /// Requested quantity exceeds available stock (409)
    InsufficientStock,

    /// Product is referenced by sale history (409)
    ProductInUse,

    /// User has recorded sales (409)
    UserHasSales,

    /// A sale computed line items with a zero total (500)
    TotalZeroWithItems,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// The HTTP status this code is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ValidationError
            | ErrorCode::Duplicate
            | ErrorCode::SelfDeleteBlocked => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound | ErrorCode::ProductNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock
            | ErrorCode::ProductInUse
            | ErrorCode::UserHasSales => StatusCode::CONFLICT,
            ErrorCode::TotalZeroWithItems
            | ErrorCode::DatabaseError
            | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ProductInUse { id } => ApiError::new(
                ErrorCode::ProductInUse,
                format!("Product {} has associated sales and cannot be deleted", id),
            ),
            DbError::UserHasSales { id } => ApiError::new(
                ErrorCode::UserHasSales,
                format!("User {} has recorded sales and cannot be deleted", id),
            ),
            DbError::BarcodeExhausted { attempts } => {
                tracing::error!(attempts, "Barcode generation exhausted");
                ApiError::internal("Could not generate a unique barcode")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(%message, "Foreign key violation");
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core business errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::new(
                ErrorCode::ProductNotFound,
                format!("Product not found: {}", id),
            ),
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for product {}: {} available, {} requested",
                    product_id, available, requested
                ),
            ),
            CoreError::TotalIntegrity { sale_id } => {
                tracing::error!(sale_id = %sale_id, "Sale total integrity violation");
                ApiError::new(
                    ErrorCode::TotalZeroWithItems,
                    "Sale computed line items with a zero total",
                )
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts checkout errors (either side) to API errors.
impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Core(e) => e.into(),
            CheckoutError::Db(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::ProductNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InsufficientStock.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ProductInUse.status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::TotalZeroWithItems.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::InsufficientStock).unwrap(),
            "\"INSUFFICIENT_STOCK\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::TotalZeroWithItems).unwrap(),
            "\"TOTAL_ZERO_WITH_ITEMS\""
        );
    }

    #[test]
    fn test_insufficient_stock_maps_to_conflict() {
        let api: ApiError = CoreError::InsufficientStock {
            product_id: "p1".to_string(),
            available: 2,
            requested: 3,
        }
        .into();
        assert_eq!(api.code, ErrorCode::InsufficientStock);
        assert!(api.message.contains("2 available"));
    }

    #[test]
    fn test_db_not_found_maps_to_404() {
        let api: ApiError = DbError::not_found("Product", "p1").into();
        assert_eq!(api.code, ErrorCode::NotFound);
        assert_eq!(api.code.status(), StatusCode::NOT_FOUND);
    }
}

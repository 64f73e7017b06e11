//! # Identity & Role Gate
//!
//! JWT authentication and the centralized role check.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Authentication                          │
//! │                                                                         │
//! │  POST /api/auth/login { username, password }                            │
//! │       │                                                                 │
//! │       ├── argon2 verify against profiles.password_hash                  │
//! │       └── mint JWT { sub, username, role, iat, exp }                    │
//! │                                                                         │
//! │  Every other /api route:                                                │
//! │       Authorization: Bearer <token>                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CurrentProfile extractor ── invalid/missing → 401 UNAUTHORIZED         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  handler calls profile.require_role(...)                               │
//! │       └── wrong role → 403 FORBIDDEN                                    │
//! │                                                                         │
//! │  One gate, invoked at the entry of every mutating operation, instead    │
//! │  of ad hoc role checks scattered per route.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::state::AppState;
use kiosk_core::{Profile, Role};
use kiosk_db::Database;

// =============================================================================
// JWT
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (profile id)
    pub sub: String,

    /// Username at token issue time
    pub username: String,

    /// Role at token issue time
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generate a token for a profile.
    pub fn generate_token(&self, profile: &Profile) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: profile.id.clone(),
            username: profile.username.clone(),
            role: profile.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))
    }
}

/// Extract bearer token from an authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
    use argon2::Argon2;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored argon2 hash.
///
/// An unparseable stored hash counts as a failed verification, not an
/// error; login failures should all look the same to the caller.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    use argon2::Argon2;

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Current Profile
// =============================================================================

/// The authenticated caller, as carried by the validated token.
#[derive(Debug, Clone)]
pub struct CurrentProfile {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl CurrentProfile {
    /// Centralized authorization check.
    ///
    /// `None` means any authenticated profile qualifies (every profile
    /// holds one of the known roles); `Some(role)` requires that exact
    /// role.
    pub fn require_role(&self, required: Option<Role>) -> Result<(), ApiError> {
        match required {
            Some(role) if self.role != role => Err(ApiError::forbidden(format!(
                "Requires the {} role",
                role
            ))),
            _ => Ok(()),
        }
    }
}

impl From<Claims> for CurrentProfile {
    fn from(claims: Claims) -> Self {
        CurrentProfile {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Auth extractor: protected handlers take `CurrentProfile` as an
/// argument and the token is validated before the handler body runs.
impl FromRequestParts<AppState> for CurrentProfile {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already extracted earlier in this request
        if let Some(profile) = parts.extensions.get::<CurrentProfile>() {
            return Ok(profile.clone());
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = auth_header
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let claims = state.jwt.validate_token(token)?;
        let profile = CurrentProfile::from(claims);

        // Store for potential reuse within the same request
        parts.extensions.insert(profile.clone());

        Ok(profile)
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

/// Provisions the first admin when the profiles table is empty, so a
/// fresh deployment has someone who can log in.
pub async fn ensure_admin(db: &Database, config: &ServerConfig) -> Result<(), ApiError> {
    if db.profiles().count().await? > 0 {
        return Ok(());
    }

    // Same normalization the login path applies, so the configured
    // username always round-trips.
    let username = kiosk_core::validation::validate_username(&config.bootstrap_admin_username)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let hash = hash_password(&config.bootstrap_admin_password)?;
    let admin = db
        .profiles()
        .create(
            &username,
            &config.bootstrap_admin_full_name,
            Role::Admin,
            &hash,
        )
        .await?;

    info!(username = %admin.username, "Provisioned bootstrap admin");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(role: Role) -> Profile {
        Profile {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            username: "vendedor01".to_string(),
            full_name: "Vendedor Uno".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_token(&profile(Role::Seller)).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(claims.username, "vendedor01");
        assert_eq!(claims.role, Role::Seller);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jwt_wrong_secret_rejected() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let other = JwtManager::new("other-secret".to_string(), 3600);

        let token = manager.generate_token(&profile(Role::Admin)).unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_jwt_expired_rejected() {
        // Lifetime beyond the default validation leeway, in the past
        let manager = JwtManager::new("test-secret".to_string(), -120);

        let token = manager.generate_token(&profile(Role::Admin)).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("hunter2!").unwrap();

        assert_ne!(hash, "hunter2!");
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("hunter2!", "not-a-phc-string"));

        // Fresh salt per hash
        let again = hash_password("hunter2!").unwrap();
        assert_ne!(hash, again);
    }

    #[test]
    fn test_require_role() {
        let admin = CurrentProfile {
            id: "a".to_string(),
            username: "admin".to_string(),
            role: Role::Admin,
        };
        let seller = CurrentProfile {
            id: "s".to_string(),
            username: "seller".to_string(),
            role: Role::Seller,
        };

        assert!(admin.require_role(None).is_ok());
        assert!(admin.require_role(Some(Role::Admin)).is_ok());
        assert!(seller.require_role(None).is_ok());
        assert!(seller.require_role(Some(Role::Admin)).is_err());
    }
}

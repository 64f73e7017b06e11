//! # Profile Repository
//!
//! Database operations for user profiles and their credentials.
//!
//! Profiles are the identity layer's storage: the HTTP server verifies
//! passwords and mints tokens, this repository only stores and fetches.
//! The password hash never leaves the crate except through
//! [`ProfileCredentials`], which exists solely for the login check.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kiosk_core::{Profile, Role};

const PROFILE_COLUMNS: &str = "id, username, full_name, role, created_at";

/// A profile together with its password hash, for credential checks.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileCredentials {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: chrono::DateTime<Utc>,
    pub password_hash: String,
}

impl ProfileCredentials {
    /// The hash-free view of this profile.
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Repository for profile database operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Lists all profiles, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    /// Gets a profile by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Fetches a profile with its password hash, for the login check.
    pub async fn find_credentials(&self, username: &str) -> DbResult<Option<ProfileCredentials>> {
        let creds = sqlx::query_as::<_, ProfileCredentials>(&format!(
            "SELECT {PROFILE_COLUMNS}, password_hash FROM profiles WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(creds)
    }

    /// Counts profiles. Used to decide whether the first admin needs to
    /// be provisioned.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Creates a new profile.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Username already taken
    pub async fn create(
        &self,
        username: &str,
        full_name: &str,
        role: Role,
        password_hash: &str,
    ) -> DbResult<Profile> {
        let profile = Profile {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            role,
            created_at: Utc::now(),
        };

        debug!(id = %profile.id, username = %username, role = %role, "Creating profile");

        sqlx::query(
            "INSERT INTO profiles (id, username, full_name, role, password_hash, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&profile.id)
        .bind(&profile.username)
        .bind(&profile.full_name)
        .bind(profile.role)
        .bind(password_hash)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        Ok(profile)
    }

    /// Updates a profile's username, display name and role.
    ///
    /// The username uniqueness check excludes the profile itself so a
    /// no-op rename is not rejected.
    pub async fn update(
        &self,
        id: &str,
        username: &str,
        full_name: &str,
        role: Role,
    ) -> DbResult<Profile> {
        let taken: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM profiles WHERE username = ?1 AND id != ?2)",
        )
        .bind(username)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if taken != 0 {
            return Err(DbError::duplicate("username", username));
        }

        debug!(id = %id, "Updating profile");

        let result =
            sqlx::query("UPDATE profiles SET username = ?2, full_name = ?3, role = ?4 WHERE id = ?1")
                .bind(id)
                .bind(username)
                .bind(full_name)
                .bind(role)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deletes a profile.
    ///
    /// ## Returns
    /// * `Err(DbError::UserHasSales)` - The profile has recorded sales;
    ///   sale history must keep a valid creator reference
    /// * `Err(DbError::NotFound)` - No such profile
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let has_sales: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales WHERE created_by = ?1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if has_sales != 0 {
            return Err(DbError::UserHasSales { id: id.to_string() });
        }

        debug!(id = %id, "Deleting profile");

        let result = sqlx::query("DELETE FROM profiles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_credentials() {
        let db = test_db().await;
        let repo = db.profiles();

        let created = repo
            .create("vendedor01", "Vendedor Uno", Role::Seller, "hash-value")
            .await
            .unwrap();

        let creds = repo.find_credentials("vendedor01").await.unwrap().unwrap();
        assert_eq!(creds.id, created.id);
        assert_eq!(creds.password_hash, "hash-value");
        assert_eq!(creds.role, Role::Seller);
        assert_eq!(creds.profile().username, "vendedor01");

        assert!(repo.find_credentials("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        let repo = db.profiles();

        repo.create("admin", "Admin", Role::Admin, "h1").await.unwrap();
        let err = repo
            .create("admin", "Other Admin", Role::Admin, "h2")
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_checks_username_uniqueness_excluding_self() {
        let db = test_db().await;
        let repo = db.profiles();

        let a = repo.create("user-a", "A", Role::Seller, "h").await.unwrap();
        repo.create("user-b", "B", Role::Seller, "h").await.unwrap();

        // Renaming a to b's username fails
        let err = repo
            .update(&a.id, "user-b", "A", Role::Seller)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Keeping its own username (role change) succeeds
        let updated = repo.update(&a.id, "user-a", "A", Role::Admin).await.unwrap();
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_delete_profile_with_sales_blocked() {
        let db = test_db().await;
        let repo = db.profiles();

        let seller = repo.create("seller", "S", Role::Seller, "h").await.unwrap();
        sqlx::query(
            "INSERT INTO sales (id, created_at, total_cents, payment_method, created_by) \
             VALUES ('s1', ?1, 1000, 'CASH', ?2)",
        )
        .bind(Utc::now())
        .bind(&seller.id)
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo.delete(&seller.id).await.unwrap_err();
        assert!(matches!(err, DbError::UserHasSales { .. }));
        assert!(repo.get_by_id(&seller.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_profile_without_sales() {
        let db = test_db().await;
        let repo = db.profiles();

        let p = repo.create("temp", "T", Role::Seller, "h").await.unwrap();
        repo.delete(&p.id).await.unwrap();
        assert!(repo.get_by_id(&p.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}

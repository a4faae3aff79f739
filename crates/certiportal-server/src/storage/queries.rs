//! User, token, profile, and role queries for the `CertiPortal` server.

use certiportal_core::db::{DatabaseError, unix_timestamp};

use super::db::PortalDatabase;
use super::models::{Profile, Token, User};

/// Allow-listed profile update. Absent fields are left unchanged;
/// `numero_identificacion` and `email` are immutable once set.
#[derive(Debug, Default, Clone)]
pub struct ProfilePatch {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
    pub telefono: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub const fn is_empty(&self) -> bool {
        self.nombres.is_none()
            && self.apellidos.is_none()
            && self.telefono.is_none()
            && self.avatar_url.is_none()
    }
}

impl PortalDatabase {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user.
    pub async fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User with email {email}")))
    }

    /// Replace a user's password hash.
    pub async fn update_user_password(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    // =========================================================================
    // Token queries
    // =========================================================================

    /// Store a refresh token.
    pub async fn create_token(
        &self,
        id: &str,
        user_id: &str,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<Token, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO tokens (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_token(id).await
    }

    /// Get a token by ID.
    pub async fn get_token(&self, id: &str) -> Result<Token, DatabaseError> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Token {id}")))
    }

    /// Find a valid (non-revoked, non-expired) token by hash.
    pub async fn get_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        let now = unix_timestamp();

        let token = sqlx::query_as::<_, Token>(
            "SELECT * FROM tokens WHERE token_hash = ? AND revoked = 0 AND expires_at > ?",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        Ok(token)
    }

    /// Revoke a token by ID.
    pub async fn revoke_token(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE tokens SET revoked = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke all tokens for a user (logout everywhere, password change).
    pub async fn revoke_user_tokens(&self, user_id: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE tokens SET revoked = 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Profile queries
    // =========================================================================

    /// Create a profile for a freshly registered user.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_profile(
        &self,
        id: &str,
        user_id: &str,
        numero_identificacion: &str,
        nombres: &str,
        apellidos: &str,
        email: &str,
        telefono: Option<&str>,
    ) -> Result<Profile, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO profiles (id, user_id, numero_identificacion, nombres, apellidos, email, telefono, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(numero_identificacion)
        .bind(nombres)
        .bind(apellidos)
        .bind(email)
        .bind(telefono)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_profile_by_user(user_id).await
    }

    /// Get the profile owned by a user.
    pub async fn get_profile_by_user(&self, user_id: &str) -> Result<Profile, DatabaseError> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Profile for user {user_id}")))
    }

    /// Apply an allow-listed profile patch. Absent fields are left unchanged.
    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<Profile, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "UPDATE profiles SET \
                 nombres = COALESCE(?, nombres), \
                 apellidos = COALESCE(?, apellidos), \
                 telefono = COALESCE(?, telefono), \
                 avatar_url = COALESCE(?, avatar_url), \
                 updated_at = ? \
             WHERE user_id = ?",
        )
        .bind(patch.nombres.as_deref())
        .bind(patch.apellidos.as_deref())
        .bind(patch.telefono.as_deref())
        .bind(patch.avatar_url.as_deref())
        .bind(now)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        self.get_profile_by_user(user_id).await
    }

    /// Count registered profiles (staff dashboard stat).
    pub async fn count_profiles(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(self.pool())
            .await?;

        Ok(row.0)
    }

    // =========================================================================
    // Role queries
    // =========================================================================

    /// Assign (or replace) a user's role.
    pub async fn set_user_role(&self, user_id: &str, role: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES (?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET role = ?",
        )
        .bind(user_id)
        .bind(role)
        .bind(role)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Get a user's role string, if a role row exists.
    pub async fn get_user_role(&self, user_id: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT role FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|(role,)| role))
    }
}

/// User model and database operations
///
/// Users authenticate either with a password or through an external identity
/// provider. At least one of `password_hash` / `external_id` is always set
/// (enforced by a CHECK constraint).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255),
///     external_id VARCHAR(255) UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_has_credential
///         CHECK (password_hash IS NOT NULL OR external_id IS NOT NULL)
/// );
/// ```
///
/// All operations take `impl PgExecutor` so they compose with both the pool
/// and an open transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// User account record
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique, stored case-sensitively
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash; None for external-identity-only accounts
    pub password_hash: Option<String>,

    /// Subject id assigned by the external identity provider, when linked
    pub external_id: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// The externally visible projection of a user
///
/// Credentials (`password_hash`, `external_id`) never leave the service;
/// every API response that carries a user carries this shape instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    /// Unique user ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id hash (NOT a plaintext password); None for external accounts
    pub password_hash: Option<String>,

    /// External-provider subject id, when creating from a federated login
    pub external_id: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Surfaces the unique-constraint violation when the email (or external
    /// id) is already taken; callers map that to a conflict.
    pub async fn create<'e>(db: impl PgExecutor<'e>, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, external_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, password_hash, external_id, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .bind(data.external_id)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, external_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Finds a user by email address (exact, case-sensitive match)
    pub async fn find_by_email<'e>(
        db: impl PgExecutor<'e>,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, external_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Finds a user by external-provider subject id
    pub async fn find_by_external_id<'e>(
        db: impl PgExecutor<'e>,
        external_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, external_id, created_at
            FROM users
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(db)
        .await
    }

    /// Links an external-provider subject id onto an existing account
    ///
    /// The only mutation users undergo: federated login matched by email
    /// attaches the provider id so later logins resolve directly.
    ///
    /// # Returns
    ///
    /// The updated user, or None if the id doesn't resolve
    pub async fn link_external_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        external_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET external_id = $2
            WHERE id = $1
            RETURNING id, email, name, password_hash, external_id, created_at
            "#,
        )
        .bind(id)
        .bind(external_id)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: "Test User".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            external_id: Some("google-subject-id".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_user_omits_credentials() {
        let user = sample_user();
        let public = PublicUser::from(&user);

        let json = serde_json::to_value(&public).expect("Should serialize");
        assert_eq!(json["email"], "user@example.com");
        assert_eq!(json["name"], "Test User");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("external_id").is_none());
    }

    #[test]
    fn test_public_user_keeps_identity_fields() {
        let user = sample_user();
        let public = PublicUser::from(&user);

        assert_eq!(public.id, user.id);
        assert_eq!(public.created_at, user.created_at);
    }
}

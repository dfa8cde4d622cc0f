//! `PostgreSQL` implementation of the `IdentityStore` trait.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use storyline_core::error::DomainError;
use storyline_core::identity::{IdentityStore, NewUser, User};
use storyline_core::story::UserId;

/// PostgreSQL-backed identity store.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Creates a new `PgIdentityStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infra(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn resolve(&self, display_name: &str) -> Result<UserId, DomainError> {
        let row = sqlx::query("SELECT id FROM users WHERE display_name = $1")
            .bind(display_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?
            .ok_or_else(|| DomainError::UserNotFound(display_name.to_owned()))?;
        let id: Uuid = row.try_get("id").map_err(infra)?;
        Ok(UserId(id))
    }

    async fn register(&self, user: NewUser) -> Result<UserId, DomainError> {
        if user.display_name.trim().is_empty() {
            return Err(DomainError::Validation("display_name must not be empty".into()));
        }

        let row = sqlx::query(
            "INSERT INTO users (id, display_name, external_id, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (display_name) DO NOTHING RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&user.display_name)
        .bind(&user.external_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?
        .ok_or_else(|| DomainError::UserExists(user.display_name.clone()))?;

        let id = UserId(row.try_get("id").map_err(infra)?);
        info!(user_id = %id, display_name = %user.display_name, "user registered");
        Ok(id)
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            "SELECT id, display_name, external_id, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;

        row.map(|row| {
            Ok(User {
                id: UserId(row.try_get("id").map_err(infra)?),
                display_name: row.try_get("display_name").map_err(infra)?,
                external_id: row.try_get("external_id").map_err(infra)?,
                first_name: row.try_get("first_name").map_err(infra)?,
                last_name: row.try_get("last_name").map_err(infra)?,
            })
        })
        .transpose()
    }
}

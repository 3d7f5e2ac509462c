//! User directory lookup for share grants.
//!
//! Registration, credentials, and tokens are owned by the identity service;
//! this module only resolves an email to a registered user id so `share` can
//! validate its collaborator.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use taskhive_core::{Result, UserDirectory, UserRef};

/// PostgreSQL-backed [`UserDirectory`] over the `users` table provisioned by
/// the identity service.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRef>> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserRef {
            id: r.get("id"),
            name: r.get("name"),
            email: r.get("email"),
        }))
    }
}

//! Postgres-backed identity store
//!
//! Reads the `users` table owned by the users service. Its columns keep the
//! entity names (`prenom`, `nom`, `"walletAddress"`, `"isActive"`) and the
//! role is the `users_role_enum` type, so every query aliases back to the
//! `Identity` field names.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{IdentityStore, StoreError};
use crate::models::Identity;

const IDENTITY_COLUMNS: &str = r#"id, prenom AS first_name, nom AS last_name, role, "walletAddress" AS wallet_address, "isActive" AS is_active"#;

/// Reads active identities from the shared `users` table
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_active_by_address(&self, address: &str) -> Result<Option<Identity>, StoreError> {
        let query = format!(
            r#"SELECT {} FROM users WHERE "walletAddress" = $1 AND "isActive" = TRUE"#,
            IDENTITY_COLUMNS
        );

        let identity = sqlx::query_as::<_, Identity>(&query)
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }

    async fn find_active_by_address_ci(
        &self,
        address: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let query = format!(
            r#"SELECT {} FROM users WHERE LOWER("walletAddress") = LOWER($1) AND "isActive" = TRUE LIMIT 1"#,
            IDENTITY_COLUMNS
        );

        let identity = sqlx::query_as::<_, Identity>(&query)
            .bind(address)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }
}

//! Repository for the `annotators` table.

use hanami_core::types::DbId;
use sqlx::PgPool;

use crate::models::annotator::{Annotator, CreateAnnotator};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, password_hash, role, last_login, created_at, updated_at";

/// Provides CRUD operations for annotator accounts.
pub struct AnnotatorRepo;

impl AnnotatorRepo {
    /// Insert a new annotator, returning the created row.
    ///
    /// A duplicate username violates `uq_annotators_username`.
    pub async fn create(pool: &PgPool, input: &CreateAnnotator) -> Result<Annotator, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotators (username, password_hash, role)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotator>(&query)
            .bind(&input.username)
            .bind(&input.password_hash)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Annotator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotators WHERE id = $1");
        sqlx::query_as::<_, Annotator>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an annotator by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Annotator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotators WHERE username = $1");
        sqlx::query_as::<_, Annotator>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// List all annotators in creation order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Annotator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotators ORDER BY id");
        sqlx::query_as::<_, Annotator>(&query).fetch_all(pool).await
    }

    /// Delete an annotator. Returns `true` if a row was removed.
    ///
    /// Their annotations are kept with a null `annotator_id`.
    pub async fn delete_by_username(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM annotators WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set `last_login` to now.
    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE annotators SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

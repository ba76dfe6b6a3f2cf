//! Repository for the `fullview_validation_logs` table.

use sqlx::PgPool;

use crate::models::fullview_validation_log::{
    CreateFullviewValidationLog, FullviewValidationLog,
};

const COLUMNS: &str = "id, uid, image_obj_key, is_valid, reason, confidence, model_id, created_at";

pub struct FullviewValidationLogRepo;

impl FullviewValidationLogRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateFullviewValidationLog,
    ) -> Result<FullviewValidationLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO fullview_validation_logs
                (image_obj_key, is_valid, reason, confidence, model_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FullviewValidationLog>(&query)
            .bind(&input.image_obj_key)
            .bind(input.is_valid)
            .bind(&input.reason)
            .bind(input.confidence)
            .bind(&input.model_id)
            .fetch_one(pool)
            .await
    }

    /// Most recent verdicts first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<FullviewValidationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM fullview_validation_logs
             ORDER BY created_at DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, FullviewValidationLog>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

//! Repository for photos (`entire_trees`) and their trees.

use hanami_core::types::DbId;
use sqlx::PgPool;

use crate::models::photo::{BloomBatchRow, BloomStatusUpdate, PhotoDetailRow};

pub struct PhotoRepo;

impl PhotoRepo {
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM entire_trees WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// A photo with its tree and annotation. Coordinates are the tree's.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PhotoDetailRow>, sqlx::Error> {
        sqlx::query_as::<_, PhotoDetailRow>(
            "SELECT et.id, et.tree_id, et.image_obj_key, et.thumb_obj_key, et.photo_date,
                    t.latitude, t.longitude, t.location, t.prefecture_code,
                    et.bloom_status, va.vitality_value,
                    COALESCE(va.is_ready, false) AS is_ready,
                    va.annotator_id, va.annotated_at
             FROM entire_trees et
             JOIN trees t ON t.id = et.tree_id
             LEFT JOIN vitality_annotations va ON va.entire_tree_id = et.id
             WHERE et.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM entire_trees")
            .fetch_one(pool)
            .await
    }

    /// Next page of the bloom-status batch, keyed on photo id.
    ///
    /// Pass `0` to start from the beginning and the last id of the previous
    /// page afterwards.
    pub async fn list_batch_after(
        pool: &PgPool,
        after_id: DbId,
        limit: i64,
    ) -> Result<Vec<BloomBatchRow>, sqlx::Error> {
        sqlx::query_as::<_, BloomBatchRow>(
            "SELECT et.id, et.photo_date, et.latitude, et.longitude,
                    t.prefecture_code, et.bloom_status
             FROM entire_trees et
             JOIN trees t ON t.id = et.tree_id
             WHERE et.id > $1
             ORDER BY et.id ASC
             LIMIT $2",
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Write many bloom statuses in one transaction. Returns the number of
    /// rows changed.
    pub async fn update_bloom_statuses(
        pool: &PgPool,
        updates: &[BloomStatusUpdate],
    ) -> Result<u64, sqlx::Error> {
        if updates.is_empty() {
            return Ok(0);
        }
        let ids: Vec<DbId> = updates.iter().map(|u| u.id).collect();
        let statuses: Vec<String> = updates.iter().map(|u| u.bloom_status.clone()).collect();

        let mut tx = pool.begin().await?;
        let result = sqlx::query(
            "UPDATE entire_trees et SET bloom_status = u.bloom_status
             FROM UNNEST($1::BIGINT[], $2::TEXT[]) AS u(id, bloom_status)
             WHERE et.id = u.id",
        )
        .bind(&ids)
        .bind(&statuses)
        .execute(&mut *tx)
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, rows = updates.len(), "Bloom status update failed, rolling back");
        })?;
        tx.commit().await?;
        tracing::debug!(rows = result.rows_affected(), "Bloom statuses committed");
        Ok(result.rows_affected())
    }
}

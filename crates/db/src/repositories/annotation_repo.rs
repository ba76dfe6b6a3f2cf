//! Repository for `vitality_annotations` and the gallery queries over
//! photos joined with their annotation.

use hanami_core::annotation::{effective_is_ready, AnnotationFilter, Pagination};
use hanami_core::roles::Role;
use hanami_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::annotation::{
    AnnotationListRow, AnnotationStatsRow, ExportRow, VitalityAnnotation,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, entire_tree_id, annotator_id, vitality_value, is_ready, \
                       annotated_at, created_at, updated_at";

const LIST_COLUMNS: &str = "et.id AS entire_tree_id, et.tree_id, et.image_obj_key, \
                            et.thumb_obj_key, et.photo_date, t.location, t.prefecture_code, \
                            et.bloom_status, va.vitality_value, \
                            COALESCE(va.is_ready, false) AS is_ready";

/// Photos matching an [`AnnotationFilter`], binds `$1`-`$7`.
///
/// A photo without a record counts as unannotated and not ready.
const FILTERED_FROM: &str = "FROM entire_trees et
     JOIN trees t ON t.id = et.tree_id
     LEFT JOIN vitality_annotations va ON va.entire_tree_id = et.id
     WHERE ($1::TEXT = 'all'
            OR ($1::TEXT = 'annotated' AND va.vitality_value IS NOT NULL)
            OR ($1::TEXT = 'unannotated' AND va.vitality_value IS NULL))
       AND ($2::TEXT IS NULL OR t.prefecture_code = $2)
       AND ($3::INTEGER IS NULL OR va.vitality_value = $3)
       AND ($4::TIMESTAMPTZ IS NULL OR et.photo_date >= $4)
       AND ($5::TIMESTAMPTZ IS NULL OR et.photo_date < $5)
       AND ($6::BOOLEAN IS NULL OR COALESCE(va.is_ready, false) = $6)
       AND ($7::TEXT[] IS NULL OR et.bloom_status = ANY($7))";

/// Filter values in bind order of [`FILTERED_FROM`].
struct FilterBinds {
    status: &'static str,
    prefecture_code: Option<String>,
    vitality_value: Option<i32>,
    photo_date_from: Option<Timestamp>,
    photo_date_to: Option<Timestamp>,
    is_ready: Option<bool>,
    bloom_statuses: Option<Vec<String>>,
}

impl From<&AnnotationFilter> for FilterBinds {
    fn from(f: &AnnotationFilter) -> Self {
        let (photo_date_from, photo_date_to) = f.photo_date_bounds();
        Self {
            status: f.status.as_str(),
            prefecture_code: f.prefecture_code.clone(),
            vitality_value: f.effective_vitality(),
            photo_date_from,
            photo_date_to,
            is_ready: f.is_ready,
            bloom_statuses: f.bloom_filter().map(<[String]>::to_vec),
        }
    }
}

macro_rules! bind_filter {
    ($query:expr, $binds:expr) => {
        $query
            .bind($binds.status)
            .bind(&$binds.prefecture_code)
            .bind($binds.vitality_value)
            .bind($binds.photo_date_from)
            .bind($binds.photo_date_to)
            .bind($binds.is_ready)
            .bind(&$binds.bloom_statuses)
    };
}

/// Provides gallery queries and annotation upserts.
pub struct AnnotationRepo;

impl AnnotationRepo {
    // -----------------------------------------------------------------------
    // Gallery
    // -----------------------------------------------------------------------

    /// One page of photos matching `filter`, newest photo id first.
    ///
    /// `filter` must already be resolved for the caller's role.
    pub async fn list(
        pool: &PgPool,
        filter: &AnnotationFilter,
        page: &Pagination,
    ) -> Result<Vec<AnnotationListRow>, sqlx::Error> {
        let binds = FilterBinds::from(filter);
        let query = format!(
            "SELECT {LIST_COLUMNS} {FILTERED_FROM}
             ORDER BY et.id DESC
             LIMIT $8 OFFSET $9"
        );
        bind_filter!(sqlx::query_as::<_, AnnotationListRow>(&query), binds)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Number of photos matching `filter`.
    pub async fn count(pool: &PgPool, filter: &AnnotationFilter) -> Result<i64, sqlx::Error> {
        let binds = FilterBinds::from(filter);
        let query = format!("SELECT COUNT(*) {FILTERED_FROM}");
        bind_filter!(sqlx::query_scalar::<_, i64>(&query), binds)
            .fetch_one(pool)
            .await
    }

    /// All photo ids matching `filter`, in list order. Drives prev/next
    /// navigation on the detail view.
    pub async fn navigation_ids(
        pool: &PgPool,
        filter: &AnnotationFilter,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let binds = FilterBinds::from(filter);
        let query = format!("SELECT et.id {FILTERED_FROM} ORDER BY et.id DESC");
        bind_filter!(sqlx::query_scalar::<_, DbId>(&query), binds)
            .fetch_all(pool)
            .await
    }

    /// Gallery counters. Annotators only count ready photos.
    pub async fn stats(pool: &PgPool, role: Role) -> Result<AnnotationStatsRow, sqlx::Error> {
        sqlx::query_as::<_, AnnotationStatsRow>(
            "SELECT
                COUNT(*) AS total_count,
                COUNT(va.vitality_value) AS annotated_count,
                COUNT(*) - COUNT(va.vitality_value) AS unannotated_count,
                COUNT(*) FILTER (WHERE va.vitality_value = 1) AS vitality_1_count,
                COUNT(*) FILTER (WHERE va.vitality_value = 2) AS vitality_2_count,
                COUNT(*) FILTER (WHERE va.vitality_value = 3) AS vitality_3_count,
                COUNT(*) FILTER (WHERE va.vitality_value = 4) AS vitality_4_count,
                COUNT(*) FILTER (WHERE va.vitality_value = 5) AS vitality_5_count,
                COUNT(*) FILTER (WHERE va.vitality_value = -1) AS vitality_minus1_count,
                COUNT(*) FILTER (WHERE COALESCE(va.is_ready, false)) AS ready_count,
                COUNT(*) FILTER (WHERE NOT COALESCE(va.is_ready, false)) AS not_ready_count
             FROM entire_trees et
             LEFT JOIN vitality_annotations va ON va.entire_tree_id = et.id
             WHERE ($1::BOOLEAN IS NULL OR COALESCE(va.is_ready, false) = $1)",
        )
        .bind(effective_is_ready(role, None))
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    pub async fn find_for_photo(
        pool: &PgPool,
        entire_tree_id: DbId,
    ) -> Result<Option<VitalityAnnotation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vitality_annotations WHERE entire_tree_id = $1");
        sqlx::query_as::<_, VitalityAnnotation>(&query)
            .bind(entire_tree_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or overwrite the vitality value of a photo.
    ///
    /// The readiness flag of an existing record is left untouched.
    pub async fn upsert_vitality(
        pool: &PgPool,
        entire_tree_id: DbId,
        annotator_id: DbId,
        vitality_value: i32,
    ) -> Result<VitalityAnnotation, sqlx::Error> {
        let query = format!(
            "INSERT INTO vitality_annotations
                (entire_tree_id, annotator_id, vitality_value, annotated_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (entire_tree_id) DO UPDATE SET
                annotator_id = EXCLUDED.annotator_id,
                vitality_value = EXCLUDED.vitality_value,
                annotated_at = EXCLUDED.annotated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VitalityAnnotation>(&query)
            .bind(entire_tree_id)
            .bind(annotator_id)
            .bind(vitality_value)
            .fetch_one(pool)
            .await
    }

    /// Insert or update the readiness flag of a photo.
    pub async fn upsert_is_ready(
        pool: &PgPool,
        entire_tree_id: DbId,
        is_ready: bool,
    ) -> Result<VitalityAnnotation, sqlx::Error> {
        let query = format!(
            "INSERT INTO vitality_annotations (entire_tree_id, is_ready)
             VALUES ($1, $2)
             ON CONFLICT (entire_tree_id) DO UPDATE SET is_ready = EXCLUDED.is_ready
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VitalityAnnotation>(&query)
            .bind(entire_tree_id)
            .bind(is_ready)
            .fetch_one(pool)
            .await
    }

    /// Set the readiness flag of many photos in one statement.
    ///
    /// Ids with no photo are skipped. Returns the updated photo ids in
    /// ascending order.
    pub async fn upsert_is_ready_batch(
        pool: &PgPool,
        entire_tree_ids: &[DbId],
        is_ready: bool,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut ids: Vec<DbId> = sqlx::query_scalar(
            "INSERT INTO vitality_annotations (entire_tree_id, is_ready)
             SELECT et.id, $2 FROM entire_trees et WHERE et.id = ANY($1)
             ON CONFLICT (entire_tree_id) DO UPDATE SET is_ready = EXCLUDED.is_ready
             RETURNING entire_tree_id",
        )
        .bind(entire_tree_ids)
        .bind(is_ready)
        .fetch_all(pool)
        .await?;
        ids.sort_unstable();
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Annotated photos in photo id order. `-1` rows are left out unless
    /// `include_undiagnosable` is set.
    pub async fn export_rows(
        pool: &PgPool,
        include_undiagnosable: bool,
    ) -> Result<Vec<ExportRow>, sqlx::Error> {
        sqlx::query_as::<_, ExportRow>(
            "SELECT et.id AS entire_tree_id, et.image_obj_key, va.vitality_value
             FROM vitality_annotations va
             JOIN entire_trees et ON et.id = va.entire_tree_id
             WHERE va.vitality_value IS NOT NULL
               AND ($1 OR va.vitality_value <> -1)
             ORDER BY et.id ASC",
        )
        .bind(include_undiagnosable)
        .fetch_all(pool)
        .await
    }
}

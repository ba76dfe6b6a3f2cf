//! Vitality annotation records and the gallery read models built on them.

use hanami_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use ts_rs::TS;

/// Row from `vitality_annotations`.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
#[ts(export)]
pub struct VitalityAnnotation {
    pub id: DbId,
    pub entire_tree_id: DbId,
    pub annotator_id: Option<DbId>,
    /// `None` for records that only carry the readiness flag.
    pub vitality_value: Option<i32>,
    pub is_ready: bool,
    pub annotated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One photo in the gallery list, with its annotation if any.
#[derive(Debug, Clone, FromRow)]
pub struct AnnotationListRow {
    pub entire_tree_id: DbId,
    pub tree_id: DbId,
    pub image_obj_key: String,
    pub thumb_obj_key: Option<String>,
    pub photo_date: Option<Timestamp>,
    pub location: Option<String>,
    pub prefecture_code: Option<String>,
    pub bloom_status: Option<String>,
    pub vitality_value: Option<i32>,
    pub is_ready: bool,
}

/// Counters shown above the gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, TS)]
#[ts(export)]
pub struct AnnotationStatsRow {
    pub total_count: i64,
    pub annotated_count: i64,
    pub unannotated_count: i64,
    pub vitality_1_count: i64,
    pub vitality_2_count: i64,
    pub vitality_3_count: i64,
    pub vitality_4_count: i64,
    pub vitality_5_count: i64,
    pub vitality_minus1_count: i64,
    pub ready_count: i64,
    pub not_ready_count: i64,
}

/// An exported annotation. Only rows with a vitality value are exported.
#[derive(Debug, Clone, FromRow)]
pub struct ExportRow {
    pub entire_tree_id: DbId,
    pub image_obj_key: String,
    pub vitality_value: i32,
}

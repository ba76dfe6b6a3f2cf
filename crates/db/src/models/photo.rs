//! Photo (`entire_trees`) read models.

use hanami_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A photo joined with its tree and annotation, for the detail view.
#[derive(Debug, Clone, FromRow)]
pub struct PhotoDetailRow {
    pub id: DbId,
    pub tree_id: DbId,
    pub image_obj_key: String,
    pub thumb_obj_key: Option<String>,
    pub photo_date: Option<Timestamp>,
    /// Tree position, used for the nearest flowering spot.
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub prefecture_code: Option<String>,
    pub bloom_status: Option<String>,
    pub vitality_value: Option<i32>,
    /// `false` when no annotation record exists.
    pub is_ready: bool,
    pub annotator_id: Option<DbId>,
    pub annotated_at: Option<Timestamp>,
}

/// Input of the bloom-status recomputation batch.
#[derive(Debug, Clone, FromRow)]
pub struct BloomBatchRow {
    pub id: DbId,
    pub photo_date: Option<Timestamp>,
    pub latitude: f64,
    pub longitude: f64,
    pub prefecture_code: Option<String>,
    pub bloom_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomStatusUpdate {
    pub id: DbId,
    pub bloom_status: String,
}

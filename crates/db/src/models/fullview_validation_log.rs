//! Full-view validation verdict log.

use hanami_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, TS)]
#[ts(export)]
pub struct FullviewValidationLog {
    pub id: DbId,
    #[ts(type = "string")]
    pub uid: Uuid,
    pub image_obj_key: String,
    pub is_valid: bool,
    pub reason: String,
    pub confidence: f64,
    pub model_id: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateFullviewValidationLog {
    pub image_obj_key: String,
    pub is_valid: bool,
    pub reason: String,
    pub confidence: f64,
    pub model_id: String,
}

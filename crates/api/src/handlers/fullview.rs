//! Handlers for full-view validation of tree photos (admin only).

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use hanami_core::error::CoreError;
use hanami_core::fullview::FullviewValidationResult;
use hanami_core::types::DbId;
use hanami_db::models::fullview_validation_log::{
    CreateFullviewValidationLog, FullviewValidationLog,
};
use hanami_db::repositories::{FullviewValidationLogRepo, PhotoRepo};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the uploaded photo.
const IMAGE_FIELD: &str = "image";

const DEFAULT_LOG_LIMIT: i64 = 50;
const MAX_LOG_LIMIT: i64 = 200;

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct FullviewValidationResponse {
    /// Set when a stored photo was validated.
    pub entire_tree_id: Option<DbId>,
    pub is_valid: bool,
    pub reason: String,
    pub confidence: f64,
    pub model_id: String,
    /// Validation log entry, when one was written.
    #[ts(type = "string | null")]
    pub log_uid: Option<Uuid>,
}

/// POST /annotation_api/trees/{id}/fullview_validation
///
/// Validates the stored photo and always records the verdict.
pub async fn validate_tree_photo(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FullviewValidationResponse>>> {
    let photo = PhotoRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Photo", id }))?;

    let image = state.images.fetch(&photo.image_obj_key).await?;
    let result = state.validator.validate(&image).await;
    let log_uid = record(&state, &photo.image_obj_key, &result).await?;

    tracing::info!(
        entire_tree_id = id,
        admin_id = admin.id(),
        is_valid = result.is_valid,
        "Stored photo validated"
    );

    Ok(Json(DataResponse {
        data: response(&state, Some(id), result, Some(log_uid)),
    }))
}

/// POST /annotation_api/debug/fullview_validation
///
/// Validates an uploaded photo. Only rejections are recorded.
pub async fn validate_upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<FullviewValidationResponse>>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((file_name, data.to_vec()));
        break;
    }

    let (file_name, image) = upload
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Multipart field '{IMAGE_FIELD}' is required")))?;

    let result = state.validator.validate(&image).await;
    let log_uid = if result.is_valid {
        None
    } else {
        Some(record(&state, &format!("upload/{file_name}"), &result).await?)
    };

    tracing::info!(
        admin_id = admin.id(),
        file_name = %file_name,
        size = image.len(),
        is_valid = result.is_valid,
        "Uploaded photo validated"
    );

    Ok(Json(DataResponse {
        data: response(&state, None, result, log_uid),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LogListParams {
    pub limit: Option<i64>,
}

/// GET /annotation_api/debug/fullview_validation/logs
pub async fn list_validation_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<LogListParams>,
) -> AppResult<Json<DataResponse<Vec<FullviewValidationLog>>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let logs = FullviewValidationLogRepo::list_recent(&state.pool, limit).await?;
    Ok(Json(DataResponse { data: logs }))
}

async fn record(
    state: &AppState,
    image_obj_key: &str,
    result: &FullviewValidationResult,
) -> AppResult<Uuid> {
    let log = FullviewValidationLogRepo::create(
        &state.pool,
        &CreateFullviewValidationLog {
            image_obj_key: image_obj_key.to_string(),
            is_valid: result.is_valid,
            reason: result.reason.clone(),
            confidence: result.confidence,
            model_id: state.validator.model_id().to_string(),
        },
    )
    .await?;
    Ok(log.uid)
}

fn response(
    state: &AppState,
    entire_tree_id: Option<DbId>,
    result: FullviewValidationResult,
    log_uid: Option<Uuid>,
) -> FullviewValidationResponse {
    FullviewValidationResponse {
        entire_tree_id,
        is_valid: result.is_valid,
        reason: result.reason,
        confidence: result.confidence,
        model_id: state.validator.model_id().to_string(),
        log_uid,
    }
}

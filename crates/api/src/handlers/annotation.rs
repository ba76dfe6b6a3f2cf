//! Handlers for the annotation gallery: list, detail, saving labels,
//! readiness curation, lookups and CSV export.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, NaiveDate};
use hanami_core::annotation::{annotation_state, can_access_photo, navigate};
use hanami_core::bloom::BloomStatus;
use hanami_core::error::CoreError;
use hanami_core::export::{build_export_csv, ExportLine};
use hanami_core::flowering::SpotDates;
use hanami_core::prefecture::{name_for_code, Prefecture, PREFECTURES};
use hanami_core::types::{DbId, Timestamp};
use hanami_core::vitality::validate_vitality_value;
use hanami_db::models::annotation::{AnnotationListRow, AnnotationStatsRow};
use hanami_db::models::photo::PhotoDetailRow;
use hanami_db::repositories::{AnnotationRepo, PhotoRepo};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::{ExportParams, TreeListParams};
use crate::response::DataResponse;
use crate::state::AppState;

const EXPORT_FILE_NAME: &str = "annotations.csv";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct TreeListItem {
    pub entire_tree_id: DbId,
    pub tree_id: DbId,
    pub thumb_url: String,
    pub image_url: String,
    pub photo_date: Option<Timestamp>,
    pub location: String,
    pub prefecture_code: Option<String>,
    pub prefecture_name: String,
    pub bloom_status: Option<String>,
    pub bloom_status_label: Option<String>,
    pub vitality_value: Option<i32>,
    /// `"annotated"` or `"unannotated"`.
    pub annotation_status: String,
    pub is_ready: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct TreeListResponse {
    pub items: Vec<TreeListItem>,
    /// Photos matching the filter, across all pages.
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub stats: AnnotationStatsRow,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct TreeDetailResponse {
    pub entire_tree_id: DbId,
    pub tree_id: DbId,
    pub image_url: String,
    pub photo_date: Option<Timestamp>,
    pub prefecture_code: Option<String>,
    pub prefecture_name: String,
    pub location: String,
    /// Address of the nearest flowering forecast spot.
    pub nearest_spot_address: Option<String>,
    pub flowering_date: Option<NaiveDate>,
    pub full_bloom_start_date: Option<NaiveDate>,
    pub full_bloom_end_date: Option<NaiveDate>,
    pub current_vitality_value: Option<i32>,
    pub is_ready: bool,
    pub bloom_status: Option<String>,
    pub bloom_status_label: Option<String>,
    /// Zero-based position in the filtered list, `-1` when outside it.
    pub current_index: i64,
    pub total_count: i64,
    pub prev_id: Option<DbId>,
    pub next_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAnnotationRequest {
    pub vitality_value: i32,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct SaveAnnotationResponse {
    pub entire_tree_id: DbId,
    pub vitality_value: i32,
    pub annotated_at: Timestamp,
    pub annotator_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIsReadyRequest {
    pub is_ready: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct UpdateIsReadyResponse {
    pub entire_tree_id: DbId,
    pub is_ready: bool,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BatchIsReadyRequest {
    #[validate(length(min = 1, max = 500, message = "entire_tree_ids must hold 1 to 500 ids"))]
    pub entire_tree_ids: Vec<DbId>,
    pub is_ready: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct BatchIsReadyResponse {
    pub updated_count: usize,
    pub updated_ids: Vec<DbId>,
    /// Requested ids with no matching photo.
    pub skipped_ids: Vec<DbId>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct BloomStatusOption {
    pub key: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Gallery
// ---------------------------------------------------------------------------

/// GET /annotation_api/trees
pub async fn list_trees(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<DataResponse<TreeListResponse>>> {
    let params = TreeListParams::from_pairs(pairs)?;
    let filter = params.filter()?.resolve_for(user.role);
    let page = params.pagination()?;

    let rows = AnnotationRepo::list(&state.pool, &filter, &page).await?;
    let total = AnnotationRepo::count(&state.pool, &filter).await?;
    let stats = AnnotationRepo::stats(&state.pool, user.role).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(list_item(&state, row).await);
    }

    Ok(Json(DataResponse {
        data: TreeListResponse {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            stats,
        },
    }))
}

/// GET /annotation_api/trees/{id}
///
/// Accepts the same filter query as the list so prev/next follow the list
/// the annotator came from.
pub async fn get_tree(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<DataResponse<TreeDetailResponse>>> {
    let params = TreeListParams::from_pairs(pairs)?;
    let filter = params.filter()?.resolve_for(user.role);

    let photo = find_accessible_photo(&state, &user, id).await?;
    let ids = AnnotationRepo::navigation_ids(&state.pool, &filter).await?;
    let nav = navigate(&ids, id);

    Ok(Json(DataResponse {
        data: detail_response(&state, photo, nav).await,
    }))
}

/// POST /annotation_api/trees/{id}/annotation
pub async fn save_annotation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<SaveAnnotationRequest>,
) -> AppResult<Json<DataResponse<SaveAnnotationResponse>>> {
    validate_vitality_value(input.vitality_value)?;
    find_accessible_photo(&state, &user, id).await?;

    let record =
        AnnotationRepo::upsert_vitality(&state.pool, id, user.id(), input.vitality_value).await?;

    tracing::info!(
        entire_tree_id = id,
        annotator_id = user.id(),
        vitality_value = input.vitality_value,
        "Annotation saved"
    );

    Ok(Json(DataResponse {
        data: SaveAnnotationResponse {
            entire_tree_id: id,
            vitality_value: input.vitality_value,
            annotated_at: record.annotated_at.unwrap_or(record.updated_at),
            annotator_id: user.id(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Readiness (admin)
// ---------------------------------------------------------------------------

/// PATCH /annotation_api/trees/{id}/is_ready
pub async fn update_is_ready(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateIsReadyRequest>,
) -> AppResult<Json<DataResponse<UpdateIsReadyResponse>>> {
    if !PhotoRepo::exists(&state.pool, id).await? {
        return Err(photo_not_found(id));
    }

    let record = AnnotationRepo::upsert_is_ready(&state.pool, id, input.is_ready).await?;

    tracing::info!(
        entire_tree_id = id,
        is_ready = input.is_ready,
        admin_id = admin.id(),
        "Readiness updated"
    );

    Ok(Json(DataResponse {
        data: UpdateIsReadyResponse {
            entire_tree_id: id,
            is_ready: record.is_ready,
            updated_at: record.updated_at,
        },
    }))
}

/// PATCH /annotation_api/trees/is_ready/batch
pub async fn update_is_ready_batch(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<BatchIsReadyRequest>,
) -> AppResult<Json<DataResponse<BatchIsReadyResponse>>> {
    input.validate()?;

    let updated_ids =
        AnnotationRepo::upsert_is_ready_batch(&state.pool, &input.entire_tree_ids, input.is_ready)
            .await?;
    let skipped_ids = skipped_ids(&input.entire_tree_ids, &updated_ids);

    tracing::info!(
        requested = input.entire_tree_ids.len(),
        updated = updated_ids.len(),
        skipped = skipped_ids.len(),
        is_ready = input.is_ready,
        admin_id = admin.id(),
        "Batch readiness updated"
    );

    Ok(Json(DataResponse {
        data: BatchIsReadyResponse {
            updated_count: updated_ids.len(),
            updated_ids,
            skipped_ids,
        },
    }))
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// GET /annotation_api/prefectures
pub async fn list_prefectures(_user: AuthUser) -> Json<DataResponse<&'static [Prefecture]>> {
    Json(DataResponse {
        data: PREFECTURES.as_slice(),
    })
}

/// GET /annotation_api/bloom_statuses
pub async fn list_bloom_statuses(_user: AuthUser) -> Json<DataResponse<Vec<BloomStatusOption>>> {
    let options = BloomStatus::ALL
        .iter()
        .map(|s| BloomStatusOption {
            key: s.key().to_string(),
            label: s.label().to_string(),
        })
        .collect();
    Json(DataResponse { data: options })
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// GET /annotation_api/export/csv
pub async fn export_csv(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let rows = AnnotationRepo::export_rows(&state.pool, params.include_undiagnosable).await?;
    let lines: Vec<ExportLine> = rows
        .into_iter()
        .map(|r| ExportLine {
            image_obj_key: r.image_obj_key,
            vitality_value: r.vitality_value,
        })
        .collect();
    let body = build_export_csv(&state.config.storage.contents_bucket, &lines);

    tracing::info!(
        annotator_id = user.id(),
        rows = lines.len(),
        include_undiagnosable = params.include_undiagnosable,
        "Annotations exported"
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={EXPORT_FILE_NAME}"),
            ),
        ],
        body,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn photo_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Photo", id })
}

/// Load a photo, enforcing that annotators only reach ready photos.
async fn find_accessible_photo(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<PhotoDetailRow> {
    let photo = PhotoRepo::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| photo_not_found(id))?;
    if !can_access_photo(user.role, photo.is_ready) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Photo {id} is not ready for annotation"
        ))));
    }
    Ok(photo)
}

async fn list_item(state: &AppState, row: AnnotationListRow) -> TreeListItem {
    let thumb_key = row.thumb_obj_key.as_deref().unwrap_or(&row.image_obj_key);
    let thumb_url = state.images.image_url(thumb_key).await;
    let image_url = state.images.image_url(&row.image_obj_key).await;

    TreeListItem {
        entire_tree_id: row.entire_tree_id,
        tree_id: row.tree_id,
        thumb_url,
        image_url,
        photo_date: row.photo_date,
        location: row.location.unwrap_or_default(),
        prefecture_name: name_for_code(row.prefecture_code.as_deref()).to_string(),
        prefecture_code: row.prefecture_code,
        bloom_status_label: bloom_label(row.bloom_status.as_deref()),
        bloom_status: row.bloom_status,
        annotation_status: annotation_state(row.vitality_value).to_string(),
        vitality_value: row.vitality_value,
        is_ready: row.is_ready,
    }
}

async fn detail_response(
    state: &AppState,
    photo: PhotoDetailRow,
    nav: hanami_core::annotation::Navigation,
) -> TreeDetailResponse {
    let image_url = state.images.image_url(&photo.image_obj_key).await;

    // A tree at 0.0 has no recorded position.
    let spot = if photo.latitude != 0.0 && photo.longitude != 0.0 {
        state
            .bloom
            .calendar()
            .find_nearest_spot(photo.latitude, photo.longitude)
    } else {
        None
    };
    let dates = match (spot, photo.photo_date) {
        (Some(spot), Some(taken)) => SpotDates::for_year(spot, taken.date_naive().year()),
        _ => None,
    };

    TreeDetailResponse {
        entire_tree_id: photo.id,
        tree_id: photo.tree_id,
        image_url,
        photo_date: photo.photo_date,
        prefecture_name: name_for_code(photo.prefecture_code.as_deref()).to_string(),
        prefecture_code: photo.prefecture_code,
        location: photo.location.unwrap_or_default(),
        nearest_spot_address: spot.map(|s| s.address.clone()),
        flowering_date: dates.map(|d| d.flowering),
        full_bloom_start_date: dates.map(|d| d.full_bloom_start),
        full_bloom_end_date: dates.map(|d| d.full_bloom_end),
        current_vitality_value: photo.vitality_value,
        is_ready: photo.is_ready,
        bloom_status_label: bloom_label(photo.bloom_status.as_deref()),
        bloom_status: photo.bloom_status,
        current_index: nav.current_index,
        total_count: nav.total_count,
        prev_id: nav.prev_id,
        next_id: nav.next_id,
    }
}

fn bloom_label(key: Option<&str>) -> Option<String> {
    BloomStatus::label_for_key(key).map(str::to_string)
}

/// Requested ids that were not updated, deduplicated and ascending.
fn skipped_ids(requested: &[DbId], updated: &[DbId]) -> Vec<DbId> {
    let mut skipped: Vec<DbId> = requested
        .iter()
        .copied()
        .filter(|id| updated.binary_search(id).is_err())
        .collect();
    skipped.sort_unstable();
    skipped.dedup();
    skipped
}

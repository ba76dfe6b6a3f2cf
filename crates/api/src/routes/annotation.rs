//! Route definitions for the annotation gallery and full-view validation.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{annotation, fullview};
use crate::state::AppState;

/// Upload limit for debug validation; phone photos exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// ```text
/// GET   /trees                              list_trees
/// PATCH /trees/is_ready/batch               update_is_ready_batch (admin)
/// GET   /trees/{id}                         get_tree
/// POST  /trees/{id}/annotation              save_annotation
/// PATCH /trees/{id}/is_ready                update_is_ready (admin)
/// POST  /trees/{id}/fullview_validation     validate_tree_photo (admin)
/// GET   /prefectures                        list_prefectures
/// GET   /bloom_statuses                     list_bloom_statuses
/// GET   /export/csv                         export_csv
/// POST  /debug/fullview_validation          validate_upload (admin)
/// GET   /debug/fullview_validation/logs     list_validation_logs (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trees", get(annotation::list_trees))
        .route(
            "/trees/is_ready/batch",
            patch(annotation::update_is_ready_batch),
        )
        .route("/trees/{id}", get(annotation::get_tree))
        .route("/trees/{id}/annotation", post(annotation::save_annotation))
        .route("/trees/{id}/is_ready", patch(annotation::update_is_ready))
        .route(
            "/trees/{id}/fullview_validation",
            post(fullview::validate_tree_photo),
        )
        .route("/prefectures", get(annotation::list_prefectures))
        .route("/bloom_statuses", get(annotation::list_bloom_statuses))
        .route("/export/csv", get(annotation::export_csv))
        .route(
            "/debug/fullview_validation",
            post(fullview::validate_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/debug/fullview_validation/logs",
            get(fullview::list_validation_logs),
        )
}

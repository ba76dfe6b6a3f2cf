pub mod annotation;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/annotation_api` route tree.
///
/// ```text
/// /login                                     login (public)
/// /me                                        current annotator
///
/// /trees                                     gallery list
/// /trees/{id}                                detail with navigation
/// /trees/{id}/annotation                     save vitality
/// /trees/{id}/is_ready                       readiness (admin)
/// /trees/is_ready/batch                      batch readiness (admin)
/// /trees/{id}/fullview_validation            validate stored photo (admin)
///
/// /prefectures                               prefecture lookup
/// /bloom_statuses                            bloom status lookup
/// /export/csv                                annotation CSV download
///
/// /debug/fullview_validation                 validate uploaded photo (admin)
/// /debug/fullview_validation/logs            recent verdicts (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(annotation::router())
}

//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hanami_core::error::CoreError;
use hanami_core::roles::Role;
use hanami_db::models::annotator::Annotator;
use hanami_db::repositories::AnnotatorRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated annotator extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// The account is re-loaded from the database on every request, so a deleted
/// annotator is locked out immediately and role changes apply without a new
/// token.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(annotator_id = user.annotator.id, role = user.role.as_str(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub annotator: Annotator,
    pub role: Role,
}

impl AuthUser {
    pub fn id(&self) -> hanami_core::types::DbId {
        self.annotator.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let annotator = AnnotatorRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Annotator no longer exists".into()))
            })?;
        let role = annotator.role()?;

        Ok(AuthUser { annotator, role })
    }
}

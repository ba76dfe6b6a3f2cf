//! Handlers for login and the current annotator.

use axum::extract::State;
use axum::Json;
use hanami_core::error::CoreError;
use hanami_core::password::verify_password;
use hanami_db::models::annotator::AnnotatorResponse;
use hanami_db::repositories::AnnotatorRepo;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful login response. Not wrapped in the data envelope.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /annotation_api/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    input.validate()?;

    let Some(annotator) = AnnotatorRepo::find_by_username(&state.pool, &input.username).await?
    else {
        tracing::warn!(username = %input.username, "Login attempt for unknown annotator");
        return Err(invalid_credentials());
    };

    let password_valid = verify_password(&input.password, &annotator.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::warn!(annotator_id = annotator.id, "Login attempt with wrong password");
        return Err(invalid_credentials());
    }

    AnnotatorRepo::record_login(&state.pool, annotator.id).await?;

    let access_token = generate_access_token(annotator.id, &annotator.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(annotator_id = annotator.id, role = %annotator.role, "Annotator logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /annotation_api/me
pub async fn me(user: AuthUser) -> AppResult<Json<DataResponse<AnnotatorResponse>>> {
    Ok(Json(DataResponse {
        data: AnnotatorResponse::from(&user.annotator),
    }))
}

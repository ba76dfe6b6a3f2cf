//! Annotator accounts.

use hanami_core::error::CoreError;
use hanami_core::roles::Role;
use hanami_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;

/// Full row from the `annotators` table.
///
/// Carries the password hash; use [`AnnotatorResponse`] for API output.
#[derive(Debug, Clone, FromRow)]
pub struct Annotator {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub last_login: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Annotator {
    pub fn role(&self) -> Result<Role, CoreError> {
        Role::parse(&self.role)
    }
}

/// Annotator as returned to clients.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct AnnotatorResponse {
    pub id: DbId,
    pub username: String,
    pub role: String,
    pub last_login: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<&Annotator> for AnnotatorResponse {
    fn from(a: &Annotator) -> Self {
        Self {
            id: a.id,
            username: a.username.clone(),
            role: a.role.clone(),
            last_login: a.last_login,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAnnotator {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

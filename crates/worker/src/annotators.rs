//! Annotator account provisioning. There is no sign-up endpoint; accounts
//! are created here.

use anyhow::{anyhow, bail};
use hanami_core::password::{hash_password, validate_password_strength};
use hanami_core::roles::Role;
use hanami_db::models::annotator::{Annotator, CreateAnnotator};
use hanami_db::repositories::AnnotatorRepo;
use hanami_db::DbPool;

/// Validate and hash a password without touching the database.
pub fn hash(password: &str) -> anyhow::Result<String> {
    validate_password_strength(password)?;
    hash_password(password).map_err(|e| anyhow!("Password hashing failed: {e}"))
}

pub async fn create(
    pool: &DbPool,
    username: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Annotator> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > 50 {
        bail!("username must be 1 to 50 characters");
    }
    if AnnotatorRepo::find_by_username(pool, username).await?.is_some() {
        bail!("annotator '{username}' already exists");
    }

    let annotator = AnnotatorRepo::create(
        pool,
        &CreateAnnotator {
            username: username.to_string(),
            password_hash: hash(password)?,
            role: role.as_str().to_string(),
        },
    )
    .await?;

    tracing::info!(annotator_id = annotator.id, username = %annotator.username, role = %annotator.role, "Annotator created");
    Ok(annotator)
}

pub async fn list(pool: &DbPool) -> anyhow::Result<Vec<Annotator>> {
    Ok(AnnotatorRepo::list(pool).await?)
}

pub async fn delete(pool: &DbPool, username: &str) -> anyhow::Result<()> {
    if !AnnotatorRepo::delete_by_username(pool, username).await? {
        bail!("annotator '{username}' not found");
    }
    tracing::info!(username, "Annotator deleted");
    Ok(())
}

/// One line of `annotator list` output.
pub fn format_row(a: &Annotator) -> String {
    let last_login = a
        .last_login
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{:>5}  {:<20}  {:<10}  {last_login}", a.id, a.username, a.role)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn hash_rejects_short_passwords() {
        assert!(hash("short").is_err());
        assert!(hash("long-enough-pass").unwrap().starts_with("$argon2"));
    }

    #[test]
    fn row_shows_dash_for_never_logged_in() {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 9, 30, 0).unwrap();
        let mut a = Annotator {
            id: 3,
            username: "hanako".into(),
            password_hash: String::new(),
            role: "annotator".into(),
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        assert!(format_row(&a).ends_with('-'));
        a.last_login = Some(now);
        assert!(format_row(&a).ends_with("2025-04-01 09:30"));
    }
}

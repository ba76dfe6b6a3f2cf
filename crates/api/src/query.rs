//! Shared query parameter types for API handlers.
//!
//! The gallery filter is shared between `GET /trees` and `GET /trees/{id}`
//! so the detail view navigates exactly the list the annotator came from.

use chrono::NaiveDate;
use hanami_core::annotation::{AnnotationFilter, AnnotationStatus, Pagination};
use hanami_core::error::CoreError;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;

/// Gallery filter and paging from the query string.
///
/// Built from raw key/value pairs because `bloom_status` may be repeated
/// (`?bloom_status=a&bloom_status=b`) or comma separated
/// (`?bloom_status=a,b`), which a flat serde struct cannot express. Empty
/// values count as absent.
#[derive(Debug, Default, Clone, Validate)]
pub struct TreeListParams {
    pub status: AnnotationStatus,
    #[validate(length(equal = 2, message = "prefecture_code must be a two-digit code"))]
    pub prefecture_code: Option<String>,
    pub vitality_value: Option<i32>,
    pub photo_date_from: Option<NaiveDate>,
    pub photo_date_to: Option<NaiveDate>,
    pub is_ready: Option<bool>,
    pub bloom_statuses: Vec<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl TreeListParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "status" => params.status = parse_status(value)?,
                "prefecture_code" => params.prefecture_code = Some(value.to_string()),
                "vitality_value" => params.vitality_value = Some(parse_value(&key, value)?),
                "photo_date_from" => params.photo_date_from = Some(parse_date(&key, value)?),
                "photo_date_to" => params.photo_date_to = Some(parse_date(&key, value)?),
                "is_ready" => params.is_ready = Some(parse_value(&key, value)?),
                "bloom_status" => params.bloom_statuses.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                ),
                "page" => params.page = Some(parse_value(&key, value)?),
                "per_page" => params.per_page = Some(parse_value(&key, value)?),
                _ => {}
            }
        }
        params.validate()?;
        Ok(params)
    }

    /// The filter part, validated but not yet resolved for a role.
    pub fn filter(&self) -> Result<AnnotationFilter, AppError> {
        let filter = AnnotationFilter {
            status: self.status,
            prefecture_code: self.prefecture_code.clone(),
            vitality_value: self.vitality_value,
            photo_date_from: self.photo_date_from,
            photo_date_to: self.photo_date_to,
            is_ready: self.is_ready,
            bloom_statuses: self.bloom_statuses.clone(),
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn pagination(&self) -> Result<Pagination, AppError> {
        Ok(Pagination::new(self.page, self.per_page)?)
    }
}

fn parse_status(value: &str) -> Result<AnnotationStatus, AppError> {
    match value {
        "all" => Ok(AnnotationStatus::All),
        "annotated" => Ok(AnnotationStatus::Annotated),
        "unannotated" => Ok(AnnotationStatus::Unannotated),
        other => Err(invalid("status", other)),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> AppError {
    AppError::Core(CoreError::Validation(format!(
        "Invalid value '{value}' for query parameter '{key}'"
    )))
}

/// Query parameters for `GET /export/csv`.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(default = "default_true")]
    pub include_undiagnosable: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bloom_status_accepts_repeated_and_comma_separated_values() {
        let params = TreeListParams::from_pairs(pairs(&[
            ("bloom_status", "full_bloom,falling"),
            ("bloom_status", "blooming"),
        ]))
        .unwrap();
        assert_eq!(params.bloom_statuses, vec!["full_bloom", "falling", "blooming"]);
    }

    #[test]
    fn empty_values_are_ignored() {
        let params = TreeListParams::from_pairs(pairs(&[
            ("prefecture_code", ""),
            ("vitality_value", ""),
            ("status", "annotated"),
        ]))
        .unwrap();
        assert_eq!(params.prefecture_code, None);
        assert_eq!(params.vitality_value, None);
        assert_eq!(params.status, AnnotationStatus::Annotated);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_matches!(
            TreeListParams::from_pairs(pairs(&[("status", "done")])),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(
            TreeListParams::from_pairs(pairs(&[("photo_date_from", "2025/04/01")])),
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_matches!(
            TreeListParams::from_pairs(pairs(&[("prefecture_code", "130")])),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn filter_rejects_unknown_bloom_status() {
        let params =
            TreeListParams::from_pairs(pairs(&[("bloom_status", "wilted")])).unwrap();
        assert!(params.filter().is_err());
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        let params = TreeListParams::from_pairs(vec![]).unwrap();
        assert_eq!(params.pagination().unwrap(), Pagination::default());

        let params = TreeListParams::from_pairs(pairs(&[("per_page", "101")])).unwrap();
        assert!(params.pagination().is_err());
    }
}

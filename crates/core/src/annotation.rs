//! Annotation list filtering, pagination and detail navigation.
//!
//! The same [`AnnotationFilter`] drives the gallery list, its statistics and
//! the prev/next navigation on the detail view, so a photo's position in
//! the detail view always matches its position in the list.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::bloom::BloomStatus;
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};
use crate::vitality::validate_vitality_value;

/// Default page size for the gallery list.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Upper bound for `per_page`.
pub const MAX_PER_PAGE: i64 = 100;

// ---------------------------------------------------------------------------
// Status filter
// ---------------------------------------------------------------------------

/// Annotation state filter for the list and navigation queries.
///
/// A photo counts as annotated when an annotation record exists and carries
/// a vitality value. Records created only to hold the readiness flag have a
/// null vitality and count as unannotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    #[default]
    All,
    Annotated,
    Unannotated,
}

impl AnnotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Annotated => "annotated",
            Self::Unannotated => "unannotated",
        }
    }
}

/// Per-item annotation state reported in list responses.
pub fn annotation_state(vitality_value: Option<i32>) -> &'static str {
    if vitality_value.is_some() {
        AnnotationStatus::Annotated.as_str()
    } else {
        AnnotationStatus::Unannotated.as_str()
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Filter conditions shared by list, stats and navigation.
#[derive(Debug, Clone, Default)]
pub struct AnnotationFilter {
    pub status: AnnotationStatus,
    pub prefecture_code: Option<String>,
    /// Only applied when `status` is [`AnnotationStatus::Annotated`].
    pub vitality_value: Option<i32>,
    /// Inclusive lower bound on the photo's calendar day.
    pub photo_date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the photo's calendar day.
    pub photo_date_to: Option<NaiveDate>,
    /// Requested readiness filter. See [`AnnotationFilter::resolve_for`].
    pub is_ready: Option<bool>,
    /// Bloom status keys; empty means no bloom filter.
    pub bloom_statuses: Vec<String>,
}

impl AnnotationFilter {
    /// Validate user-supplied values.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(v) = self.vitality_value {
            validate_vitality_value(v)?;
        }
        if let (Some(from), Some(to)) = (self.photo_date_from, self.photo_date_to) {
            if from > to {
                return Err(CoreError::Validation(format!(
                    "photo_date_from ({from}) must not be after photo_date_to ({to})"
                )));
            }
        }
        for key in &self.bloom_statuses {
            BloomStatus::from_key(key)?;
        }
        Ok(())
    }

    /// Apply role rules: annotators are always restricted to ready photos,
    /// admins may filter on readiness freely.
    pub fn resolve_for(mut self, role: Role) -> Self {
        self.is_ready = effective_is_ready(role, self.is_ready);
        self
    }

    /// Vitality filter after applying the "annotated only" rule.
    pub fn effective_vitality(&self) -> Option<i32> {
        match self.status {
            AnnotationStatus::Annotated => self.vitality_value,
            _ => None,
        }
    }

    /// Photo timestamp bounds as a half-open range `[from, to)`.
    ///
    /// The upper bound is midnight UTC of the day after `photo_date_to` so
    /// the whole final day is included.
    pub fn photo_date_bounds(&self) -> (Option<Timestamp>, Option<Timestamp>) {
        let from = self
            .photo_date_from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        let to = self
            .photo_date_to
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        (from, to)
    }

    /// Bloom keys as a bind-friendly option (`None` when unfiltered).
    pub fn bloom_filter(&self) -> Option<&[String]> {
        if self.bloom_statuses.is_empty() {
            None
        } else {
            Some(&self.bloom_statuses)
        }
    }
}

/// Readiness filter actually applied for `role`.
pub fn effective_is_ready(role: Role, requested: Option<bool>) -> Option<bool> {
    match role {
        Role::Annotator => Some(true),
        Role::Admin => requested,
    }
}

/// Whether `role` may open or annotate a photo with the given readiness.
pub fn can_access_photo(role: Role, is_ready: bool) -> bool {
    role.is_admin() || is_ready
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Validated page/per_page pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Build from optional query values, rejecting out-of-range input.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Result<Self, CoreError> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page < 1 {
            return Err(CoreError::Validation(format!(
                "page must be >= 1, got {page}"
            )));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(CoreError::Validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}, got {per_page}"
            )));
        }
        Ok(Self { page, per_page })
    }

    /// Saturates instead of overflowing; a page past the end is just empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Position of a photo inside the filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Zero-based index, or `-1` when the photo is not part of the filter.
    pub current_index: i64,
    pub total_count: i64,
    pub prev_id: Option<DbId>,
    pub next_id: Option<DbId>,
}

/// Compute navigation from the ordered id list of the current filter.
///
/// `ordered_ids` must be in display order (newest photo first).
pub fn navigate(ordered_ids: &[DbId], current_id: DbId) -> Navigation {
    let total_count = ordered_ids.len() as i64;
    match ordered_ids.iter().position(|&id| id == current_id) {
        Some(i) => Navigation {
            current_index: i as i64,
            total_count,
            prev_id: i.checked_sub(1).map(|p| ordered_ids[p]),
            next_id: ordered_ids.get(i + 1).copied(),
        },
        None => Navigation {
            current_index: -1,
            total_count,
            prev_id: None,
            next_id: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn annotators_are_forced_to_ready() {
        assert_eq!(effective_is_ready(Role::Annotator, None), Some(true));
        assert_eq!(effective_is_ready(Role::Annotator, Some(false)), Some(true));
    }

    #[test]
    fn admins_keep_requested_readiness() {
        assert_eq!(effective_is_ready(Role::Admin, None), None);
        assert_eq!(effective_is_ready(Role::Admin, Some(false)), Some(false));
    }

    #[test]
    fn vitality_filter_only_applies_to_annotated() {
        let mut filter = AnnotationFilter {
            vitality_value: Some(3),
            ..Default::default()
        };
        assert_eq!(filter.effective_vitality(), None);

        filter.status = AnnotationStatus::Unannotated;
        assert_eq!(filter.effective_vitality(), None);

        filter.status = AnnotationStatus::Annotated;
        assert_eq!(filter.effective_vitality(), Some(3));
    }

    #[test]
    fn photo_date_bounds_cover_whole_last_day() {
        let filter = AnnotationFilter {
            photo_date_from: NaiveDate::from_ymd_opt(2025, 4, 1),
            photo_date_to: NaiveDate::from_ymd_opt(2025, 4, 10),
            ..Default::default()
        };
        let (from, to) = filter.photo_date_bounds();
        assert_eq!(from.unwrap().to_rfc3339(), "2025-04-01T00:00:00+00:00");
        assert_eq!(to.unwrap().to_rfc3339(), "2025-04-11T00:00:00+00:00");
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let filter = AnnotationFilter {
            photo_date_from: NaiveDate::from_ymd_opt(2025, 4, 10),
            photo_date_to: NaiveDate::from_ymd_opt(2025, 4, 1),
            ..Default::default()
        };
        assert_matches!(filter.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validate_rejects_unknown_bloom_key() {
        let filter = AnnotationFilter {
            bloom_statuses: vec!["full_bloom".into(), "snowing".into()],
            ..Default::default()
        };
        assert_matches!(filter.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn pagination_defaults_and_offset() {
        let p = Pagination::new(None, None).unwrap();
        assert_eq!(p, Pagination::default());
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(Some(3), Some(25)).unwrap();
        assert_eq!(p.offset(), 50);
        assert_eq!(p.limit(), 25);
    }

    #[test]
    fn pagination_rejects_out_of_range() {
        assert!(Pagination::new(Some(0), None).is_err());
        assert!(Pagination::new(None, Some(0)).is_err());
        assert!(Pagination::new(None, Some(101)).is_err());
        assert!(Pagination::new(None, Some(100)).is_ok());
    }

    #[test]
    fn huge_page_offset_saturates() {
        let p = Pagination::new(Some(i64::MAX), Some(100)).unwrap();
        assert_eq!(p.offset(), i64::MAX);
    }

    #[test]
    fn navigation_in_the_middle() {
        let nav = navigate(&[50, 40, 30, 20], 30);
        assert_eq!(
            nav,
            Navigation {
                current_index: 2,
                total_count: 4,
                prev_id: Some(40),
                next_id: Some(20),
            }
        );
    }

    #[test]
    fn navigation_at_edges() {
        let first = navigate(&[50, 40], 50);
        assert_eq!(first.prev_id, None);
        assert_eq!(first.next_id, Some(40));

        let last = navigate(&[50, 40], 40);
        assert_eq!(last.prev_id, Some(50));
        assert_eq!(last.next_id, None);
    }

    #[test]
    fn navigation_outside_filter() {
        let nav = navigate(&[50, 40], 7);
        assert_eq!(nav.current_index, -1);
        assert_eq!(nav.total_count, 2);
        assert_eq!(nav.prev_id, None);
        assert_eq!(nav.next_id, None);
    }

    #[test]
    fn access_rules() {
        assert!(can_access_photo(Role::Admin, false));
        assert!(can_access_photo(Role::Annotator, true));
        assert!(!can_access_photo(Role::Annotator, false));
    }

    #[test]
    fn annotation_state_follows_vitality() {
        assert_eq!(annotation_state(Some(-1)), "annotated");
        assert_eq!(annotation_state(None), "unannotated");
    }
}

//! Well-known annotator role names.
//!
//! These must match the `chk_annotators_role` check constraint in
//! `20260113000001_create_annotation_tables.sql`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_ANNOTATOR: &str = "annotator";

/// All valid role strings.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_ANNOTATOR];

/// Role of an annotator account.
///
/// Admins curate which photos are ready for annotation; annotators only ever
/// see photos that an admin has marked ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Annotator,
}

impl Role {
    /// Parse a role from its database string value.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_ANNOTATOR => Ok(Self::Annotator),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }

    /// Database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Annotator => ROLE_ANNOTATOR,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_known_roles() {
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("annotator").unwrap(), Role::Annotator);
    }

    #[test]
    fn rejects_unknown_role() {
        assert_matches!(Role::parse("reviewer"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn as_str_round_trips() {
        for role in [Role::Admin, Role::Annotator] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
    }
}

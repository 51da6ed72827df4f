use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::database::tenancy::TenantScoped;

/// Membership of a user in an organization. One row per (organization, user)
/// pair, enforced by a unique constraint on the table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationUser {
    pub id: i64,
    pub organization_id: i64,
    pub user_id: i64,
    pub role: OrgRole,
    /// Per-user permission overrides on top of the role defaults.
    pub permissions: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Stored in a TEXT column; see the note on SubscriptionPlan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrgRole {
    Owner,
    Admin,
    Manager,
    Viewer,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "OWNER",
            OrgRole::Admin => "ADMIN",
            OrgRole::Manager => "MANAGER",
            OrgRole::Viewer => "VIEWER",
        }
    }

    /// Roles allowed to mutate tenant data through the CRUD routes.
    pub fn can_write(&self) -> bool {
        !matches!(self, OrgRole::Viewer)
    }
}

impl std::str::FromStr for OrgRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OWNER" => Ok(OrgRole::Owner),
            "ADMIN" => Ok(OrgRole::Admin),
            "MANAGER" => Ok(OrgRole::Manager),
            "VIEWER" => Ok(OrgRole::Viewer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl TenantScoped for OrganizationUser {
    const TABLE: &'static str = "organization_users";
    const WRITABLE_COLUMNS: &'static [&'static str] = &["user_id", "role", "permissions"];
    const COLUMN_CASTS: &'static [(&'static str, &'static str)] =
        &[("user_id", "bigint"), ("permissions", "jsonb")];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_cannot_write() {
        assert!(!OrgRole::Viewer.can_write());
        assert!(OrgRole::Owner.can_write());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<OrgRole>().unwrap(), OrgRole::Admin);
        assert!("superhero".parse::<OrgRole>().is_err());
    }

    #[test]
    fn role_decodes_from_text_column() {
        use sqlx::{Postgres, Type};

        assert_eq!(<OrgRole as Type<Postgres>>::type_info().to_string(), "TEXT");
    }
}

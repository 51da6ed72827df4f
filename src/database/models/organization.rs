use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A tenant. Owns every tenant-scoped row transitively through the
/// ON DELETE CASCADE foreign keys, so deleting an organization is a
/// destructive admin-only operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub max_users: i32,
    pub max_couriers: i32,
    pub max_vehicles: i32,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// type_name = "TEXT": these are stored in plain TEXT columns, not a
// Postgres enum type; without it the derive would declare a custom type
// named after the Rust ident and every row decode would fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Professional,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Suspended,
    Cancelled,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "FREE",
            SubscriptionPlan::Basic => "BASIC",
            SubscriptionPlan::Professional => "PROFESSIONAL",
            SubscriptionPlan::Enterprise => "ENTERPRISE",
        }
    }
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "TRIAL",
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Suspended => "SUSPENDED",
            SubscriptionStatus::Cancelled => "CANCELLED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&SubscriptionPlan::Enterprise).unwrap(), "\"ENTERPRISE\"");
        assert_eq!(serde_json::to_string(&SubscriptionStatus::Trial).unwrap(), "\"TRIAL\"");
    }

    #[test]
    fn enums_decode_from_text_columns() {
        use sqlx::{Postgres, Type};

        assert_eq!(<SubscriptionPlan as Type<Postgres>>::type_info().to_string(), "TEXT");
        assert_eq!(<SubscriptionStatus as Type<Postgres>>::type_info().to_string(), "TEXT");
    }
}

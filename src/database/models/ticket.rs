use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::tenancy::TenantScoped;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub organization_id: i64,
    pub subject: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for Ticket {
    const TABLE: &'static str = "tickets";
    const WRITABLE_COLUMNS: &'static [&'static str] =
        &["subject", "description", "status", "priority", "assignee_id"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["subject", "description"];
    const COLUMN_CASTS: &'static [(&'static str, &'static str)] = &[("assignee_id", "bigint")];
}

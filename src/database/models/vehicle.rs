use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::tenancy::TenantScoped;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub organization_id: i64,
    pub plate_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for Vehicle {
    const TABLE: &'static str = "vehicles";
    const WRITABLE_COLUMNS: &'static [&'static str] =
        &["plate_number", "make", "model", "year", "status"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["plate_number", "make", "model"];
    const COLUMN_CASTS: &'static [(&'static str, &'static str)] = &[("year", "integer")];
}

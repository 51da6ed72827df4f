use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::tenancy::TenantScoped;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Courier {
    pub id: i64,
    pub organization_id: i64,
    pub full_name: String,
    pub phone: String,
    pub employee_number: Option<String>,
    pub status: String,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for Courier {
    const TABLE: &'static str = "couriers";
    const WRITABLE_COLUMNS: &'static [&'static str] =
        &["full_name", "phone", "employee_number", "status", "city"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["full_name", "phone", "employee_number"];
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::tenancy::TenantScoped;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Delivery {
    pub id: i64,
    pub organization_id: i64,
    pub tracking_number: String,
    pub courier_id: Option<i64>,
    pub customer_name: Option<String>,
    pub destination: Option<String>,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantScoped for Delivery {
    const TABLE: &'static str = "deliveries";
    const WRITABLE_COLUMNS: &'static [&'static str] = &[
        "tracking_number",
        "courier_id",
        "customer_name",
        "destination",
        "status",
        "scheduled_at",
        "delivered_at",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["tracking_number", "customer_name", "destination"];
    const COLUMN_CASTS: &'static [(&'static str, &'static str)] = &[
        ("courier_id", "bigint"),
        ("scheduled_at", "timestamptz"),
        ("delivered_at", "timestamptz"),
    ];
}

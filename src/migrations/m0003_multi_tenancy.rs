//! One-time, idempotent conversion of the single-tenant schema into a
//! multi-tenant one.
//!
//! Per table, the order is fixed: add organization_id as nullable, backfill
//! every existing row to the default organization, then enforce NOT NULL,
//! the foreign key, and the index. Adding the column nullable first is what
//! guarantees the migration never trips a NOT NULL violation on legacy rows.
//! The table/column existence checks make a re-run after partial failure a
//! per-table no-op.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{has_org_column, table_exists, Migration};
use crate::database::manager::DatabaseError;
use crate::database::tenancy::{
    add_org_column_sql, add_org_fk_sql, backfill_org_sql, create_org_index_sql,
    drop_org_column_sql, drop_org_fk_sql, drop_org_index_sql, set_org_not_null_sql,
    TENANT_TABLES,
};

pub struct MultiTenancy;

pub const DEFAULT_ORG_NAME: &str = "Default Organization";
pub const DEFAULT_ORG_SLUG: &str = "default";

/// Find or create the organization that legacy rows are assigned to.
///
/// Any pre-existing organization (lowest id) wins; the sentinel is only
/// inserted on a genuinely single-tenant database. The sentinel gets an
/// active enterprise subscription and effectively unlimited quotas so the
/// migrated deployment keeps working without subscription tuning.
async fn ensure_default_organization(pool: &PgPool) -> Result<i64, DatabaseError> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM organizations ORDER BY id LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    sqlx::query(
        "INSERT INTO organizations \
         (name, slug, is_active, plan, status, max_users, max_couriers, max_vehicles) \
         VALUES ($1, $2, TRUE, 'ENTERPRISE', 'ACTIVE', $3, $3, $3)",
    )
    .bind(DEFAULT_ORG_NAME)
    .bind(DEFAULT_ORG_SLUG)
    .bind(1_000_000_i32)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM organizations ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await?;
    info!("Created default organization (id {})", id);
    Ok(id)
}

#[async_trait]
impl Migration for MultiTenancy {
    fn name(&self) -> &'static str {
        "0003_multi_tenancy"
    }

    async fn upgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        let default_org_id = ensure_default_organization(pool).await?;

        for table in TENANT_TABLES {
            if !table_exists(pool, table).await? {
                debug!("Skipping {}: table does not exist", table);
                continue;
            }
            if has_org_column(pool, table).await? {
                debug!("Skipping {}: organization_id already present", table);
                continue;
            }

            sqlx::query(&add_org_column_sql(table)).execute(pool).await?;
            sqlx::query(&backfill_org_sql(table))
                .bind(default_org_id)
                .execute(pool)
                .await?;
            sqlx::query(&set_org_not_null_sql(table)).execute(pool).await?;
            sqlx::query(&add_org_fk_sql(table)).execute(pool).await?;
            sqlx::query(&create_org_index_sql(table)).execute(pool).await?;

            info!("Added organization_id to {}", table);
        }

        Ok(())
    }

    async fn downgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        // Reverse list order; every drop tolerates the object being absent
        // (e.g. a table that was skipped during upgrade).
        for table in TENANT_TABLES.iter().rev() {
            // organization_users is defined with its organization_id column
            // in 0002; this migration never added it and must not remove it.
            if *table == "organization_users" {
                continue;
            }
            let _ = sqlx::query(&drop_org_index_sql(table)).execute(pool).await;
            let _ = sqlx::query(&drop_org_fk_sql(table)).execute(pool).await;
            let _ = sqlx::query(&drop_org_column_sql(table)).execute(pool).await;
        }
        Ok(())
    }
}

//! Database-enforced tenant isolation.
//!
//! Installs row-level security policies beneath the application-level
//! organization_id filters, so a service-layer bug (a missing WHERE clause)
//! cannot leak rows across organizations. FORCE ROW LEVEL SECURITY keeps the
//! table owner subject to the policies too.
//!
//! The two policies on each table are permissive and OR together: a statement
//! passes if its rows match the session's `app.current_org_id`, or if
//! `app.is_superuser` is true. A session that never sets `app.current_org_id`
//! sees every row; that fallback keeps migration runners and admin tooling
//! working without tenant context and is asserted by the integration tests
//! as deliberate behavior.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{table_exists, Migration};
use crate::database::manager::DatabaseError;
use crate::database::tenancy::{
    create_superuser_policy_sql, create_tenant_policy_sql, disable_rls_sql, drop_policy_sql,
    enable_rls_sql, force_rls_sql, no_force_rls_sql, SUPERUSER_POLICY, TENANT_POLICY,
    TENANT_TABLES,
};

pub struct RowLevelSecurity;

#[async_trait]
impl Migration for RowLevelSecurity {
    fn name(&self) -> &'static str {
        "0004_row_level_security"
    }

    async fn upgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        for table in TENANT_TABLES {
            if !table_exists(pool, table).await? {
                debug!("Skipping {}: table does not exist", table);
                continue;
            }

            sqlx::query(&enable_rls_sql(table)).execute(pool).await?;
            sqlx::query(&force_rls_sql(table)).execute(pool).await?;

            // Re-install from scratch so the migration is safe to re-run.
            sqlx::query(&drop_policy_sql(TENANT_POLICY, table)).execute(pool).await?;
            sqlx::query(&drop_policy_sql(SUPERUSER_POLICY, table)).execute(pool).await?;

            sqlx::query(&create_tenant_policy_sql(table)).execute(pool).await?;
            sqlx::query(&create_superuser_policy_sql(table)).execute(pool).await?;

            info!("Enabled row level security on {}", table);
        }
        Ok(())
    }

    async fn downgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        for table in TENANT_TABLES.iter().rev() {
            let _ = sqlx::query(&drop_policy_sql(TENANT_POLICY, table)).execute(pool).await;
            let _ = sqlx::query(&drop_policy_sql(SUPERUSER_POLICY, table)).execute(pool).await;
            let _ = sqlx::query(&disable_rls_sql(table)).execute(pool).await;
            let _ = sqlx::query(&no_force_rls_sql(table)).execute(pool).await;
        }
        Ok(())
    }
}

//! Tenant registry tables: organizations and organization memberships.
//!
//! organization_users is born multi-tenant (its organization_id is part of
//! the table definition), so the backfill migration's column-exists check
//! skips it while the RLS migration still covers it.

use async_trait::async_trait;
use sqlx::PgPool;

use super::Migration;
use crate::database::manager::DatabaseError;

pub struct Organizations;

#[async_trait]
impl Migration for Organizations {
    fn name(&self) -> &'static str {
        "0002_organizations"
    }

    async fn upgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS organizations (\
             id BIGSERIAL PRIMARY KEY, \
             name TEXT NOT NULL UNIQUE, \
             slug TEXT NOT NULL UNIQUE, \
             is_active BOOLEAN NOT NULL DEFAULT TRUE, \
             plan TEXT NOT NULL DEFAULT 'FREE', \
             status TEXT NOT NULL DEFAULT 'TRIAL', \
             max_users INT NOT NULL DEFAULT 5, \
             max_couriers INT NOT NULL DEFAULT 10, \
             max_vehicles INT NOT NULL DEFAULT 10, \
             trial_ends_at TIMESTAMPTZ, \
             settings JSONB NOT NULL DEFAULT '{}', \
             created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
             updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
        )
        .execute(pool)
        .await?;

        // Unique (organization_id, user_id): one membership row per user per org.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS organization_users (\
             id BIGSERIAL PRIMARY KEY, \
             organization_id BIGINT NOT NULL REFERENCES organizations (id) ON DELETE CASCADE, \
             user_id BIGINT NOT NULL, \
             role TEXT NOT NULL DEFAULT 'VIEWER', \
             permissions JSONB NOT NULL DEFAULT '{}', \
             created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
             updated_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
             UNIQUE (organization_id, user_id))",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS ix_organization_users_user_id \
             ON organization_users (user_id)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn downgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        let _ = sqlx::query("DROP TABLE IF EXISTS organization_users CASCADE")
            .execute(pool)
            .await;
        let _ = sqlx::query("DROP TABLE IF EXISTS organizations CASCADE")
            .execute(pool)
            .await;
        Ok(())
    }
}

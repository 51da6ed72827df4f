//! Schema migration framework.
//!
//! Each migration exposes `upgrade`/`downgrade` entry points and operates
//! against whatever pool the runner supplies. Upgrades propagate every SQL
//! error (a half-applied schema change is worse than a full abort); the
//! per-table existence checks inside the multi-tenancy migrations are what
//! make a re-run after partial failure safe. Downgrades ignore missing
//! objects so a rollback can proceed past steps that never ran.

pub mod m0001_initial_schema;
pub mod m0002_organizations;
pub mod m0003_multi_tenancy;
pub mod m0004_row_level_security;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

#[async_trait]
pub trait Migration: Send + Sync {
    /// Stable version identifier, e.g. "0003_multi_tenancy".
    fn name(&self) -> &'static str;

    async fn upgrade(&self, pool: &PgPool) -> Result<(), DatabaseError>;

    async fn downgrade(&self, pool: &PgPool) -> Result<(), DatabaseError>;
}

/// Ordered migration registry with `schema_migrations` bookkeeping.
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    pub fn new() -> Self {
        Self {
            migrations: vec![
                Box::new(m0001_initial_schema::InitialSchema),
                Box::new(m0002_organizations::Organizations),
                Box::new(m0003_multi_tenancy::MultiTenancy),
                Box::new(m0004_row_level_security::RowLevelSecurity),
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.migrations.iter().map(|m| m.name()).collect()
    }

    async fn ensure_bookkeeping(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (\
             version TEXT PRIMARY KEY, \
             applied_at TIMESTAMPTZ NOT NULL DEFAULT now())",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn applied(pool: &PgPool) -> Result<Vec<String>, DatabaseError> {
        Self::ensure_bookkeeping(pool).await?;
        let versions: Vec<String> =
            sqlx::query_scalar("SELECT version FROM schema_migrations ORDER BY version")
                .fetch_all(pool)
                .await?;
        Ok(versions)
    }

    /// Apply all pending migrations in order. Returns how many ran.
    pub async fn up(&self, pool: &PgPool) -> Result<usize, DatabaseError> {
        let applied = Self::applied(pool).await?;
        let mut ran = 0;
        for migration in &self.migrations {
            if applied.iter().any(|v| v == migration.name()) {
                continue;
            }
            info!("Applying migration {}", migration.name());
            migration.upgrade(pool).await?;
            sqlx::query("INSERT INTO schema_migrations (version) VALUES ($1)")
                .bind(migration.name())
                .execute(pool)
                .await?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Revert up to `steps` applied migrations, newest first.
    pub async fn down(&self, pool: &PgPool, steps: usize) -> Result<usize, DatabaseError> {
        let applied = Self::applied(pool).await?;
        let mut ran = 0;
        for migration in self.migrations.iter().rev() {
            if ran >= steps {
                break;
            }
            if !applied.iter().any(|v| v == migration.name()) {
                continue;
            }
            info!("Reverting migration {}", migration.name());
            migration.downgrade(pool).await?;
            sqlx::query("DELETE FROM schema_migrations WHERE version = $1")
                .bind(migration.name())
                .execute(pool)
                .await?;
            ran += 1;
        }
        Ok(ran)
    }

    /// (name, applied) pairs in registry order.
    pub async fn status(&self, pool: &PgPool) -> Result<Vec<(&'static str, bool)>, DatabaseError> {
        let applied = Self::applied(pool).await?;
        Ok(self
            .migrations
            .iter()
            .map(|m| (m.name(), applied.iter().any(|v| v == m.name())))
            .collect())
    }
}

/// True when `table` exists in the public schema. Both multi-tenancy
/// migrations skip missing tables to support partial deployments.
pub(crate) async fn table_exists(pool: &PgPool, table: &str) -> Result<bool, DatabaseError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_name = $1)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// True when `table` already carries an organization_id column.
pub(crate) async fn has_org_column(pool: &PgPool, table: &str) -> Result<bool, DatabaseError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1 AND column_name = 'organization_id')",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_registered_in_version_order() {
        let names = Migrator::new().names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 4);
    }
}

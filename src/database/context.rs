//! Request-scoped tenant context and the PostgreSQL session variable contract.
//!
//! The RLS policies installed by the row-level security migration key off two
//! session variables: `app.current_org_id` and `app.is_superuser`. This module
//! is the only place that sets them. All callers go through
//! [`TenantContext::begin`], which applies the variables transaction-locally
//! (`set_config(..., true)`) so a pooled connection can never carry one
//! tenant's context into the next request. The migration runner and the
//! organization registry deliberately run on the plain pool instead.

use sqlx::{PgPool, Postgres, Transaction};

use crate::database::manager::DatabaseError;
use crate::database::tenancy::{ORG_ID_SETTING, SUPERUSER_SETTING};

/// Who the data layer is acting for.
///
/// `org_id: None` leaves `app.current_org_id` unset, which the installed
/// policies treat as "see everything" (the documented permissive fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub org_id: Option<i64>,
    pub superuser: bool,
}

impl TenantContext {
    /// Context scoped to a single organization, no bypass.
    pub fn organization(org_id: i64) -> Self {
        Self { org_id: Some(org_id), superuser: false }
    }

    /// Context that passes the superuser bypass policy on every table.
    pub fn superuser() -> Self {
        Self { org_id: None, superuser: true }
    }

    /// Context with no variables set: sees all rows via the permissive
    /// fallback. Used by the migration runner and trusted batch jobs.
    pub fn unscoped() -> Self {
        Self { org_id: None, superuser: false }
    }

    /// String form bound into `set_config`. Empty string means unset: the
    /// policy predicate treats '' the same as a missing variable.
    fn org_id_value(&self) -> String {
        self.org_id.map(|id| id.to_string()).unwrap_or_default()
    }

    fn superuser_value(&self) -> &'static str {
        if self.superuser { "true" } else { "false" }
    }

    /// Begin a transaction with this context applied transaction-locally.
    ///
    /// The variables vanish on commit or rollback, so checkin to the pool is
    /// always clean regardless of how the transaction ends.
    pub async fn begin(&self, pool: &PgPool) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT set_config($1, $2, true), set_config($3, $4, true)")
            .bind(ORG_ID_SETTING)
            .bind(self.org_id_value())
            .bind(SUPERUSER_SETTING)
            .bind(self.superuser_value())
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_context_serializes_id() {
        let ctx = TenantContext::organization(42);
        assert_eq!(ctx.org_id_value(), "42");
        assert_eq!(ctx.superuser_value(), "false");
    }

    #[test]
    fn unscoped_context_leaves_org_empty() {
        let ctx = TenantContext::unscoped();
        assert_eq!(ctx.org_id_value(), "");
        assert_eq!(ctx.superuser_value(), "false");
    }

    #[test]
    fn superuser_context_sets_flag_only() {
        let ctx = TenantContext::superuser();
        assert_eq!(ctx.org_id_value(), "");
        assert_eq!(ctx.superuser_value(), "true");
    }
}

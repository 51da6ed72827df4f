use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::warn;

use crate::database::context::TenantContext;
use crate::database::manager::DatabaseError;
use crate::database::models::{OrgRole, Organization, OrganizationUser, SubscriptionPlan, SubscriptionStatus};

#[derive(Debug, Error)]
pub enum OrganizationError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Organization already exists: {0}")]
    AlreadyExists(String),
    #[error("Organization not found: {0}")]
    NotFound(i64),
    #[error("Invalid slug: {0}")]
    InvalidSlug(String),
    #[error("User {user_id} is already a member of organization {org_id}")]
    AlreadyMember { org_id: i64, user_id: i64 },
}

impl From<sqlx::Error> for OrganizationError {
    fn from(err: sqlx::Error) -> Self {
        OrganizationError::Database(DatabaseError::Sqlx(err))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub plan: Option<SubscriptionPlan>,
    pub status: Option<SubscriptionStatus>,
    pub max_users: Option<i32>,
    pub max_couriers: Option<i32>,
    pub max_vehicles: Option<i32>,
    pub settings: Option<Value>,
}

/// Tenant administration: onboarding, subscription changes, membership.
///
/// The organizations table itself is not tenant-scoped (it is the registry
/// the scoping points at), so reads and writes here run on the plain pool.
/// Membership rows are tenant-scoped and run under a tenant context.
pub struct OrganizationService {
    pool: PgPool,
}

const TRIAL_DAYS: i64 = 14;

impl OrganizationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn validate_slug(slug: &str) -> Result<(), OrganizationError> {
        let ok = !slug.is_empty()
            && slug.len() <= 64
            && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !slug.starts_with('-')
            && !slug.ends_with('-');
        if ok {
            Ok(())
        } else {
            Err(OrganizationError::InvalidSlug(slug.to_string()))
        }
    }

    /// Onboard a new tenant. New organizations start on a trial unless an
    /// explicit plan is given.
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        plan: Option<SubscriptionPlan>,
    ) -> Result<Organization, OrganizationError> {
        Self::validate_slug(slug)?;

        let (plan, status) = match plan {
            Some(p) => (p, SubscriptionStatus::Active),
            None => (SubscriptionPlan::Free, SubscriptionStatus::Trial),
        };
        let trial_ends_at = match status {
            SubscriptionStatus::Trial => Some(Utc::now() + Duration::days(TRIAL_DAYS)),
            _ => None,
        };

        let row = sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (name, slug, plan, status, trial_ends_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .bind(plan.as_str())
        .bind(status.as_str())
        .bind(trial_ends_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                OrganizationError::AlreadyExists(format!("{} ({})", name, slug))
            }
            _ => OrganizationError::from(e),
        })?;

        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<Organization, OrganizationError> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(OrganizationError::NotFound(id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Organization>, OrganizationError> {
        let row = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<Organization>, OrganizationError> {
        let rows = sqlx::query_as::<_, Organization>("SELECT * FROM organizations ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn update(
        &self,
        id: i64,
        changes: &UpdateOrganization,
    ) -> Result<Organization, OrganizationError> {
        // COALESCE keeps unspecified fields untouched.
        let row = sqlx::query_as::<_, Organization>(
            "UPDATE organizations SET \
             name = COALESCE($2, name), \
             is_active = COALESCE($3, is_active), \
             plan = COALESCE($4, plan), \
             status = COALESCE($5, status), \
             max_users = COALESCE($6, max_users), \
             max_couriers = COALESCE($7, max_couriers), \
             max_vehicles = COALESCE($8, max_vehicles), \
             settings = COALESCE($9, settings), \
             updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.is_active)
        .bind(changes.plan.map(|p| p.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.max_users)
        .bind(changes.max_couriers)
        .bind(changes.max_vehicles)
        .bind(changes.settings.clone())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(OrganizationError::NotFound(id))?;

        Ok(row)
    }

    /// Destructive: the ON DELETE CASCADE foreign keys remove every row in
    /// every tenant table that references this organization. Admin-only.
    pub async fn delete(&self, id: i64) -> Result<(), OrganizationError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrganizationError::NotFound(id));
        }
        warn!("Deleted organization {} and all dependent tenant rows", id);
        Ok(())
    }

    pub async fn add_member(
        &self,
        org_id: i64,
        user_id: i64,
        role: OrgRole,
    ) -> Result<OrganizationUser, OrganizationError> {
        let ctx = TenantContext::organization(org_id);
        let mut tx = ctx.begin(&self.pool).await?;
        let row = sqlx::query_as::<_, OrganizationUser>(
            "INSERT INTO organization_users (organization_id, user_id, role) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(org_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                OrganizationError::AlreadyMember { org_id, user_id }
            }
            _ => OrganizationError::from(e),
        })?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(row)
    }

    pub async fn list_members(&self, org_id: i64) -> Result<Vec<OrganizationUser>, OrganizationError> {
        let ctx = TenantContext::organization(org_id);
        let mut tx = ctx.begin(&self.pool).await?;
        let rows = sqlx::query_as::<_, OrganizationUser>(
            "SELECT * FROM organization_users WHERE organization_id = $1 ORDER BY id",
        )
        .bind(org_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(rows)
    }

    pub async fn remove_member(&self, org_id: i64, user_id: i64) -> Result<bool, OrganizationError> {
        let ctx = TenantContext::organization(org_id);
        let mut tx = ctx.begin(&self.pool).await?;
        let result = sqlx::query(
            "DELETE FROM organization_users WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(org_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(OrganizationService::validate_slug("acme-couriers").is_ok());
        assert!(OrganizationService::validate_slug("a1").is_ok());
        assert!(OrganizationService::validate_slug("").is_err());
        assert!(OrganizationService::validate_slug("Acme").is_err());
        assert!(OrganizationService::validate_slug("-acme").is_err());
        assert!(OrganizationService::validate_slug("acme-").is_err());
        assert!(OrganizationService::validate_slug("acme_couriers").is_err());
    }
}

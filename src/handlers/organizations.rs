//! Organization administration routes. All of these require a superuser
//! token: tenants never manage the registry themselves.

use axum::extract::{Extension, Path};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::database::models::{OrgRole, SubscriptionPlan};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, AuthUser};
use crate::services::{OrganizationService, UpdateOrganization};

#[derive(Debug, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: String,
    pub plan: Option<SubscriptionPlan>,
}

#[derive(Debug, Deserialize)]
pub struct AddMember {
    pub user_id: i64,
    pub role: OrgRole,
}

async fn service(auth: &AuthUser) -> Result<OrganizationService, ApiError> {
    auth.require_superuser()?;
    let pool = DatabaseManager::pool().await?;
    Ok(OrganizationService::new(pool))
}

pub async fn list(Extension(auth): Extension<AuthUser>) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    let orgs = svc.list().await?;
    Ok(ApiResponse::success(orgs))
}

pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateOrganization>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    let org = svc.create(&body.name, &body.slug, body.plan).await?;
    Ok(ApiResponse::created(org))
}

pub async fn show(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    let org = svc.get(id).await?;
    Ok(ApiResponse::success(org))
}

pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(changes): Json<UpdateOrganization>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    let org = svc.update(id, &changes).await?;
    Ok(ApiResponse::success(org))
}

/// Destructive: cascades through every tenant table.
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    svc.delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}

pub async fn list_members(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    let members = svc.list_members(id).await?;
    Ok(ApiResponse::success(members))
}

pub async fn add_member(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<AddMember>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    let member = svc.add_member(id, body.user_id, body.role).await?;
    Ok(ApiResponse::created(member))
}

pub async fn remove_member(
    Extension(auth): Extension<AuthUser>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service(&auth).await?;
    if svc.remove_member(id, user_id).await? {
        Ok(ApiResponse::<()>::no_content())
    } else {
        Err(ApiError::not_found(format!(
            "User {} is not a member of organization {}",
            user_id, id
        )))
    }
}

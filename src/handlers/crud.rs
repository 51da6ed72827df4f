//! Generic CRUD route handlers for tenant-scoped entities.
//!
//! One set of generic handlers serves couriers, vehicles, deliveries and
//! tickets; the router instantiates them per model. Every request runs under
//! the caller's tenant context, so the organization filter is applied twice:
//! once by the service SQL and once by the row-level security policies.

use axum::extract::{Extension, Path, Query};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::tenancy::TenantScoped;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, AuthUser};
use crate::services::{CrudService, ListParams};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Exact-match filter on the status column, present on all four models.
    pub status: Option<String>,
}

fn clamp_limit(requested: Option<i64>) -> i64 {
    let api = &config::config().api;
    requested
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_page_size)
}

// A negative OFFSET is a Postgres error; treat it as page one.
fn clamp_offset(requested: Option<i64>) -> i64 {
    requested.unwrap_or(0).max(0)
}

async fn service<T: TenantScoped>(auth: &AuthUser) -> Result<CrudService<T>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(CrudService::new(pool, auth.tenant_context()))
}

pub async fn list<T: TenantScoped + 'static>(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut filters = Map::new();
    if let Some(status) = query.status {
        filters.insert("status".to_string(), Value::String(status));
    }

    let params = ListParams {
        filters,
        search: query.search,
        order_by: query.order_by,
        limit: Some(clamp_limit(query.limit)),
        offset: Some(clamp_offset(query.offset)),
    };

    let svc = service::<T>(&auth).await?;
    let rows = svc.list(&params).await?;
    Ok(ApiResponse::success(rows))
}

pub async fn count<T: TenantScoped + 'static>(
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service::<T>(&auth).await?;
    let count = svc.count().await?;
    Ok(ApiResponse::success(serde_json::json!({ "count": count })))
}

pub async fn get_one<T: TenantScoped + 'static>(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = service::<T>(&auth).await?;
    let row = svc.get_404(id).await?;
    Ok(ApiResponse::success(row))
}

pub async fn create<T: TenantScoped + 'static>(
    Extension(auth): Extension<AuthUser>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_write()?;
    let svc = service::<T>(&auth).await?;
    let row = svc.create(&fields).await?;
    Ok(ApiResponse::created(row))
}

pub async fn update<T: TenantScoped + 'static>(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_write()?;
    let svc = service::<T>(&auth).await?;
    let row = svc.update(id, &fields).await?;
    Ok(ApiResponse::success(row))
}

pub async fn delete<T: TenantScoped + 'static>(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_write()?;
    let svc = service::<T>(&auth).await?;
    if svc.delete(id).await? {
        Ok(ApiResponse::<()>::no_content())
    } else {
        Err(ApiError::not_found(format!("{} {} not found", T::TABLE, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped_to_configured_bounds() {
        let max = config::config().api.max_page_size;
        assert_eq!(clamp_limit(Some(max + 500)), max);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(None), config::config().api.default_page_size);
    }

    #[test]
    fn negative_offset_is_floored_to_zero() {
        assert_eq!(clamp_offset(Some(-5)), 0);
        assert_eq!(clamp_offset(Some(25)), 25);
        assert_eq!(clamp_offset(None), 0);
    }
}

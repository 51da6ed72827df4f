use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::database::context::TenantContext;
use crate::database::models::OrgRole;
use crate::error::ApiError;

/// Authenticated caller context extracted from the JWT.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub org_id: i64,
    pub role: OrgRole,
    pub superuser: bool,
}

impl AuthUser {
    /// Tenant context the data layer runs under for this request.
    ///
    /// Regular members are scoped to their organization; superusers keep
    /// the org scope for reads but pass the bypass policy where needed.
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext {
            org_id: Some(self.org_id),
            superuser: self.superuser,
        }
    }

    pub fn require_write(&self) -> Result<(), ApiError> {
        if self.superuser || self.role.can_write() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Viewer role cannot modify data"))
        }
    }

    pub fn require_superuser(&self) -> Result<(), ApiError> {
        if self.superuser {
            Ok(())
        } else {
            Err(ApiError::forbidden("Superuser access required"))
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            org_id: claims.org_id,
            role: claims.role,
            superuser: claims.superuser,
        }
    }
}

/// JWT authentication middleware that validates tokens and injects [`AuthUser`]
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
    }

    #[test]
    fn viewer_is_read_only() {
        let user = AuthUser { user_id: 1, org_id: 1, role: OrgRole::Viewer, superuser: false };
        assert!(user.require_write().is_err());
        assert!(user.require_superuser().is_err());
    }

    #[test]
    fn auth_context_is_org_scoped() {
        let user = AuthUser { user_id: 1, org_id: 9, role: OrgRole::Owner, superuser: false };
        let ctx = user.tenant_context();
        assert_eq!(ctx.org_id, Some(9));
        assert!(!ctx.superuser);
    }
}

pub mod crud;
pub mod organization_service;

pub use crud::{CrudService, ListParams};
pub use organization_service::{OrganizationError, OrganizationService, UpdateOrganization};

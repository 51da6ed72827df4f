pub mod context;
pub mod manager;
pub mod models;
pub mod tenancy;

pub use context::TenantContext;
pub use manager::{DatabaseError, DatabaseManager};
pub use tenancy::{TenantScoped, TENANT_TABLES};

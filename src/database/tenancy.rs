//! Tenant-scoping schema trait and the SQL behind the multi-tenancy migrations.
//!
//! `TENANT_TABLES` is the single source of truth for which tables carry an
//! `organization_id` column. Both the backfill migration and the row-level
//! security migration iterate this list, so a new tenant-scoped table only
//! needs to be added here (and to its own CREATE TABLE migration) to pick up
//! both the column plumbing and the database-enforced isolation.

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

/// Every table that belongs to exactly one organization.
///
/// Ordering matters: upgrades walk this list forward, downgrades walk it in
/// reverse. Keep related tables grouped by domain.
pub const TENANT_TABLES: [&str; 28] = [
    // Fleet
    "couriers",
    "courier_documents",
    "courier_shifts",
    "vehicles",
    "vehicle_assignments",
    "vehicle_maintenance",
    "fuel_logs",
    // Operations
    "deliveries",
    "delivery_events",
    "delivery_routes",
    "customers",
    "warehouses",
    "zones",
    // HR
    "employees",
    "attendance_records",
    "leave_requests",
    "payroll_entries",
    // Support
    "tickets",
    "ticket_comments",
    "ticket_attachments",
    // Workflow
    "workflow_definitions",
    "workflow_instances",
    "approval_requests",
    // Misc
    "announcements",
    "audit_logs",
    "metrics_daily",
    "sla_breaches",
    "organization_users",
];

/// Name of the per-table tenant isolation policy.
pub const TENANT_POLICY: &str = "tenant_isolation";

/// Name of the per-table superuser bypass policy.
pub const SUPERUSER_POLICY: &str = "superuser_bypass";

/// Session variable holding the caller's organization id.
pub const ORG_ID_SETTING: &str = "app.current_org_id";

/// Session variable holding the caller's superuser flag.
pub const SUPERUSER_SETTING: &str = "app.is_superuser";

/// Marker trait for models backed by a tenant-scoped table.
///
/// Do not declare composite table-level constraints through this trait;
/// those belong on the concrete table's CREATE TABLE statement.
pub trait TenantScoped: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + Serialize {
    /// Table name. Must appear in [`TENANT_TABLES`].
    const TABLE: &'static str;

    /// Columns a client may set on create/update. Never includes
    /// `organization_id`: a row's organization is immutable after creation.
    const WRITABLE_COLUMNS: &'static [&'static str];

    /// Columns searched by ILIKE substring match.
    const SEARCH_COLUMNS: &'static [&'static str] = &[];

    /// Writable columns whose SQL type is not text, paired with the type
    /// their placeholder is cast to. JSON payload values bind as text,
    /// integers or booleans; the cast bridges them to the column type.
    const COLUMN_CASTS: &'static [(&'static str, &'static str)] = &[];
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Foreign key constraint name for a table's organization_id column.
pub fn org_fk_name(table: &str) -> String {
    format!("fk_{}_organization", table)
}

/// Index name for a table's organization_id column.
pub fn org_index_name(table: &str) -> String {
    format!("ix_{}_organization_id", table)
}

// ---------------------------------------------------------------------------
// Backfill migration DDL (add column -> backfill -> NOT NULL -> FK -> index)
// ---------------------------------------------------------------------------

pub fn add_org_column_sql(table: &str) -> String {
    format!("ALTER TABLE {} ADD COLUMN organization_id BIGINT", quote_ident(table))
}

/// Backfill statement; binds the default organization id as $1.
pub fn backfill_org_sql(table: &str) -> String {
    format!(
        "UPDATE {} SET organization_id = $1 WHERE organization_id IS NULL",
        quote_ident(table)
    )
}

pub fn set_org_not_null_sql(table: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN organization_id SET NOT NULL",
        quote_ident(table)
    )
}

pub fn add_org_fk_sql(table: &str) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY (organization_id) \
         REFERENCES organizations (id) ON DELETE CASCADE",
        quote_ident(table),
        quote_ident(&org_fk_name(table))
    )
}

pub fn create_org_index_sql(table: &str) -> String {
    format!(
        "CREATE INDEX {} ON {} (organization_id)",
        quote_ident(&org_index_name(table)),
        quote_ident(table)
    )
}

pub fn drop_org_index_sql(table: &str) -> String {
    format!("DROP INDEX IF EXISTS {}", quote_ident(&org_index_name(table)))
}

pub fn drop_org_fk_sql(table: &str) -> String {
    format!(
        "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}",
        quote_ident(table),
        quote_ident(&org_fk_name(table))
    )
}

pub fn drop_org_column_sql(table: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN IF EXISTS organization_id",
        quote_ident(table)
    )
}

// ---------------------------------------------------------------------------
// Row-level security DDL
// ---------------------------------------------------------------------------

pub fn enable_rls_sql(table: &str) -> String {
    format!("ALTER TABLE {} ENABLE ROW LEVEL SECURITY", quote_ident(table))
}

/// FORCE is required so the table owner is also subject to policies.
pub fn force_rls_sql(table: &str) -> String {
    format!("ALTER TABLE {} FORCE ROW LEVEL SECURITY", quote_ident(table))
}

pub fn disable_rls_sql(table: &str) -> String {
    format!("ALTER TABLE {} DISABLE ROW LEVEL SECURITY", quote_ident(table))
}

pub fn no_force_rls_sql(table: &str) -> String {
    format!("ALTER TABLE {} NO FORCE ROW LEVEL SECURITY", quote_ident(table))
}

pub fn drop_policy_sql(policy: &str, table: &str) -> String {
    format!("DROP POLICY IF EXISTS {} ON {}", quote_ident(policy), quote_ident(table))
}

/// Predicate for the tenant isolation policy.
///
/// When `app.current_org_id` is unset or empty the predicate degrades to
/// `organization_id = organization_id` (always true): connections that never
/// set the session variable see every row. That permissive fallback is the
/// documented current behavior; tightening it to fail-closed is a product
/// decision, not a refactor.
fn tenant_predicate() -> String {
    format!(
        "CASE WHEN COALESCE(current_setting('{setting}', true), '') = '' \
         THEN organization_id = organization_id \
         ELSE organization_id = current_setting('{setting}', true)::bigint END",
        setting = ORG_ID_SETTING
    )
}

pub fn create_tenant_policy_sql(table: &str) -> String {
    let predicate = tenant_predicate();
    format!(
        "CREATE POLICY {policy} ON {table} FOR ALL USING ({predicate}) WITH CHECK ({predicate})",
        policy = quote_ident(TENANT_POLICY),
        table = quote_ident(table),
        predicate = predicate,
    )
}

/// Superuser bypass: OR'd permissively with the tenant policy by PostgreSQL,
/// so a session with `app.is_superuser = 'true'` passes regardless of org.
pub fn create_superuser_policy_sql(table: &str) -> String {
    let predicate = format!(
        "COALESCE(current_setting('{}', true), 'false')::boolean",
        SUPERUSER_SETTING
    );
    format!(
        "CREATE POLICY {policy} ON {table} FOR ALL USING ({predicate}) WITH CHECK ({predicate})",
        policy = quote_ident(SUPERUSER_POLICY),
        table = quote_ident(table),
        predicate = predicate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_tables_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for table in TENANT_TABLES {
            assert!(seen.insert(table), "duplicate tenant table: {}", table);
        }
    }

    #[test]
    fn tenant_models_are_listed() {
        use crate::database::models::{Courier, Delivery, OrganizationUser, Ticket, Vehicle};

        for table in [
            <Courier as TenantScoped>::TABLE,
            <Vehicle as TenantScoped>::TABLE,
            <Delivery as TenantScoped>::TABLE,
            <Ticket as TenantScoped>::TABLE,
            <OrganizationUser as TenantScoped>::TABLE,
        ] {
            assert!(TENANT_TABLES.contains(&table), "{} missing from TENANT_TABLES", table);
        }
    }

    #[test]
    fn scoped_models_are_usable_from_shared_handlers() {
        use crate::database::models::Courier;

        // Handler futures hold the service across awaits; the trait must
        // guarantee Sync or generic route registration stops compiling.
        fn requires_sync<S: Sync>() {}
        fn check<T: TenantScoped>() {
            requires_sync::<T>();
        }
        check::<Courier>();
    }

    #[test]
    fn writable_columns_never_include_organization_id() {
        use crate::database::models::{Courier, Delivery, OrganizationUser, Ticket, Vehicle};

        fn check<T: TenantScoped>() {
            assert!(
                !T::WRITABLE_COLUMNS.contains(&"organization_id"),
                "{} exposes organization_id as writable",
                T::TABLE
            );
        }
        check::<Courier>();
        check::<Vehicle>();
        check::<Delivery>();
        check::<Ticket>();
        check::<OrganizationUser>();
    }

    #[test]
    fn backfill_ddl_shapes() {
        assert_eq!(
            add_org_column_sql("couriers"),
            "ALTER TABLE \"couriers\" ADD COLUMN organization_id BIGINT"
        );
        assert_eq!(
            backfill_org_sql("couriers"),
            "UPDATE \"couriers\" SET organization_id = $1 WHERE organization_id IS NULL"
        );
        assert_eq!(
            set_org_not_null_sql("couriers"),
            "ALTER TABLE \"couriers\" ALTER COLUMN organization_id SET NOT NULL"
        );
        assert!(add_org_fk_sql("couriers").contains("ON DELETE CASCADE"));
        assert!(create_org_index_sql("couriers").contains("\"ix_couriers_organization_id\""));
    }

    #[test]
    fn downgrade_ddl_is_idempotent() {
        assert!(drop_org_index_sql("tickets").contains("IF EXISTS"));
        assert!(drop_org_fk_sql("tickets").contains("IF EXISTS"));
        assert!(drop_org_column_sql("tickets").contains("IF EXISTS"));
        assert!(drop_policy_sql(TENANT_POLICY, "tickets").contains("IF EXISTS"));
    }

    #[test]
    fn tenant_policy_falls_open_when_unset() {
        let sql = create_tenant_policy_sql("deliveries");
        assert!(sql.contains("current_setting('app.current_org_id', true)"));
        // Unset session variable degrades to an always-true predicate.
        assert!(sql.contains("organization_id = organization_id"));
        assert!(sql.contains("WITH CHECK"));
    }

    #[test]
    fn superuser_policy_defaults_to_false() {
        let sql = create_superuser_policy_sql("deliveries");
        assert!(sql.contains("COALESCE(current_setting('app.is_superuser', true), 'false')::boolean"));
    }

    #[test]
    fn identifiers_are_quoted() {
        let sql = enable_rls_sql("odd\"name");
        assert!(sql.contains("\"odd\"\"name\""));
    }
}

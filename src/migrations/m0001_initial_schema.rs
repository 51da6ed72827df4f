//! Legacy single-tenant schema.
//!
//! These tables predate multi-tenancy and are created without an
//! organization_id column; 0003_multi_tenancy retrofits it. Keeping the
//! original shape here is what lets the backfill migration be exercised
//! against a realistic starting point on fresh databases too.

use async_trait::async_trait;
use sqlx::PgPool;

use super::Migration;
use crate::database::manager::DatabaseError;

pub struct InitialSchema;

const CREATE_TABLES: &[&str] = &[
    // Fleet
    "CREATE TABLE IF NOT EXISTS couriers (\
     id BIGSERIAL PRIMARY KEY, \
     full_name TEXT NOT NULL, \
     phone TEXT NOT NULL, \
     employee_number TEXT, \
     status TEXT NOT NULL DEFAULT 'ACTIVE', \
     city TEXT, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS courier_documents (\
     id BIGSERIAL PRIMARY KEY, \
     courier_id BIGINT REFERENCES couriers (id) ON DELETE CASCADE, \
     doc_type TEXT NOT NULL, \
     file_path TEXT, \
     expires_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS courier_shifts (\
     id BIGSERIAL PRIMARY KEY, \
     courier_id BIGINT REFERENCES couriers (id) ON DELETE CASCADE, \
     starts_at TIMESTAMPTZ NOT NULL, \
     ends_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS vehicles (\
     id BIGSERIAL PRIMARY KEY, \
     plate_number TEXT NOT NULL, \
     make TEXT, \
     model TEXT, \
     year INT, \
     status TEXT NOT NULL DEFAULT 'AVAILABLE', \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS vehicle_assignments (\
     id BIGSERIAL PRIMARY KEY, \
     vehicle_id BIGINT REFERENCES vehicles (id) ON DELETE CASCADE, \
     courier_id BIGINT REFERENCES couriers (id) ON DELETE CASCADE, \
     assigned_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     returned_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS vehicle_maintenance (\
     id BIGSERIAL PRIMARY KEY, \
     vehicle_id BIGINT REFERENCES vehicles (id) ON DELETE CASCADE, \
     description TEXT, \
     cost_cents BIGINT, \
     performed_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS fuel_logs (\
     id BIGSERIAL PRIMARY KEY, \
     vehicle_id BIGINT REFERENCES vehicles (id) ON DELETE CASCADE, \
     liters DOUBLE PRECISION, \
     cost_cents BIGINT, \
     logged_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    // Operations
    "CREATE TABLE IF NOT EXISTS deliveries (\
     id BIGSERIAL PRIMARY KEY, \
     tracking_number TEXT NOT NULL, \
     courier_id BIGINT REFERENCES couriers (id), \
     customer_name TEXT, \
     destination TEXT, \
     status TEXT NOT NULL DEFAULT 'PENDING', \
     scheduled_at TIMESTAMPTZ, \
     delivered_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS delivery_events (\
     id BIGSERIAL PRIMARY KEY, \
     delivery_id BIGINT REFERENCES deliveries (id) ON DELETE CASCADE, \
     event_type TEXT NOT NULL, \
     note TEXT, \
     occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS delivery_routes (\
     id BIGSERIAL PRIMARY KEY, \
     name TEXT NOT NULL, \
     courier_id BIGINT REFERENCES couriers (id), \
     planned_date DATE, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS customers (\
     id BIGSERIAL PRIMARY KEY, \
     name TEXT NOT NULL, \
     phone TEXT, \
     address TEXT, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS warehouses (\
     id BIGSERIAL PRIMARY KEY, \
     name TEXT NOT NULL, \
     city TEXT, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS zones (\
     id BIGSERIAL PRIMARY KEY, \
     name TEXT NOT NULL, \
     warehouse_id BIGINT REFERENCES warehouses (id), \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    // HR
    "CREATE TABLE IF NOT EXISTS employees (\
     id BIGSERIAL PRIMARY KEY, \
     full_name TEXT NOT NULL, \
     email TEXT, \
     position TEXT, \
     hired_at DATE, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS attendance_records (\
     id BIGSERIAL PRIMARY KEY, \
     employee_id BIGINT REFERENCES employees (id) ON DELETE CASCADE, \
     day DATE NOT NULL, \
     checked_in_at TIMESTAMPTZ, \
     checked_out_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS leave_requests (\
     id BIGSERIAL PRIMARY KEY, \
     employee_id BIGINT REFERENCES employees (id) ON DELETE CASCADE, \
     leave_type TEXT NOT NULL, \
     starts_on DATE NOT NULL, \
     ends_on DATE NOT NULL, \
     status TEXT NOT NULL DEFAULT 'PENDING', \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS payroll_entries (\
     id BIGSERIAL PRIMARY KEY, \
     employee_id BIGINT REFERENCES employees (id) ON DELETE CASCADE, \
     period TEXT NOT NULL, \
     gross_cents BIGINT NOT NULL DEFAULT 0, \
     net_cents BIGINT NOT NULL DEFAULT 0, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    // Support
    "CREATE TABLE IF NOT EXISTS tickets (\
     id BIGSERIAL PRIMARY KEY, \
     subject TEXT NOT NULL, \
     description TEXT, \
     status TEXT NOT NULL DEFAULT 'OPEN', \
     priority TEXT NOT NULL DEFAULT 'MEDIUM', \
     assignee_id BIGINT, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS ticket_comments (\
     id BIGSERIAL PRIMARY KEY, \
     ticket_id BIGINT REFERENCES tickets (id) ON DELETE CASCADE, \
     author_id BIGINT, \
     body TEXT NOT NULL, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS ticket_attachments (\
     id BIGSERIAL PRIMARY KEY, \
     ticket_id BIGINT REFERENCES tickets (id) ON DELETE CASCADE, \
     file_path TEXT NOT NULL, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    // Workflow
    "CREATE TABLE IF NOT EXISTS workflow_definitions (\
     id BIGSERIAL PRIMARY KEY, \
     name TEXT NOT NULL, \
     definition JSONB NOT NULL DEFAULT '{}', \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS workflow_instances (\
     id BIGSERIAL PRIMARY KEY, \
     definition_id BIGINT REFERENCES workflow_definitions (id) ON DELETE CASCADE, \
     subject_type TEXT, \
     subject_id BIGINT, \
     state TEXT NOT NULL DEFAULT 'STARTED', \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS approval_requests (\
     id BIGSERIAL PRIMARY KEY, \
     workflow_instance_id BIGINT REFERENCES workflow_instances (id) ON DELETE CASCADE, \
     approver_id BIGINT, \
     decision TEXT, \
     decided_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    // Misc
    "CREATE TABLE IF NOT EXISTS announcements (\
     id BIGSERIAL PRIMARY KEY, \
     title TEXT NOT NULL, \
     body TEXT, \
     published_at TIMESTAMPTZ, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS audit_logs (\
     id BIGSERIAL PRIMARY KEY, \
     actor_id BIGINT, \
     action TEXT NOT NULL, \
     subject_type TEXT, \
     subject_id BIGINT, \
     detail JSONB NOT NULL DEFAULT '{}', \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS metrics_daily (\
     id BIGSERIAL PRIMARY KEY, \
     day DATE NOT NULL, \
     metric TEXT NOT NULL, \
     value DOUBLE PRECISION NOT NULL DEFAULT 0, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
    "CREATE TABLE IF NOT EXISTS sla_breaches (\
     id BIGSERIAL PRIMARY KEY, \
     ticket_id BIGINT REFERENCES tickets (id) ON DELETE CASCADE, \
     breached_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
     updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
];

const DROP_TABLES: &[&str] = &[
    "sla_breaches",
    "metrics_daily",
    "audit_logs",
    "announcements",
    "approval_requests",
    "workflow_instances",
    "workflow_definitions",
    "ticket_attachments",
    "ticket_comments",
    "tickets",
    "payroll_entries",
    "leave_requests",
    "attendance_records",
    "employees",
    "zones",
    "warehouses",
    "customers",
    "delivery_routes",
    "delivery_events",
    "deliveries",
    "fuel_logs",
    "vehicle_maintenance",
    "vehicle_assignments",
    "vehicles",
    "courier_shifts",
    "courier_documents",
    "couriers",
];

#[async_trait]
impl Migration for InitialSchema {
    fn name(&self) -> &'static str {
        "0001_initial_schema"
    }

    async fn upgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        for ddl in CREATE_TABLES {
            sqlx::query(ddl).execute(pool).await?;
        }
        Ok(())
    }

    async fn downgrade(&self, pool: &PgPool) -> Result<(), DatabaseError> {
        for table in DROP_TABLES {
            let _ = sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\" CASCADE", table))
                .execute(pool)
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_create_has_a_drop() {
        assert_eq!(CREATE_TABLES.len(), DROP_TABLES.len());
        for table in DROP_TABLES {
            assert!(
                CREATE_TABLES.iter().any(|ddl| ddl.contains(&format!("EXISTS {} ", table))),
                "no CREATE TABLE for {}",
                table
            );
        }
    }

    #[test]
    fn legacy_tables_do_not_start_with_organization_id() {
        for ddl in CREATE_TABLES {
            assert!(!ddl.contains("organization_id"), "legacy DDL mentions organization_id: {}", ddl);
        }
    }
}

//! Generic CRUD service for tenant-scoped tables.
//!
//! Every statement carries an explicit `organization_id` predicate even
//! though the row-level security policies would filter the same rows. The
//! application filter and the database policy are independent barriers; a
//! bug in one must not leak data through the other.

use serde_json::{Map, Value};
use sqlx::postgres::PgArguments;
use sqlx::PgPool;

use crate::database::context::TenantContext;
use crate::database::manager::DatabaseError;
use crate::database::tenancy::TenantScoped;

/// Pagination, filtering and ordering for list queries.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Exact-match filters; keys must be writable or built-in columns.
    pub filters: Map<String, Value>,
    /// ILIKE substring search across the model's SEARCH_COLUMNS.
    pub search: Option<String>,
    /// Column name, prefixed with '-' for descending. Defaults to id.
    pub order_by: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub struct CrudService<T: TenantScoped> {
    pool: PgPool,
    ctx: TenantContext,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: TenantScoped> CrudService<T> {
    pub fn new(pool: PgPool, ctx: TenantContext) -> Self {
        Self { pool, ctx, _phantom: std::marker::PhantomData }
    }

    fn org_id(&self) -> Result<i64, DatabaseError> {
        self.ctx
            .org_id
            .ok_or_else(|| DatabaseError::QueryError("tenant context required".to_string()))
    }

    fn check_column(column: &str) -> Result<(), DatabaseError> {
        let builtin = ["id", "organization_id", "created_at", "updated_at"];
        if builtin.contains(&column) || T::WRITABLE_COLUMNS.contains(&column) {
            Ok(())
        } else {
            Err(DatabaseError::QueryError(format!(
                "unknown column for {}: {}",
                T::TABLE,
                column
            )))
        }
    }

    fn check_writable(column: &str) -> Result<(), DatabaseError> {
        if T::WRITABLE_COLUMNS.contains(&column) {
            Ok(())
        } else {
            Err(DatabaseError::QueryError(format!(
                "column not writable on {}: {}",
                T::TABLE,
                column
            )))
        }
    }

    /// Placeholder for `column`, cast to the column's SQL type when it is
    /// not text. JSON payload values only bind as text, integer, float,
    /// boolean or jsonb; the cast bridges e.g. an ISO-8601 string to a
    /// timestamptz column, or a null to a bigint foreign key.
    fn placeholder(column: &str, n: usize) -> String {
        match T::COLUMN_CASTS.iter().find(|(c, _)| *c == column) {
            Some((_, ty)) => format!("${}::{}", n, ty),
            None => format!("${}", n),
        }
    }

    fn order_clause(order_by: Option<&str>) -> Result<String, DatabaseError> {
        let Some(raw) = order_by else {
            return Ok("ORDER BY id".to_string());
        };
        let (column, dir) = match raw.strip_prefix('-') {
            Some(col) => (col, "DESC"),
            None => (raw, "ASC"),
        };
        Self::check_column(column)?;
        Ok(format!("ORDER BY \"{}\" {}", column, dir))
    }

    pub async fn get(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        let org_id = self.org_id()?;
        let sql = format!(
            "SELECT * FROM \"{}\" WHERE id = $1 AND organization_id = $2",
            T::TABLE
        );
        let mut tx = self.ctx.begin(&self.pool).await?;
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(org_id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }

    pub async fn get_404(&self, id: i64) -> Result<T, DatabaseError> {
        self.get(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, id)))
    }

    pub async fn list(&self, params: &ListParams) -> Result<Vec<T>, DatabaseError> {
        let org_id = self.org_id()?;
        let mut sql = format!("SELECT * FROM \"{}\" WHERE organization_id = $1", T::TABLE);
        let mut binds: Vec<Value> = Vec::new();
        let mut next = 2;

        for (column, value) in &params.filters {
            Self::check_column(column)?;
            sql.push_str(&format!(" AND \"{}\" = {}", column, Self::placeholder(column, next)));
            binds.push(value.clone());
            next += 1;
        }

        if let Some(term) = params.search.as_deref().filter(|t| !t.is_empty()) {
            if !T::SEARCH_COLUMNS.is_empty() {
                let clauses: Vec<String> = T::SEARCH_COLUMNS
                    .iter()
                    .map(|c| format!("\"{}\" ILIKE ${}", c, next))
                    .collect();
                sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
                binds.push(Value::String(format!("%{}%", term)));
                next += 1;
            }
        }

        sql.push(' ');
        sql.push_str(&Self::order_clause(params.order_by.as_deref())?);

        if let Some(limit) = params.limit {
            sql.push_str(&format!(" LIMIT ${}", next));
            binds.push(Value::from(limit));
            next += 1;
        }
        if let Some(offset) = params.offset {
            sql.push_str(&format!(" OFFSET ${}", next));
            binds.push(Value::from(offset));
        }

        let mut q = sqlx::query_as::<_, T>(&sql).bind(org_id);
        for value in &binds {
            q = bind_value_as(q, value);
        }

        let mut tx = self.ctx.begin(&self.pool).await?;
        let rows = q.fetch_all(&mut *tx).await?;
        tx.commit().await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let org_id = self.org_id()?;
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\" WHERE organization_id = $1",
            T::TABLE
        );
        let mut tx = self.ctx.begin(&self.pool).await?;
        let count: i64 = sqlx::query_scalar(&sql).bind(org_id).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(count)
    }

    /// Insert a row for the current organization. The organization
    /// assignment comes from the context, never from the payload, and is
    /// immutable afterwards.
    pub async fn create(&self, fields: &Map<String, Value>) -> Result<T, DatabaseError> {
        let org_id = self.org_id()?;
        if fields.is_empty() {
            return Err(DatabaseError::QueryError("empty payload".to_string()));
        }

        let mut columns = vec!["organization_id".to_string()];
        let mut placeholders = vec!["$1".to_string()];
        for (i, (column, _)) in fields.iter().enumerate() {
            Self::check_writable(column)?;
            columns.push(format!("\"{}\"", column));
            placeholders.push(Self::placeholder(column, i + 2));
        }

        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            T::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut q = sqlx::query_as::<_, T>(&sql).bind(org_id);
        for (_, value) in fields {
            q = bind_value_as(q, value);
        }

        let mut tx = self.ctx.begin(&self.pool).await?;
        let row = q.fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, fields: &Map<String, Value>) -> Result<T, DatabaseError> {
        let org_id = self.org_id()?;
        if fields.is_empty() {
            return Err(DatabaseError::QueryError("empty payload".to_string()));
        }

        let mut assignments = Vec::new();
        for (i, (column, _)) in fields.iter().enumerate() {
            Self::check_writable(column)?;
            assignments.push(format!("\"{}\" = {}", column, Self::placeholder(column, i + 1)));
        }
        let id_pos = fields.len() + 1;
        let org_pos = fields.len() + 2;

        let sql = format!(
            "UPDATE \"{}\" SET {}, updated_at = now() WHERE id = ${} AND organization_id = ${} RETURNING *",
            T::TABLE,
            assignments.join(", "),
            id_pos,
            org_pos
        );

        let mut q = sqlx::query_as::<_, T>(&sql);
        for (_, value) in fields {
            q = bind_value_as(q, value);
        }
        q = q.bind(id).bind(org_id);

        let mut tx = self.ctx.begin(&self.pool).await?;
        let row = q.fetch_optional(&mut *tx).await?;
        tx.commit().await?;
        row.ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, id)))
    }

    /// Delete one row. Returns false when no row matched the id within the
    /// current organization.
    pub async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let org_id = self.org_id()?;
        let sql = format!(
            "DELETE FROM \"{}\" WHERE id = $1 AND organization_id = $2",
            T::TABLE
        );
        let mut tx = self.ctx.begin(&self.pool).await?;
        let result = sqlx::query(&sql).bind(id).bind(org_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Bind a JSON value onto a typed query with a sensible Postgres mapping.
fn bind_value_as<'q, T>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, T, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, T, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        other => q.bind(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Courier, Delivery};

    type CourierService = CrudService<Courier>;
    type DeliveryService = CrudService<Delivery>;

    #[test]
    fn rejects_unknown_filter_column() {
        assert!(CourierService::check_column("full_name").is_ok());
        assert!(CourierService::check_column("id").is_ok());
        assert!(CourierService::check_column("password; DROP TABLE couriers").is_err());
    }

    #[test]
    fn organization_id_is_not_client_writable() {
        assert!(CourierService::check_writable("organization_id").is_err());
        assert!(CourierService::check_writable("full_name").is_ok());
    }

    #[test]
    fn non_text_columns_are_cast_in_placeholders() {
        assert_eq!(DeliveryService::placeholder("scheduled_at", 3), "$3::timestamptz");
        assert_eq!(DeliveryService::placeholder("courier_id", 2), "$2::bigint");
        assert_eq!(DeliveryService::placeholder("status", 4), "$4");
        assert_eq!(CourierService::placeholder("full_name", 2), "$2");
    }

    #[test]
    fn order_clause_parses_direction() {
        assert_eq!(CourierService::order_clause(None).unwrap(), "ORDER BY id");
        assert_eq!(
            CourierService::order_clause(Some("-created_at")).unwrap(),
            "ORDER BY \"created_at\" DESC"
        );
        assert!(CourierService::order_clause(Some("nope")).is_err());
    }
}

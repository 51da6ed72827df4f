use sqlx::PgPool;

/// Connect to the test database, or None when no DATABASE_URL is configured.
/// Integration tests skip cleanly on machines without Postgres.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("FLEETOPS_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;
    match fleetops_api::database::DatabaseManager::connect(&url).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            eprintln!("skipping: could not connect to test database: {}", e);
            None
        }
    }
}

/// Drop and recreate the public schema for a clean slate.
pub async fn reset_schema(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("DROP SCHEMA public CASCADE").execute(pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(pool).await?;
    Ok(())
}

/// Row-level security never applies to database superusers or BYPASSRLS
/// roles, regardless of FORCE. Assertions about policy behavior only make
/// sense when the connecting role is subject to RLS.
pub async fn rls_enforced_for_current_role(pool: &PgPool) -> anyhow::Result<bool> {
    let (superuser, bypass): (bool, bool) = sqlx::query_as(
        "SELECT rolsuper, rolbypassrls FROM pg_roles WHERE rolname = current_user",
    )
    .fetch_one(pool)
    .await?;
    Ok(!superuser && !bypass)
}

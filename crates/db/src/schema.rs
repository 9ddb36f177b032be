use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Creates the shared (non-tenant) tables. Tenant tables live in per-tenant
/// schemas and are provisioned lazily by [`crate::tenant`].
pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Registry of provisioned tenant partitions
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS public.tenant_partitions (
            company_code VARCHAR(32) PRIMARY KEY,
            schema_name VARCHAR(63) NOT NULL UNIQUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}

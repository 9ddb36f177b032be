//! Prepares the shared tables and, optionally, provisions tenant schemas
//! ahead of their first request.
//!
//! ```text
//! db-migrate [COMPANY_CODE ...]
//! ```

use classbook_core::models::tenant::TenantCode;
use classbook_db::{
    create_pool,
    schema::initialize_database,
    tenant::{provision_tenant_schema, TenantScope},
};
use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();
    tracing_subscriber::fmt().init();

    let database_url =
        std::env::var("DATABASE_URL").wrap_err("DATABASE_URL environment variable must be set")?;

    let tenants = std::env::args()
        .skip(1)
        .map(|raw| TenantCode::parse(&raw).wrap_err_with(|| format!("invalid company code {raw:?}")))
        .collect::<Result<Vec<_>>>()?;

    info!("Connecting to database...");
    let db_pool = create_pool(&database_url, 1).await?;

    info!("Initializing shared tables...");
    initialize_database(&db_pool).await?;

    for code in tenants {
        provision_tenant_schema(&db_pool, &TenantScope::new(code.clone())).await?;
        info!("Tenant {} provisioned", code);
    }

    info!("Database ready.");
    Ok(())
}

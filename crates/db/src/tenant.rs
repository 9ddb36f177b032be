//! # Tenant partitions
//!
//! Every company gets its own PostgreSQL schema (`tenant_<code>`) holding the
//! teacher directory, schedules and assistant assignments. The schema is
//! created on first use. Provisioning runs inside a transaction that holds an
//! advisory lock on the schema name, so two requests racing to create the
//! same tenant serialize instead of tripping over each other's DDL.
//!
//! Schema names are built from a validated [`TenantCode`] and always reach
//! SQL through [`quote_ident`].

use std::collections::HashSet;

use async_trait::async_trait;
use classbook_core::{
    errors::{ScheduleError, ScheduleResult},
    models::tenant::{quote_ident, TenantCode},
};
use eyre::{Result, WrapErr};
use sqlx::{PgConnection, PgPool};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Handle scoping storage calls to one tenant's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    code: TenantCode,
    schema: String,
}

impl TenantScope {
    pub fn new(code: TenantCode) -> Self {
        let schema = quote_ident(&code.schema_name());
        Self { code, schema }
    }

    pub fn code(&self) -> &TenantCode {
        &self.code
    }

    /// Quoted schema identifier, safe to splice into SQL.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Fully qualified, quoted table name inside this tenant's schema.
    pub fn table(&self, name: &str) -> String {
        format!("{}.{}", self.schema, quote_ident(name))
    }
}

/// Maps a company code onto a ready-to-use tenant partition.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    async fn resolve(&self, code: &TenantCode) -> ScheduleResult<TenantScope>;
}

/// Resolver backed by PostgreSQL schemas.
///
/// Remembers which schemas it has already provisioned so steady-state
/// requests skip the DDL round-trips. The memo is per process; a fresh
/// process re-runs the idempotent provisioning once per tenant.
pub struct PgTenantRegistry {
    pool: PgPool,
    provisioned: RwLock<HashSet<TenantCode>>,
}

impl PgTenantRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            provisioned: RwLock::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl TenantResolver for PgTenantRegistry {
    async fn resolve(&self, code: &TenantCode) -> ScheduleResult<TenantScope> {
        let scope = TenantScope::new(code.clone());
        if self.provisioned.read().await.contains(code) {
            return Ok(scope);
        }

        provision_tenant_schema(&self.pool, &scope).await.map_err(|e| {
            error!("Failed to provision tenant {}: {:?}", code, e);
            ScheduleError::Tenant(format!("could not prepare data partition for {code}"))
        })?;

        self.provisioned.write().await.insert(code.clone());
        Ok(scope)
    }
}

/// Creates the tenant's schema and tables if they do not exist yet.
pub async fn provision_tenant_schema(pool: &PgPool, scope: &TenantScope) -> Result<()> {
    debug!("Provisioning tenant schema {}", scope.schema());
    let mut tx = pool.begin().await.wrap_err("failed to open provisioning transaction")?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(scope.code().schema_name())
        .execute(&mut *tx)
        .await?;

    for statement in tenant_ddl(scope) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .wrap_err_with(|| format!("tenant DDL failed: {statement}"))?;
    }

    register_partition(&mut tx, scope).await?;
    tx.commit().await.wrap_err("failed to commit tenant provisioning")?;

    info!("Tenant schema ready: {}", scope.schema());
    Ok(())
}

async fn register_partition(conn: &mut PgConnection, scope: &TenantScope) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO public.tenant_partitions (company_code, schema_name)
        VALUES ($1, $2)
        ON CONFLICT (company_code) DO NOTHING
        "#,
    )
    .bind(scope.code().as_str())
    .bind(scope.code().schema_name())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn tenant_ddl(scope: &TenantScope) -> Vec<String> {
    let teachers = scope.table("teachers");
    let schedules = scope.table("schedules");
    let assistants = scope.table("schedule_assistants");

    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", scope.schema()),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {teachers} (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                phone VARCHAR(64) NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {schedules} (
                id BIGSERIAL PRIMARY KEY,
                school_name VARCHAR(255) NOT NULL,
                class_name VARCHAR(255) NOT NULL,
                course_type VARCHAR(255) NULL,
                county VARCHAR(255) NULL,
                notes TEXT NULL,
                teacher_id BIGINT NULL REFERENCES {teachers}(id),
                date DATE NOT NULL,
                start_time TIME NOT NULL,
                end_time TIME NOT NULL,
                course_fee BIGINT NOT NULL DEFAULT 0,
                teacher_fee BIGINT NULL,
                is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
                series_id UUID NULL,
                weekdays SMALLINT[] NULL,
                recurrence_start DATE NULL,
                recurrence_end DATE NULL,
                company_code VARCHAR(32) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {assistants} (
                id BIGSERIAL PRIMARY KEY,
                schedule_id BIGINT NOT NULL REFERENCES {schedules}(id),
                assistant_id BIGINT NOT NULL REFERENCES {teachers}(id),
                fee BIGINT NULL
            )
            "#
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_schedules_teacher_date ON {schedules}(teacher_id, date)"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_schedules_series_id ON {schedules}(series_id)"),
        format!("CREATE INDEX IF NOT EXISTS idx_schedules_date ON {schedules}(date, start_time)"),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_schedule_assistants_schedule_id ON {assistants}(schedule_id)"
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> TenantScope {
        TenantScope::new(TenantCode::parse("Acme01").unwrap())
    }

    #[test]
    fn table_names_are_schema_qualified_and_quoted() {
        assert_eq!(scope().schema(), "\"tenant_acme01\"");
        assert_eq!(scope().table("schedules"), "\"tenant_acme01\".\"schedules\"");
    }

    #[test]
    fn ddl_only_touches_the_tenant_schema() {
        let ddl = tenant_ddl(&scope());
        assert!(ddl[0].starts_with("CREATE SCHEMA IF NOT EXISTS \"tenant_acme01\""));
        for statement in &ddl[1..] {
            assert!(statement.contains("\"tenant_acme01\"."), "{statement}");
            assert!(statement.contains("IF NOT EXISTS"), "{statement}");
        }
    }
}

use crate::models::DbTeacher;
use crate::tenant::TenantScope;
use eyre::Result;
use sqlx::PgConnection;

/// Adds a teacher to the tenant's directory. The directory is normally
/// maintained by onboarding; the scheduling core only reads it.
pub async fn create_teacher(
    conn: &mut PgConnection,
    scope: &TenantScope,
    name: &str,
    phone: Option<&str>,
) -> Result<DbTeacher> {
    let teacher = sqlx::query_as::<_, DbTeacher>(&format!(
        r#"
        INSERT INTO {} (name, phone)
        VALUES ($1, $2)
        RETURNING id, name, phone, active, created_at
        "#,
        scope.table("teachers")
    ))
    .bind(name)
    .bind(phone)
    .fetch_one(&mut *conn)
    .await?;

    Ok(teacher)
}

/// Ids from `ids` that have no entry in the tenant's directory.
pub async fn missing_teacher_ids(
    conn: &mut PgConnection,
    scope: &TenantScope,
    ids: &[i64],
) -> Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let known = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT id FROM {} WHERE id = ANY($1)",
        scope.table("teachers")
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut missing: Vec<i64> = ids.iter().copied().filter(|id| !known.contains(id)).collect();
    missing.sort_unstable();
    missing.dedup();
    Ok(missing)
}

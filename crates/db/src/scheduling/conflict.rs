use classbook_core::{
    errors::{ScheduleError, ScheduleResult},
    overlap::{describe_clash, SlotClaim},
};
use eyre::Result;
use sqlx::PgConnection;
use tracing::warn;

use crate::models::DbOccurrence;
use crate::repositories::occurrence::select_occurrences;
use crate::tenant::TenantScope;

/// Serializes writers for one teacher within a tenant until the surrounding
/// transaction ends. Must be called inside a transaction.
pub async fn lock_teacher(conn: &mut PgConnection, scope: &TenantScope, teacher_id: i64) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("{}:{}", scope.code().schema_name(), teacher_id))
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// First existing occurrence that overlaps the claim, if any.
pub async fn find_conflict(
    conn: &mut PgConnection,
    scope: &TenantScope,
    claim: &SlotClaim,
) -> Result<Option<DbOccurrence>> {
    let clash = sqlx::query_as::<_, DbOccurrence>(&format!(
        r#"
        {}
        WHERE s.teacher_id = $1
          AND s.date = $2
          AND s.start_time < $4
          AND s.end_time > $3
          AND NOT (s.id = ANY($5))
        ORDER BY s.start_time ASC
        LIMIT 1
        "#,
        select_occurrences(scope)
    ))
    .bind(claim.teacher_id)
    .bind(claim.date)
    .bind(claim.range.start)
    .bind(claim.range.end)
    .bind(&claim.exclude_ids)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(clash)
}

/// Locks the claim's teacher and fails with [`ScheduleError::Conflict`] if
/// the slot is taken. Pending occurrences (`None`) always pass.
pub async fn ensure_no_conflict(
    conn: &mut PgConnection,
    scope: &TenantScope,
    claim: Option<SlotClaim>,
) -> ScheduleResult<()> {
    let Some(claim) = claim else {
        return Ok(());
    };

    lock_teacher(conn, scope, claim.teacher_id).await?;

    if let Some(existing) = find_conflict(conn, scope, &claim).await? {
        let details = existing.details();
        warn!(
            "Conflict for teacher {} on {}: clashes with occurrence {}",
            claim.teacher_id, claim.date, existing.id
        );
        return Err(ScheduleError::Conflict(describe_clash(
            existing.date,
            &details.time_range(),
        )));
    }

    Ok(())
}

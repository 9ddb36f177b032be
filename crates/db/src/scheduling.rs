//! # Scheduling engine
//!
//! Orchestrates the schedule store for one tenant:
//!
//! - [`conflict`]: double-booking detection, serialized per teacher with an
//!   advisory lock so the check and the write cannot interleave with another
//!   request for the same teacher.
//! - [`series`]: creation of one-off sessions, weekday series and custom date
//!   lists.
//! - [`mutation`]: single- and series-scoped update and delete, plus the
//!   move/copy-to-date operation.
//!
//! Every function takes a [`TenantScope`]; there is no way to reach a table
//! without one.

pub mod conflict;
pub mod mutation;
pub mod series;

use std::collections::HashMap;

use classbook_core::{
    errors::{ScheduleError, ScheduleResult},
    models::schedule::{AssistantAssignment, ListSchedulesQuery, ScheduleOccurrence},
};
use eyre::WrapErr;
use sqlx::{PgConnection, PgPool};

use crate::models::DbOccurrence;
use crate::repositories::{assistant, occurrence, teacher};
use crate::tenant::TenantScope;

pub use conflict::ensure_no_conflict;
pub use mutation::{delete_schedule, relocate_schedule, update_schedule};
pub use series::create_schedules;

pub async fn list_schedules(
    pool: &PgPool,
    scope: &TenantScope,
    query: &ListSchedulesQuery,
) -> ScheduleResult<Vec<ScheduleOccurrence>> {
    query.validate()?;
    let mut conn = pool.acquire().await.wrap_err("failed to acquire connection")?;

    let rows =
        occurrence::list_occurrences(&mut conn, scope, query.start_date, query.end_date).await?;
    Ok(hydrate(&mut conn, scope, rows).await?)
}

pub async fn get_schedule(
    pool: &PgPool,
    scope: &TenantScope,
    id: i64,
) -> ScheduleResult<ScheduleOccurrence> {
    let mut conn = pool.acquire().await.wrap_err("failed to acquire connection")?;
    load_one(&mut conn, scope, id).await
}

pub(crate) fn not_found(id: i64) -> ScheduleError {
    ScheduleError::NotFound(format!("Schedule with ID {} not found", id))
}

pub(crate) async fn load_one(
    conn: &mut PgConnection,
    scope: &TenantScope,
    id: i64,
) -> ScheduleResult<ScheduleOccurrence> {
    let row = occurrence::get_occurrence(conn, scope, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let mut loaded = hydrate(conn, scope, vec![row]).await?;
    loaded.pop().ok_or_else(|| not_found(id))
}

/// Attaches assistant assignments to occurrence rows, preserving row order.
pub(crate) async fn hydrate(
    conn: &mut PgConnection,
    scope: &TenantScope,
    rows: Vec<DbOccurrence>,
) -> eyre::Result<Vec<ScheduleOccurrence>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut by_schedule: HashMap<i64, Vec<AssistantAssignment>> = HashMap::new();
    for row in assistant::get_assistants_for(conn, scope, &ids).await? {
        by_schedule.entry(row.schedule_id).or_default().push(row.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let assistants = by_schedule.remove(&row.id).unwrap_or_default();
            row.into_occurrence(assistants)
        })
        .collect())
}

/// Rejects references to teachers or assistants missing from the directory.
pub(crate) async fn ensure_staff_exist(
    conn: &mut PgConnection,
    scope: &TenantScope,
    ids: &[i64],
) -> ScheduleResult<()> {
    let missing = teacher::missing_teacher_ids(conn, scope, ids).await?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ScheduleError::Validation(format!(
            "unknown teacher or assistant id(s): {missing:?}"
        )))
    }
}

use chrono::NaiveDate;
use classbook_core::{
    errors::{ScheduleError, ScheduleResult},
    models::schedule::{
        DeleteReport, MoveScheduleRequest, OccurrenceDetails, ScheduleOccurrence,
        UpdateScheduleRequest, UpdateScope,
    },
    overlap::{describe_clash, SlotClaim},
};
use eyre::WrapErr;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    conflict::ensure_no_conflict, ensure_staff_exist, hydrate, load_one, not_found,
    series::insert_draft,
};
use crate::models::DbOccurrence;
use crate::repositories::{assistant, occurrence};
use crate::tenant::TenantScope;

/// An occurrence as it will look once the update is written.
type PlannedRow = (i64, OccurrenceDetails, NaiveDate);

/// Rows addressed by a scoped operation. A series request on a one-off
/// occurrence falls back to single scope.
async fn resolve_targets(
    conn: &mut PgConnection,
    scope: &TenantScope,
    id: i64,
    requested: UpdateScope,
) -> ScheduleResult<(UpdateScope, Vec<DbOccurrence>)> {
    let target = occurrence::get_occurrence(conn, scope, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    match (requested, target.series_id) {
        (UpdateScope::Series, Some(series_id)) => {
            let members = occurrence::get_series_members(conn, scope, series_id).await?;
            Ok((UpdateScope::Series, members))
        }
        (UpdateScope::Series, None) => {
            debug!("Occurrence {} has no series; applying single scope", id);
            Ok((UpdateScope::Single, vec![target]))
        }
        (UpdateScope::Single, _) => Ok((UpdateScope::Single, vec![target])),
    }
}

/// Applies a partial update to one occurrence or to its whole series.
///
/// In series scope every member receives the same field values and the same
/// assistant set, but keeps its own date. Every member's date is checked
/// against the new teacher and times before anything is written.
pub async fn update_schedule(
    pool: &PgPool,
    scope: &TenantScope,
    id: i64,
    request: &UpdateScheduleRequest,
) -> ScheduleResult<Vec<ScheduleOccurrence>> {
    let patch = &request.patch;
    let mut tx = pool.begin().await.wrap_err("failed to open transaction")?;

    ensure_staff_exist(&mut tx, scope, &patch.referenced_staff()).await?;
    let (effective, members) = resolve_targets(&mut tx, scope, id, request.update_type).await?;

    if effective == UpdateScope::Series && patch.date.is_some() {
        debug!("Ignoring date change in series update of {}", id);
    }

    let member_ids: Vec<i64> = members.iter().map(|m| m.id).collect();
    let mut planned = Vec::with_capacity(members.len());
    for member in &members {
        let mut details = member.details();
        patch.apply(&mut details);
        details.validate()?;
        let date = match effective {
            UpdateScope::Single => patch.date.unwrap_or(member.date),
            UpdateScope::Series => member.date,
        };
        planned.push((member.id, details, date));
    }

    // Stored member rows still hold their old values, so the members are
    // checked against each other here and only against outsiders below.
    ensure_members_disjoint(&planned)?;
    for (_, details, date) in &planned {
        let claim = SlotClaim::for_slot(details.teacher_id, *date, details.time_range())
            .map(|claim| claim.excluding(member_ids.iter().copied()));
        ensure_no_conflict(&mut tx, scope, claim).await?;
    }

    for (member_id, details, date) in &planned {
        occurrence::update_occurrence(&mut tx, scope, *member_id, details, *date).await?;
    }

    if let Some(assistants) = &patch.assistants {
        assistant::delete_assistants_for(&mut tx, scope, &member_ids).await?;
        for member_id in &member_ids {
            assistant::insert_assistants(&mut tx, scope, *member_id, assistants).await?;
        }
    }

    let rows = occurrence::get_occurrences_by_ids(&mut tx, scope, &member_ids).await?;
    let updated = hydrate(&mut tx, scope, rows).await?;
    tx.commit().await.wrap_err("failed to commit schedule update")?;

    info!(
        "Updated {} occurrence(s) for tenant {} ({:?} scope)",
        updated.len(),
        scope.code(),
        effective
    );
    Ok(updated)
}

/// Fails if two rows of the same update would double-book their teacher.
fn ensure_members_disjoint(planned: &[PlannedRow]) -> ScheduleResult<()> {
    for (id, details, date) in planned {
        let Some(claim) = SlotClaim::for_slot(details.teacher_id, *date, details.time_range()) else {
            continue;
        };
        let claim = claim.excluding([*id]);

        let sibling = planned.iter().find(|(other_id, other, other_date)| {
            claim.clashes_with(*other_id, other.teacher_id, *other_date, &other.time_range())
        });
        if let Some((other_id, other, other_date)) = sibling {
            warn!(
                "Conflict for teacher {} on {}: occurrences {} and {} would overlap",
                claim.teacher_id, claim.date, id, other_id
            );
            return Err(ScheduleError::Conflict(describe_clash(
                *other_date,
                &other.time_range(),
            )));
        }
    }
    Ok(())
}

/// Deletes one occurrence or its whole series. Assistant rows go first.
pub async fn delete_schedule(
    pool: &PgPool,
    scope: &TenantScope,
    id: i64,
    requested: UpdateScope,
) -> ScheduleResult<DeleteReport> {
    let mut tx = pool.begin().await.wrap_err("failed to open transaction")?;
    let (effective, members) = resolve_targets(&mut tx, scope, id, requested).await?;
    let ids: Vec<i64> = members.iter().map(|m| m.id).collect();

    let assistants_removed = assistant::delete_assistants_for(&mut tx, scope, &ids).await?;
    let rows_removed = occurrence::delete_occurrences(&mut tx, scope, &ids).await?;
    tx.commit().await.wrap_err("failed to commit schedule deletion")?;

    info!(
        "Deleted {} occurrence(s) and {} assistant row(s) for tenant {} ({:?} scope)",
        rows_removed,
        assistants_removed,
        scope.code(),
        effective
    );
    Ok(DeleteReport {
        scope: effective,
        deleted_ids: ids,
    })
}

/// Moves an occurrence to another date, or copies it there.
///
/// A copy keeps the source's series id, or mints one and stamps it on the
/// source too so both rows form a series. Runs in a single transaction.
pub async fn relocate_schedule(
    pool: &PgPool,
    scope: &TenantScope,
    id: i64,
    request: &MoveScheduleRequest,
) -> ScheduleResult<ScheduleOccurrence> {
    let mut tx = pool.begin().await.wrap_err("failed to open transaction")?;
    let source = load_one(&mut tx, scope, id).await?;

    let mut claim = SlotClaim::for_slot(
        source.details.teacher_id,
        request.date,
        source.details.time_range(),
    );
    if !request.is_copy {
        claim = claim.map(|claim| claim.excluding([id]));
    }
    ensure_no_conflict(&mut tx, scope, claim).await?;

    let result_id = if request.is_copy {
        let series_id = match source.series_id {
            Some(series_id) => series_id,
            None => {
                let minted = Uuid::new_v4();
                occurrence::set_series_id(&mut tx, scope, id, minted).await?;
                minted
            }
        };
        insert_draft(&mut tx, scope, &source.to_draft(request.date, series_id)).await?
    } else {
        occurrence::set_occurrence_date(&mut tx, scope, id, request.date).await?;
        id
    };

    let relocated = load_one(&mut tx, scope, result_id).await?;
    tx.commit().await.wrap_err("failed to commit schedule relocation")?;

    info!(
        "{} occurrence {} to {} for tenant {} (result {})",
        if request.is_copy { "Copied" } else { "Moved" },
        id,
        request.date,
        scope.code(),
        result_id
    );
    Ok(relocated)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn row(id: i64, teacher_id: Option<i64>, day: u32, start: u32, end: u32) -> PlannedRow {
        let details = OccurrenceDetails {
            school_name: "Maple Elementary".to_string(),
            class_name: "Robotics A".to_string(),
            course_type: None,
            county: None,
            notes: None,
            teacher_id,
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            course_fee: 0,
            teacher_fee: None,
        };
        (id, details, NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
    }

    #[test]
    fn members_on_different_dates_pass() {
        let planned = vec![row(1, Some(5), 1, 13, 14), row(2, Some(5), 3, 13, 14)];
        assert!(ensure_members_disjoint(&planned).is_ok());
    }

    #[test]
    fn members_sharing_a_date_and_time_clash() {
        let planned = vec![row(1, Some(5), 1, 13, 14), row(2, Some(5), 1, 13, 14)];
        let err = ensure_members_disjoint(&planned).unwrap_err();
        assert!(matches!(err, ScheduleError::Conflict(message) if message.contains("2024-01-01")));
    }

    #[test]
    fn pending_members_never_clash() {
        let planned = vec![row(1, None, 1, 13, 14), row(2, None, 1, 13, 14)];
        assert!(ensure_members_disjoint(&planned).is_ok());
    }

    #[test]
    fn back_to_back_members_pass() {
        let planned = vec![row(1, Some(5), 1, 13, 14), row(2, Some(5), 1, 14, 15)];
        assert!(ensure_members_disjoint(&planned).is_ok());
    }
}

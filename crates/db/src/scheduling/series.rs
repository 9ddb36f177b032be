use classbook_core::{
    errors::ScheduleResult,
    models::schedule::{
        CreateReport, CreateScheduleRequest, DateFailure, OccurrenceDraft, ScheduleOccurrence,
    },
    overlap::SlotClaim,
    recurrence::{CreateMode, CreatePlan},
};
use eyre::WrapErr;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info, warn};

use super::{conflict::ensure_no_conflict, ensure_staff_exist, hydrate, load_one};
use crate::repositories::{assistant, occurrence};
use crate::tenant::TenantScope;

pub(crate) fn claim_for(draft: &OccurrenceDraft) -> Option<SlotClaim> {
    SlotClaim::for_slot(draft.details.teacher_id, draft.date, draft.details.time_range())
}

/// Persists a draft and its assistant set, returning the new id.
pub(crate) async fn insert_draft(
    conn: &mut PgConnection,
    scope: &TenantScope,
    draft: &OccurrenceDraft,
) -> eyre::Result<i64> {
    let id = occurrence::insert_occurrence(conn, scope, draft).await?;
    assistant::insert_assistants(conn, scope, id, &draft.assistants).await?;
    Ok(id)
}

/// Creates the occurrences described by a create request.
///
/// One-off sessions and weekday series are all-or-nothing: every date is
/// conflict-checked before anything is written, and the checks and inserts
/// share one transaction. Custom date lists are best effort: each date is
/// created independently and the report lists the dates that failed.
pub async fn create_schedules(
    pool: &PgPool,
    scope: &TenantScope,
    request: &CreateScheduleRequest,
) -> ScheduleResult<CreateReport> {
    let plan = request.plan()?;

    {
        let mut conn = pool.acquire().await.wrap_err("failed to acquire connection")?;
        ensure_staff_exist(&mut conn, scope, &request.referenced_staff()).await?;
    }

    match plan.mode {
        CreateMode::Single | CreateMode::Recurring => create_all_or_nothing(pool, scope, plan).await,
        CreateMode::CustomDates => create_best_effort(pool, scope, plan).await,
    }
}

async fn create_all_or_nothing(
    pool: &PgPool,
    scope: &TenantScope,
    plan: CreatePlan,
) -> ScheduleResult<CreateReport> {
    let mut tx = pool.begin().await.wrap_err("failed to open transaction")?;

    // Validation pass: nothing is written unless every date is free.
    for draft in &plan.drafts {
        ensure_no_conflict(&mut tx, scope, claim_for(draft)).await?;
    }

    let mut ids = Vec::with_capacity(plan.drafts.len());
    for draft in &plan.drafts {
        ids.push(insert_draft(&mut tx, scope, draft).await?);
    }

    let rows = occurrence::get_occurrences_by_ids(&mut tx, scope, &ids).await?;
    let created = hydrate(&mut tx, scope, rows).await?;
    tx.commit().await.wrap_err("failed to commit schedule creation")?;

    info!(
        "Created {} occurrence(s) for tenant {} (series {:?})",
        created.len(),
        scope.code(),
        plan.series_id
    );
    Ok(CreateReport::complete(plan.series_id, created))
}

async fn create_best_effort(
    pool: &PgPool,
    scope: &TenantScope,
    plan: CreatePlan,
) -> ScheduleResult<CreateReport> {
    let mut created = Vec::new();
    let mut failures = Vec::new();
    let mut first_error = None;

    for draft in &plan.drafts {
        match create_one(pool, scope, draft).await {
            Ok(occurrence) => created.push(occurrence),
            Err(err) => {
                if err.is_client_error() {
                    warn!("Skipping {} for tenant {}: {}", draft.date, scope.code(), err);
                } else {
                    error!("Failed to create {} for tenant {}: {:?}", draft.date, scope.code(), err);
                }
                failures.push(DateFailure {
                    date: draft.date,
                    reason: err.to_string(),
                });
                first_error.get_or_insert(err);
            }
        }
    }

    if created.is_empty() {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    if !failures.is_empty() {
        warn!(
            "Custom date batch for tenant {}: {} created, {} failed",
            scope.code(),
            created.len(),
            failures.len()
        );
    }

    Ok(CreateReport {
        series_id: plan.series_id,
        created_count: created.len(),
        failed_count: failures.len(),
        created,
        failures,
    })
}

async fn create_one(
    pool: &PgPool,
    scope: &TenantScope,
    draft: &OccurrenceDraft,
) -> ScheduleResult<ScheduleOccurrence> {
    let mut tx = pool.begin().await.wrap_err("failed to open transaction")?;
    ensure_no_conflict(&mut tx, scope, claim_for(draft)).await?;
    let id = insert_draft(&mut tx, scope, draft).await?;
    let occurrence = load_one(&mut tx, scope, id).await?;
    tx.commit().await.wrap_err("failed to commit schedule creation")?;
    Ok(occurrence)
}

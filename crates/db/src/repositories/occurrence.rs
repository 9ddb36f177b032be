use crate::models::DbOccurrence;
use crate::tenant::TenantScope;
use chrono::NaiveDate;
use classbook_core::models::schedule::{OccurrenceDetails, OccurrenceDraft};
use eyre::Result;
use sqlx::PgConnection;
use uuid::Uuid;

/// SELECT list shared by every occurrence query. Callers append the WHERE
/// and ORDER BY clauses; `s` is the schedules table and `t` the teacher.
pub(crate) fn select_occurrences(scope: &TenantScope) -> String {
    format!(
        r#"
        SELECT s.id, s.school_name, s.class_name, s.course_type, s.county, s.notes,
               s.teacher_id, t.name AS teacher_name, s.date, s.start_time, s.end_time,
               s.course_fee, s.teacher_fee, s.is_recurring, s.series_id, s.weekdays,
               s.recurrence_start, s.recurrence_end, s.company_code, s.created_at, s.updated_at
        FROM {} s
        LEFT JOIN {} t ON t.id = s.teacher_id
        "#,
        scope.table("schedules"),
        scope.table("teachers"),
    )
}

pub async fn insert_occurrence(
    conn: &mut PgConnection,
    scope: &TenantScope,
    draft: &OccurrenceDraft,
) -> Result<i64> {
    let rule = draft.series.as_ref().and_then(|tag| tag.rule.as_ref());
    let details = &draft.details;

    tracing::debug!(
        "Inserting occurrence: tenant={}, date={}, teacher={:?}, series={:?}",
        scope.code(),
        draft.date,
        details.teacher_id,
        draft.series_id()
    );

    let id = sqlx::query_scalar::<_, i64>(&format!(
        r#"
        INSERT INTO {} (
            school_name, class_name, course_type, county, notes, teacher_id,
            date, start_time, end_time, course_fee, teacher_fee,
            is_recurring, series_id, weekdays, recurrence_start, recurrence_end, company_code
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING id
        "#,
        scope.table("schedules")
    ))
    .bind(&details.school_name)
    .bind(&details.class_name)
    .bind(&details.course_type)
    .bind(&details.county)
    .bind(&details.notes)
    .bind(details.teacher_id)
    .bind(draft.date)
    .bind(details.start_time)
    .bind(details.end_time)
    .bind(details.course_fee)
    .bind(details.teacher_fee)
    .bind(draft.is_recurring())
    .bind(draft.series_id())
    .bind(rule.map(|r| r.weekdays.to_numbers()))
    .bind(rule.map(|r| r.start_date))
    .bind(rule.map(|r| r.end_date))
    .bind(scope.code().as_str())
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

pub async fn get_occurrence(
    conn: &mut PgConnection,
    scope: &TenantScope,
    id: i64,
) -> Result<Option<DbOccurrence>> {
    let occurrence = sqlx::query_as::<_, DbOccurrence>(&format!(
        "{} WHERE s.id = $1",
        select_occurrences(scope)
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(occurrence)
}

pub async fn get_occurrences_by_ids(
    conn: &mut PgConnection,
    scope: &TenantScope,
    ids: &[i64],
) -> Result<Vec<DbOccurrence>> {
    let occurrences = sqlx::query_as::<_, DbOccurrence>(&format!(
        "{} WHERE s.id = ANY($1) ORDER BY s.date ASC, s.start_time ASC, s.id ASC",
        select_occurrences(scope)
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(occurrences)
}

/// Occurrences within an optional inclusive date window, ordered by date then start time.
pub async fn list_occurrences(
    conn: &mut PgConnection,
    scope: &TenantScope,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<DbOccurrence>> {
    let occurrences = sqlx::query_as::<_, DbOccurrence>(&format!(
        r#"
        {}
        WHERE ($1::date IS NULL OR s.date >= $1)
          AND ($2::date IS NULL OR s.date <= $2)
        ORDER BY s.date ASC, s.start_time ASC, s.id ASC
        "#,
        select_occurrences(scope)
    ))
    .bind(start_date)
    .bind(end_date)
    .fetch_all(&mut *conn)
    .await?;

    Ok(occurrences)
}

pub async fn get_series_members(
    conn: &mut PgConnection,
    scope: &TenantScope,
    series_id: Uuid,
) -> Result<Vec<DbOccurrence>> {
    let occurrences = sqlx::query_as::<_, DbOccurrence>(&format!(
        r#"
        {}
        WHERE s.series_id = $1 AND s.company_code = $2
        ORDER BY s.date ASC, s.start_time ASC, s.id ASC
        "#,
        select_occurrences(scope)
    ))
    .bind(series_id)
    .bind(scope.code().as_str())
    .fetch_all(&mut *conn)
    .await?;

    Ok(occurrences)
}

pub async fn update_occurrence(
    conn: &mut PgConnection,
    scope: &TenantScope,
    id: i64,
    details: &OccurrenceDetails,
    date: NaiveDate,
) -> Result<()> {
    sqlx::query(&format!(
        r#"
        UPDATE {}
        SET school_name = $2, class_name = $3, course_type = $4, county = $5, notes = $6,
            teacher_id = $7, date = $8, start_time = $9, end_time = $10,
            course_fee = $11, teacher_fee = $12, updated_at = NOW()
        WHERE id = $1
        "#,
        scope.table("schedules")
    ))
    .bind(id)
    .bind(&details.school_name)
    .bind(&details.class_name)
    .bind(&details.course_type)
    .bind(&details.county)
    .bind(&details.notes)
    .bind(details.teacher_id)
    .bind(date)
    .bind(details.start_time)
    .bind(details.end_time)
    .bind(details.course_fee)
    .bind(details.teacher_fee)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn set_occurrence_date(
    conn: &mut PgConnection,
    scope: &TenantScope,
    id: i64,
    date: NaiveDate,
) -> Result<()> {
    sqlx::query(&format!(
        "UPDATE {} SET date = $2, updated_at = NOW() WHERE id = $1",
        scope.table("schedules")
    ))
    .bind(id)
    .bind(date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Attaches a one-off occurrence to a series.
pub async fn set_series_id(
    conn: &mut PgConnection,
    scope: &TenantScope,
    id: i64,
    series_id: Uuid,
) -> Result<()> {
    sqlx::query(&format!(
        "UPDATE {} SET series_id = $2, is_recurring = TRUE, updated_at = NOW() WHERE id = $1",
        scope.table("schedules")
    ))
    .bind(id)
    .bind(series_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes occurrence rows. Their assistant rows must already be gone.
pub async fn delete_occurrences(
    conn: &mut PgConnection,
    scope: &TenantScope,
    ids: &[i64],
) -> Result<u64> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = ANY($1)",
        scope.table("schedules")
    ))
    .bind(ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

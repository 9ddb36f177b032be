use crate::models::DbAssistant;
use crate::tenant::TenantScope;
use classbook_core::models::schedule::AssistantInput;
use eyre::Result;
use sqlx::PgConnection;

pub async fn insert_assistants(
    conn: &mut PgConnection,
    scope: &TenantScope,
    schedule_id: i64,
    assistants: &[AssistantInput],
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (schedule_id, assistant_id, fee) VALUES ($1, $2, $3)",
        scope.table("schedule_assistants")
    );

    for assistant in assistants {
        sqlx::query(&sql)
            .bind(schedule_id)
            .bind(assistant.assistant_id)
            .bind(assistant.fee)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Assistants of the given occurrences, with their directory names.
pub async fn get_assistants_for(
    conn: &mut PgConnection,
    scope: &TenantScope,
    schedule_ids: &[i64],
) -> Result<Vec<DbAssistant>> {
    let assistants = sqlx::query_as::<_, DbAssistant>(&format!(
        r#"
        SELECT a.schedule_id, a.assistant_id, t.name AS assistant_name, a.fee
        FROM {} a
        LEFT JOIN {} t ON t.id = a.assistant_id
        WHERE a.schedule_id = ANY($1)
        ORDER BY a.schedule_id ASC, a.id ASC
        "#,
        scope.table("schedule_assistants"),
        scope.table("teachers"),
    ))
    .bind(schedule_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(assistants)
}

pub async fn delete_assistants_for(
    conn: &mut PgConnection,
    scope: &TenantScope,
    schedule_ids: &[i64],
) -> Result<u64> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE schedule_id = ANY($1)",
        scope.table("schedule_assistants")
    ))
    .bind(schedule_ids)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

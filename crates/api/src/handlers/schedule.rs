use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Response,
    },
};
use classbook_core::{
    events::ScheduleEvent,
    models::schedule::{
        CreateScheduleRequest, DeleteScheduleQuery, ListSchedulesQuery, MoveScheduleRequest,
        UpdateScheduleRequest, UpdateScope,
    },
};
use classbook_db::scheduling;
use futures::{stream, Stream};
use tracing::warn;

use crate::{
    middleware::{
        error_handling::AppError,
        extract::{ApiJson, ApiPath, ApiQuery},
        tenant::TenantContext,
    },
    response::ApiResponse,
    ApiState,
};

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn list_schedules(
    State(state): State<Arc<ApiState>>,
    tenant: TenantContext,
    ApiQuery(query): ApiQuery<ListSchedulesQuery>,
) -> Result<Response, AppError> {
    let schedules = scheduling::list_schedules(&state.db_pool, tenant.scope(), &query).await?;
    let message = format!("Found {} schedule(s)", schedules.len());

    Ok(ApiResponse::ok(message, schedules).with_status(StatusCode::OK))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn get_schedule(
    State(state): State<Arc<ApiState>>,
    tenant: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response, AppError> {
    let schedule = scheduling::get_schedule(&state.db_pool, tenant.scope(), id).await?;

    Ok(ApiResponse::ok("Schedule retrieved", schedule).with_status(StatusCode::OK))
}

/// Creates a one-off session, a weekday series or a custom date list.
///
/// Answers 201 when every requested date was created and 200 with a warning
/// when a custom date list was only partly created.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn create_schedule(
    State(state): State<Arc<ApiState>>,
    tenant: TenantContext,
    ApiJson(payload): ApiJson<CreateScheduleRequest>,
) -> Result<Response, AppError> {
    let report = scheduling::create_schedules(&state.db_pool, tenant.scope(), &payload).await?;

    state.registry.broadcast(
        tenant.code(),
        ScheduleEvent::Created {
            ids: report.created.iter().map(|o| o.id).collect(),
            series_id: report.series_id,
        },
    );

    if report.is_partial() {
        let message = format!(
            "Created {} of {} schedule(s); {} date(s) could not be scheduled",
            report.created_count,
            report.created_count + report.failed_count,
            report.failed_count
        );
        Ok(ApiResponse::ok(message, report).with_status(StatusCode::OK))
    } else {
        let message = format!("Created {} schedule(s)", report.created_count);
        Ok(ApiResponse::ok(message, report).with_status(StatusCode::CREATED))
    }
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn update_schedule(
    State(state): State<Arc<ApiState>>,
    tenant: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateScheduleRequest>,
) -> Result<Response, AppError> {
    let updated = scheduling::update_schedule(&state.db_pool, tenant.scope(), id, &payload).await?;

    state.registry.broadcast(
        tenant.code(),
        ScheduleEvent::Updated {
            ids: updated.iter().map(|o| o.id).collect(),
        },
    );

    let message = if updated.len() > 1 {
        format!("Updated {} schedules in series", updated.len())
    } else {
        "Schedule updated".to_string()
    };
    Ok(ApiResponse::ok(message, updated).with_status(StatusCode::OK))
}

/// Moves a session to another date, or copies it there when `isCopy` is set.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn move_schedule(
    State(state): State<Arc<ApiState>>,
    tenant: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<MoveScheduleRequest>,
) -> Result<Response, AppError> {
    let result = scheduling::relocate_schedule(&state.db_pool, tenant.scope(), id, &payload).await?;

    let (event, message, status) = if payload.is_copy {
        (
            ScheduleEvent::Copied {
                source_id: id,
                id: result.id,
                date: result.date,
            },
            format!("Schedule copied to {}", result.date),
            StatusCode::CREATED,
        )
    } else {
        (
            ScheduleEvent::Moved {
                id,
                date: result.date,
            },
            format!("Schedule moved to {}", result.date),
            StatusCode::OK,
        )
    };
    state.registry.broadcast(tenant.code(), event);

    Ok(ApiResponse::ok(message, result).with_status(status))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn delete_schedule(
    State(state): State<Arc<ApiState>>,
    tenant: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<DeleteScheduleQuery>,
) -> Result<Response, AppError> {
    let report = scheduling::delete_schedule(&state.db_pool, tenant.scope(), id, query.scope).await?;

    state.registry.broadcast(
        tenant.code(),
        ScheduleEvent::Deleted {
            ids: report.deleted_ids.clone(),
        },
    );

    let message = match report.scope {
        UpdateScope::Series => format!(
            "Deleted series ({} schedule(s) removed)",
            report.deleted_ids.len()
        ),
        UpdateScope::Single => "Schedule deleted".to_string(),
    };
    Ok(ApiResponse::ok(message, report).with_status(StatusCode::OK))
}

/// Server-sent event stream of the tenant's schedule changes.
pub async fn schedule_events(
    State(state): State<Arc<ApiState>>,
    tenant: TenantContext,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.registry.add(tenant.code());

    let events = stream::unfold(subscription, |mut subscription| async move {
        loop {
            let event = subscription.recv().await?;
            match Event::default().event(event.kind()).json_data(&event) {
                Ok(frame) => return Some((Ok(frame), subscription)),
                Err(e) => warn!("Dropping unserializable {} event: {}", event.kind(), e),
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

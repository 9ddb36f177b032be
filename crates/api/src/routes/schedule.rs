use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers::schedule, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/schedules",
            get(schedule::list_schedules).post(schedule::create_schedule),
        )
        .route("/api/schedules/events", get(schedule::schedule_events))
        .route(
            "/api/schedules/:id",
            get(schedule::get_schedule)
                .put(schedule::update_schedule)
                .delete(schedule::delete_schedule),
        )
        .route("/api/schedules/:id/date", put(schedule::move_schedule))
}

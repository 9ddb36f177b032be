use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Change notifications pushed to subscribers of a tenant's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScheduleEvent {
    #[serde(rename_all = "camelCase")]
    Created { ids: Vec<i64>, series_id: Option<Uuid> },
    #[serde(rename_all = "camelCase")]
    Updated { ids: Vec<i64> },
    #[serde(rename_all = "camelCase")]
    Deleted { ids: Vec<i64> },
    #[serde(rename_all = "camelCase")]
    Moved { id: i64, date: NaiveDate },
    #[serde(rename_all = "camelCase")]
    Copied { source_id: i64, id: i64, date: NaiveDate },
}

impl ScheduleEvent {
    /// Name used for the server-sent event `event:` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleEvent::Created { .. } => "created",
            ScheduleEvent::Updated { .. } => "updated",
            ScheduleEvent::Deleted { .. } => "deleted",
            ScheduleEvent::Moved { .. } => "moved",
            ScheduleEvent::Copied { .. } => "copied",
        }
    }
}

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::errors::{ScheduleError, ScheduleResult};
use crate::overlap::TimeRange;
use crate::weekday::WeekdayMask;

/// Descriptive, assignment and fee fields of a class session. Everything a
/// series-wide update may touch lives here; the date does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceDetails {
    pub school_name: String,
    pub class_name: String,
    #[serde(default)]
    pub course_type: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// `None` means the session is still waiting for a teacher.
    #[serde(default)]
    pub teacher_id: Option<i64>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Minor currency units.
    #[serde(default)]
    pub course_fee: i64,
    #[serde(default)]
    pub teacher_fee: Option<i64>,
}

impl OccurrenceDetails {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        if self.school_name.trim().is_empty() {
            return Err(ScheduleError::Validation("schoolName is required".to_string()));
        }
        if self.class_name.trim().is_empty() {
            return Err(ScheduleError::Validation("className is required".to_string()));
        }
        if self.course_fee < 0 || self.teacher_fee.is_some_and(|fee| fee < 0) {
            return Err(ScheduleError::Validation("fees cannot be negative".to_string()));
        }
        Ok(())
    }
}

/// Recurrence definition, denormalized onto every row of a weekday series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub weekdays: WeekdayMask,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Links a generated row to the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesTag {
    pub series_id: Uuid,
    /// `None` for rows created from an explicit date list.
    pub rule: Option<RecurrenceRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantInput {
    pub assistant_id: i64,
    #[serde(default)]
    pub fee: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantAssignment {
    pub assistant_id: i64,
    pub assistant_name: Option<String>,
    pub fee: Option<i64>,
}

/// A not-yet-persisted occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceDraft {
    pub details: OccurrenceDetails,
    pub date: NaiveDate,
    pub series: Option<SeriesTag>,
    pub assistants: Vec<AssistantInput>,
}

impl OccurrenceDraft {
    pub fn is_recurring(&self) -> bool {
        self.series.is_some()
    }

    pub fn series_id(&self) -> Option<Uuid> {
        self.series.as_ref().map(|tag| tag.series_id)
    }
}

/// One concrete, dated class session as stored for a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOccurrence {
    pub id: i64,
    #[serde(flatten)]
    pub details: OccurrenceDetails,
    pub teacher_name: Option<String>,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub series_id: Option<Uuid>,
    pub recurrence: Option<RecurrenceRule>,
    pub company_code: String,
    pub assistants: Vec<AssistantAssignment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleOccurrence {
    /// Turns a stored row back into a draft, as used when copying it to another day.
    pub fn to_draft(&self, date: NaiveDate, series_id: Uuid) -> OccurrenceDraft {
        OccurrenceDraft {
            details: self.details.clone(),
            date,
            series: Some(SeriesTag {
                series_id,
                rule: self.recurrence.clone(),
            }),
            assistants: self
                .assistants
                .iter()
                .map(|a| AssistantInput {
                    assistant_id: a.assistant_id,
                    fee: a.fee,
                })
                .collect(),
        }
    }
}

/// Deserializes a present-but-null field as `Some(None)`, leaving an absent
/// field as `None` through `#[serde(default)]`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of an occurrence. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrencePatch {
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub course_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub county: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub teacher_id: Option<Option<i64>>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub course_fee: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub teacher_fee: Option<Option<i64>>,
    /// Replaces the whole assistant set when present.
    #[serde(default)]
    pub assistants: Option<Vec<AssistantInput>>,
}

impl OccurrencePatch {
    /// Merges the patch into `details`. The date is handled by the caller
    /// since only single-occurrence updates may move a session.
    pub fn apply(&self, details: &mut OccurrenceDetails) {
        if let Some(school_name) = &self.school_name {
            details.school_name = school_name.clone();
        }
        if let Some(class_name) = &self.class_name {
            details.class_name = class_name.clone();
        }
        if let Some(course_type) = &self.course_type {
            details.course_type = course_type.clone();
        }
        if let Some(county) = &self.county {
            details.county = county.clone();
        }
        if let Some(notes) = &self.notes {
            details.notes = notes.clone();
        }
        if let Some(teacher_id) = self.teacher_id {
            details.teacher_id = teacher_id;
        }
        if let Some(start_time) = self.start_time {
            details.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            details.end_time = end_time;
        }
        if let Some(course_fee) = self.course_fee {
            details.course_fee = course_fee;
        }
        if let Some(teacher_fee) = self.teacher_fee {
            details.teacher_fee = teacher_fee;
        }
    }

    /// Teacher ids this patch introduces, for directory checks.
    pub fn referenced_staff(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.teacher_id.flatten().into_iter().collect();
        if let Some(assistants) = &self.assistants {
            ids.extend(assistants.iter().map(|a| a.assistant_id));
        }
        ids
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateScope {
    #[default]
    Single,
    Series,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    #[serde(flatten)]
    pub details: OccurrenceDetails,
    /// Date of a one-off session.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, alias = "is_recurring")]
    pub is_recurring: bool,
    /// Weekday mask, Monday=1 … Sunday=7.
    #[serde(default)]
    pub weekdays: Vec<i32>,
    #[serde(default)]
    pub recurrence_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub custom_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub assistants: Vec<AssistantInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    #[serde(default)]
    pub update_type: UpdateScope,
    #[serde(flatten)]
    pub patch: OccurrencePatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveScheduleRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_copy: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSchedulesQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListSchedulesQuery {
    pub fn validate(&self) -> ScheduleResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ScheduleError::Validation(
                    "startDate must not be after endDate".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteScheduleQuery {
    #[serde(default, rename = "type")]
    pub scope: UpdateScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFailure {
    pub date: NaiveDate,
    pub reason: String,
}

/// Result of a create request. Failures are only ever reported for
/// explicit date lists; the other modes either create everything or fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub series_id: Option<Uuid>,
    pub created: Vec<ScheduleOccurrence>,
    pub created_count: usize,
    pub failed_count: usize,
    pub failures: Vec<DateFailure>,
}

impl CreateReport {
    pub fn complete(series_id: Option<Uuid>, created: Vec<ScheduleOccurrence>) -> Self {
        Self {
            series_id,
            created_count: created.len(),
            created,
            failed_count: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.failed_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub scope: UpdateScope,
    pub deleted_ids: Vec<i64>,
}

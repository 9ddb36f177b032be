use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use classbook_core::{
    models::schedule::{AssistantAssignment, OccurrenceDetails, RecurrenceRule, ScheduleOccurrence},
    weekday::WeekdayMask,
};
use sqlx::FromRow;
use uuid::Uuid;

/// A `schedules` row joined with its teacher's name.
#[derive(Debug, Clone, FromRow)]
pub struct DbOccurrence {
    pub id: i64,
    pub school_name: String,
    pub class_name: String,
    pub course_type: Option<String>,
    pub county: Option<String>,
    pub notes: Option<String>,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub course_fee: i64,
    pub teacher_fee: Option<i64>,
    pub is_recurring: bool,
    pub series_id: Option<Uuid>,
    pub weekdays: Option<Vec<i16>>,
    pub recurrence_start: Option<NaiveDate>,
    pub recurrence_end: Option<NaiveDate>,
    pub company_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbOccurrence {
    pub fn details(&self) -> OccurrenceDetails {
        OccurrenceDetails {
            school_name: self.school_name.clone(),
            class_name: self.class_name.clone(),
            course_type: self.course_type.clone(),
            county: self.county.clone(),
            notes: self.notes.clone(),
            teacher_id: self.teacher_id,
            start_time: self.start_time,
            end_time: self.end_time,
            course_fee: self.course_fee,
            teacher_fee: self.teacher_fee,
        }
    }

    fn recurrence(&self) -> Option<RecurrenceRule> {
        let numbers: Vec<i32> = self.weekdays.as_ref()?.iter().map(|&n| i32::from(n)).collect();
        Some(RecurrenceRule {
            weekdays: WeekdayMask::from_numbers(&numbers).ok()?,
            start_date: self.recurrence_start?,
            end_date: self.recurrence_end?,
        })
    }

    pub fn into_occurrence(self, assistants: Vec<AssistantAssignment>) -> ScheduleOccurrence {
        ScheduleOccurrence {
            details: self.details(),
            recurrence: self.recurrence(),
            id: self.id,
            teacher_name: self.teacher_name,
            date: self.date,
            is_recurring: self.is_recurring,
            series_id: self.series_id,
            company_code: self.company_code,
            assistants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A `schedule_assistants` row joined with the assistant's name.
#[derive(Debug, Clone, FromRow)]
pub struct DbAssistant {
    pub schedule_id: i64,
    pub assistant_id: i64,
    pub assistant_name: Option<String>,
    pub fee: Option<i64>,
}

impl From<DbAssistant> for AssistantAssignment {
    fn from(row: DbAssistant) -> Self {
        AssistantAssignment {
            assistant_id: row.assistant_id,
            assistant_name: row.assistant_name,
            fee: row.fee,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTeacher {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

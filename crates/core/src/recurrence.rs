//! # Series generation
//!
//! Turns a create request into concrete occurrence drafts. Three request
//! shapes are understood:
//!
//! - a one-off session on a single date,
//! - a weekday series: every date in an inclusive range whose weekday is in
//!   the mask,
//! - an explicit list of caller-chosen dates.
//!
//! Multi-date shapes tag all drafts with one freshly minted series id. How
//! the drafts are validated and persisted differs per shape and is decided by
//! the storage layer; this module only reports which shape it saw.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::schedule::{CreateScheduleRequest, OccurrenceDraft, RecurrenceRule, SeriesTag};
use crate::weekday::WeekdayMask;

/// Upper bound on occurrences a single request may generate.
pub const MAX_SERIES_OCCURRENCES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateMode {
    Single,
    /// All-or-nothing: any conflict rejects the whole batch.
    Recurring,
    /// Best effort: each date stands or falls on its own.
    CustomDates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePlan {
    pub mode: CreateMode,
    pub series_id: Option<Uuid>,
    pub drafts: Vec<OccurrenceDraft>,
}

/// Every date in `[start, end]` whose weekday is in `mask`, in order.
///
/// Stops after `MAX_SERIES_OCCURRENCES + 1` dates, enough for the caller to
/// tell that the range is too large without walking all of it.
pub fn expand_weekdays(mask: &WeekdayMask, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| mask.matches(*date))
        .take(MAX_SERIES_OCCURRENCES + 1)
        .collect()
}

fn check_batch_size(count: usize) -> ScheduleResult<()> {
    if count == 0 {
        return Err(ScheduleError::Validation(
            "no dates matched the requested schedule".to_string(),
        ));
    }
    if count > MAX_SERIES_OCCURRENCES {
        return Err(ScheduleError::Validation(format!(
            "request would create more than {MAX_SERIES_OCCURRENCES} sessions"
        )));
    }
    Ok(())
}

impl CreateScheduleRequest {
    /// Classifies the request and expands it into drafts.
    pub fn plan(&self) -> ScheduleResult<CreatePlan> {
        self.details.validate()?;

        let has_custom = !self.custom_dates.is_empty();
        if self.is_recurring && has_custom {
            return Err(ScheduleError::Validation(
                "a request cannot be both recurring and a custom date list".to_string(),
            ));
        }

        if self.is_recurring {
            self.plan_recurring()
        } else if has_custom {
            self.plan_custom_dates()
        } else {
            let date = self.date.ok_or_else(|| {
                ScheduleError::Validation("date is required for a single session".to_string())
            })?;
            Ok(CreatePlan {
                mode: CreateMode::Single,
                series_id: None,
                drafts: vec![self.draft(date, None)],
            })
        }
    }

    fn plan_recurring(&self) -> ScheduleResult<CreatePlan> {
        let mask = WeekdayMask::from_numbers(&self.weekdays)?;
        if mask.is_empty() {
            return Err(ScheduleError::Validation(
                "a recurring schedule needs at least one weekday".to_string(),
            ));
        }
        let (start, end) = match (self.recurrence_start_date, self.recurrence_end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(ScheduleError::Validation(
                    "recurrenceStartDate and recurrenceEndDate are required".to_string(),
                ));
            }
        };
        if start > end {
            return Err(ScheduleError::Validation(
                "recurrenceStartDate must not be after recurrenceEndDate".to_string(),
            ));
        }

        let dates = expand_weekdays(&mask, start, end);
        check_batch_size(dates.len())?;

        let tag = SeriesTag {
            series_id: Uuid::new_v4(),
            rule: Some(RecurrenceRule {
                weekdays: mask,
                start_date: start,
                end_date: end,
            }),
        };
        Ok(CreatePlan {
            mode: CreateMode::Recurring,
            series_id: Some(tag.series_id),
            drafts: dates
                .into_iter()
                .map(|date| self.draft(date, Some(tag.clone())))
                .collect(),
        })
    }

    fn plan_custom_dates(&self) -> ScheduleResult<CreatePlan> {
        let mut dates = self.custom_dates.clone();
        dates.sort_unstable();
        dates.dedup();
        check_batch_size(dates.len())?;

        let tag = SeriesTag {
            series_id: Uuid::new_v4(),
            rule: None,
        };
        Ok(CreatePlan {
            mode: CreateMode::CustomDates,
            series_id: Some(tag.series_id),
            drafts: dates
                .into_iter()
                .map(|date| self.draft(date, Some(tag.clone())))
                .collect(),
        })
    }

    fn draft(&self, date: NaiveDate, series: Option<SeriesTag>) -> OccurrenceDraft {
        OccurrenceDraft {
            details: self.details.clone(),
            date,
            series,
            assistants: self.assistants.clone(),
        }
    }

    /// Teacher and assistant ids the request refers to.
    pub fn referenced_staff(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.details.teacher_id.into_iter().collect();
        ids.extend(self.assistants.iter().map(|a| a.assistant_id));
        ids
    }
}

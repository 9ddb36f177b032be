use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Same-day time span, treated as half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Full interval overlap. Touching boundaries do not overlap, and a span
    /// that swallows the other entirely does.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A teacher's claim on a slot, checked against existing rows for double-booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClaim {
    pub teacher_id: i64,
    pub date: NaiveDate,
    pub range: TimeRange,
    /// Occurrences that must not count as clashes (the rows being edited).
    pub exclude_ids: Vec<i64>,
}

impl SlotClaim {
    /// Returns `None` for pending occurrences, which never conflict.
    pub fn for_slot(teacher_id: Option<i64>, date: NaiveDate, range: TimeRange) -> Option<Self> {
        teacher_id.map(|teacher_id| Self {
            teacher_id,
            date,
            range,
            exclude_ids: Vec::new(),
        })
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    /// Whether an existing row for the same teacher clashes with this claim.
    pub fn clashes_with(&self, id: i64, teacher_id: Option<i64>, date: NaiveDate, range: &TimeRange) -> bool {
        teacher_id == Some(self.teacher_id)
            && date == self.date
            && !self.exclude_ids.contains(&id)
            && self.range.overlaps(range)
    }
}

/// Human readable description of the slot a conflict was found in.
pub fn describe_clash(date: NaiveDate, range: &TimeRange) -> String {
    format!(
        "teacher already has a class on {} from {} to {}",
        date,
        range.start.format("%H:%M"),
        range.end.format("%H:%M")
    )
}

//! Weekday numbering used by recurring schedules.
//!
//! Recurrence masks number days Monday=1 through Sunday=7. Chrono counts
//! from Sunday=0 instead, so [`Weekday::from_date`] is the single place where
//! the two conventions meet.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ScheduleError, ScheduleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Mask number of this day (Monday=1 … Sunday=7).
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// Maps chrono's Sunday-based numbering (Sunday=0) onto the mask numbering.
    pub fn from_date(date: NaiveDate) -> Self {
        let native = date.weekday().num_days_from_sunday() as u8;
        let number = if native == 0 { 7 } else { native };
        // native is always 0..=6, so number is always 1..=7
        Self::ALL[usize::from(number - 1)]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        };
        f.write_str(name)
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        Weekday::from_number(n)
            .ok_or_else(|| serde::de::Error::custom(format!("weekday must be 1-7, got {n}")))
    }
}

/// The set of weekdays a recurring series lands on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdayMask(BTreeSet<Weekday>);

impl WeekdayMask {
    /// Builds a mask from raw mask numbers, rejecting anything outside 1..=7.
    pub fn from_numbers(numbers: &[i32]) -> ScheduleResult<Self> {
        let mut days = BTreeSet::new();
        for &n in numbers {
            let day = u8::try_from(n)
                .ok()
                .and_then(Weekday::from_number)
                .ok_or_else(|| {
                    ScheduleError::Validation(format!(
                        "weekday {n} is out of range; expected 1 (Monday) to 7 (Sunday)"
                    ))
                })?;
            days.insert(day);
        }
        Ok(Self(days))
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.contains(Weekday::from_date(date))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mask numbers in ascending order, as stored alongside recurring rows.
    pub fn to_numbers(&self) -> Vec<i16> {
        self.0.iter().map(|d| i16::from(d.number())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunday_maps_to_seven() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(Weekday::from_date(sunday), Weekday::Sunday);
        assert_eq!(Weekday::from_date(sunday).number(), 7);
    }

    #[test]
    fn number_round_trips_through_from_number() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from_number(day.number()), Some(day));
        }
        assert_eq!(Weekday::from_number(0), None);
        assert_eq!(Weekday::from_number(8), None);
    }
}

//! Weekly meeting schedules and the pairwise conflict predicate.
//!
//! A [`Schedule`] is a recurring weekly slot: a non-empty set of teaching
//! days plus a same-day `[start, end)` interval at minute granularity.
//! Everything the availability resolver and the admission controller decide
//! about time reduces to [`Schedule::conflicts_with`].

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Errors raised while building a schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule must meet on at least one day")]
    NoDays,

    #[error("schedule start {start} must be before end {end}")]
    InvalidInterval { start: TimeOfDay, end: TimeOfDay },

    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
}

/// Teaching days. Weekends are not schedulable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ScheduleError;

    /// Accepts full names and three-letter abbreviations, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            _ => Err(ScheduleError::UnknownWeekday(s.to_string())),
        }
    }
}

impl TryFrom<String> for Weekday {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.as_str().to_string()
    }
}

/// Wall-clock time of day with minute granularity, serialized as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Build from hour and minute; `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(TimeOfDay)
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_from_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }
}

impl From<NaiveTime> for TimeOfDay {
    /// Truncates seconds so stored times compare at minute granularity.
    fn from(time: NaiveTime) -> Self {
        TimeOfDay(NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(TimeOfDay)
            .map_err(|_| ScheduleError::InvalidTime(s.to_string()))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// Wire form of a schedule; validated into [`Schedule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduleRecord {
    days: Vec<Weekday>,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
}

/// Recurring weekly meeting slot.
///
/// Invariants: `days` is non-empty and `start_time < end_time`. Both are
/// enforced by [`Schedule::new`] and by deserialization, so every value of
/// this type is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ScheduleRecord", into = "ScheduleRecord")]
pub struct Schedule {
    days: BTreeSet<Weekday>,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
}

impl Schedule {
    pub fn new(
        days: impl IntoIterator<Item = Weekday>,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Result<Self, ScheduleError> {
        let days: BTreeSet<Weekday> = days.into_iter().collect();
        if days.is_empty() {
            return Err(ScheduleError::NoDays);
        }
        if start_time >= end_time {
            return Err(ScheduleError::InvalidInterval {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            days,
            start_time,
            end_time,
        })
    }

    /// Convenience constructor from textual day names and `HH:MM` times.
    pub fn parse<'a>(
        days: impl IntoIterator<Item = &'a str>,
        start_time: &str,
        end_time: &str,
    ) -> Result<Self, ScheduleError> {
        let days = days
            .into_iter()
            .map(Weekday::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(days, start_time.parse()?, end_time.parse()?)
    }

    pub fn days(&self) -> &BTreeSet<Weekday> {
        &self.days
    }

    pub fn start_time(&self) -> TimeOfDay {
        self.start_time
    }

    pub fn end_time(&self) -> TimeOfDay {
        self.end_time
    }

    /// True when both schedules meet on at least one common day.
    pub fn shares_day_with(&self, other: &Schedule) -> bool {
        !self.days.is_disjoint(&other.days)
    }

    /// Half-open interval overlap, ignoring days. Touching endpoints do not overlap.
    pub fn overlaps_interval(&self, other: &Schedule) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    /// Two schedules conflict iff they share a day and their intervals overlap.
    pub fn conflicts_with(&self, other: &Schedule) -> bool {
        self.shares_day_with(other) && self.overlaps_interval(other)
    }

    /// Day labels in weekday order, as stored in document/array columns.
    pub fn day_labels(&self) -> Vec<String> {
        self.days.iter().map(|d| d.as_str().to_string()).collect()
    }
}

impl TryFrom<ScheduleRecord> for Schedule {
    type Error = ScheduleError;

    fn try_from(record: ScheduleRecord) -> Result<Self, Self::Error> {
        Schedule::new(record.days, record.start_time, record.end_time)
    }
}

impl From<Schedule> for ScheduleRecord {
    fn from(schedule: Schedule) -> Self {
        ScheduleRecord {
            days: schedule.days.into_iter().collect(),
            start_time: schedule.start_time,
            end_time: schedule.end_time,
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<&str> = self.days.iter().map(Weekday::as_str).collect();
        write!(
            f,
            "{} {}-{}",
            days.join(", "),
            self.start_time,
            self.end_time
        )
    }
}

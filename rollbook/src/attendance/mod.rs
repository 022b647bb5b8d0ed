//! Day-level attendance.
//!
//! Attendance is taken per period. A school day has [`TOTAL_PERIODS`]
//! periods, and the number of periods a student was present for decides
//! the status of their day:
//!
//! | Periods present | Status   |
//! |-----------------|----------|
//! | 0-3             | Absent   |
//! | 4               | Half Day |
//! | 5-7             | Present  |
//!
//! The same rule is used whenever a status is derived on this side. Stored
//! records are read back with the status the backend has, so that the
//! student-facing views show exactly what was saved.
//!
//! Monthly reports are split into two windows, the 1st to the 15th and the
//! 16th to the end of the month.

#[cfg(test)]
mod tests;

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{RollbookError, RollbookResult};
use crate::id::{deserialize_reference, RecordId};

/// The number of periods in a school day.
pub const TOTAL_PERIODS: u8 = 7;

/// The last day of the first reporting window.
pub const FIRST_WINDOW_LAST_DAY: u32 = 15;

/// The status of a student's day.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum DayStatus {
    #[default]
    Absent,
    Half,
    Full,
}

/// One of the two halves of a month.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ReportingWindow {
    /// Days 1 to 15.
    FirstHalf,

    /// Days 16 to the end of the month.
    SecondHalf,
}

/// An attendance record for one student on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(deserialize_with = "deserialize_reference")]
    pub student_id: RecordId,

    #[serde(with = "date_format")]
    pub date: NaiveDate,

    #[serde(default)]
    pub month: u32,

    #[serde(default)]
    pub year: i32,

    #[serde(default)]
    pub periods_present: u8,

    #[serde(default = "default_total_periods")]
    pub total_periods: u8,

    #[serde(default)]
    pub status: DayStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_by: Option<RecordId>,
}

/// Aggregated attendance of a student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub total_days: usize,

    /// Days counted as present. Half days are included.
    pub present_days: usize,

    pub absent_days: usize,

    /// Rounded percentage of present days.
    pub percentage: u32,
}

/// Records of a month split into its reporting windows.
#[derive(Debug, Clone, Default)]
pub struct MonthHalves<'a> {
    pub first: Vec<&'a AttendanceRecord>,
    pub second: Vec<&'a AttendanceRecord>,
}

/// A calendar month.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Month {
    month: u32,
    year: i32,
}

impl DayStatus {
    /// Derives the status of a day from the number of periods present.
    pub fn from_periods(periods_present: u8) -> Self {
        match periods_present {
            0..=3 => Self::Absent,
            4 => Self::Half,
            _ => Self::Full,
        }
    }

    /// Returns the label the backend stores.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Absent => "Absent",
            Self::Half => "Half Day",
            Self::Full => "Present",
        }
    }

    /// Parses a stored label.
    ///
    /// Anything that isn't a present or half-day label reads as absent.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Present" => Self::Full,
            "Half Day" => Self::Half,
            _ => Self::Absent,
        }
    }

    /// Returns whether the day counts towards the attendance percentage.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Full | Self::Half)
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for DayStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for DayStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.map(|l| Self::from_label(&l)).unwrap_or_default())
    }
}

impl ReportingWindow {
    pub fn for_day(day: u32) -> Self {
        if day <= FIRST_WINDOW_LAST_DAY {
            Self::FirstHalf
        } else {
            Self::SecondHalf
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self::for_day(date.day())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstHalf => "Part 1 (1-15)",
            Self::SecondHalf => "Part 2 (16-30/31)",
        }
    }
}

impl AttendanceRecord {
    /// Creates a record for a day, deriving its status.
    pub fn new(
        student_id: RecordId,
        date: NaiveDate,
        periods_present: u8,
        marked_by: Option<RecordId>,
    ) -> RollbookResult<Self> {
        if periods_present > TOTAL_PERIODS {
            return Err(RollbookError::TooManyPeriods {
                count: periods_present,
                total: TOTAL_PERIODS,
            });
        }

        Ok(Self {
            id: None,
            student_id,
            date,
            month: date.month(),
            year: date.year(),
            periods_present,
            total_periods: TOTAL_PERIODS,
            status: DayStatus::from_periods(periods_present),
            marked_by,
        })
    }

    /// Returns the day of the month.
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Returns the periods present, never more than the periods in the day.
    pub fn clamped_periods(&self) -> u8 {
        self.periods_present
            .min(self.total_periods)
            .min(TOTAL_PERIODS)
    }
}

impl AttendanceSummary {
    /// Aggregates records using their stored statuses.
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let total_days = records.len();
        let present_days = records.iter().filter(|r| r.status.is_present()).count();

        Self {
            total_days,
            present_days,
            absent_days: total_days - present_days,
            percentage: percentage(present_days, total_days),
        }
    }
}

impl<'a> MonthHalves<'a> {
    /// Splits records by day of month, preserving their order.
    pub fn split(records: &'a [AttendanceRecord]) -> Self {
        let (first, second): (Vec<_>, Vec<_>) = records
            .iter()
            .partition(|r| ReportingWindow::for_day(r.day()) == ReportingWindow::FirstHalf);

        Self { first, second }
    }

    pub fn window(&self, window: ReportingWindow) -> &[&'a AttendanceRecord] {
        match window {
            ReportingWindow::FirstHalf => &self.first,
            ReportingWindow::SecondHalf => &self.second,
        }
    }
}

impl Month {
    pub fn new(month: u32, year: i32) -> RollbookResult<Self> {
        if (1..=12).contains(&month) {
            Ok(Self { month, year })
        } else {
            Err(RollbookError::InvalidMonth { month })
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the English name of the month.
    pub fn name(&self) -> &'static str {
        const NAMES: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];

        NAMES[(self.month - 1) as usize]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}

/// Returns `round(present / total * 100)`, or 0 if there is nothing to count.
pub fn percentage(present: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    (present as f64 / total as f64 * 100.0).round() as u32
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> RollbookResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), date_format::FORMAT).map_err(|_| {
        RollbookError::InvalidDate {
            date: date.to_owned(),
        }
    })
}

fn default_total_periods() -> u8 {
    TOTAL_PERIODS
}

/// Dates on the wire.
///
/// We always send `YYYY-MM-DD`. The backend sometimes sends back a full
/// timestamp, of which only the date part is kept.
pub(crate) mod date_format {
    use super::*;

    pub const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        use de::Error;
        let s = String::deserialize(deserializer)?;
        let date_part = s.split('T').next().unwrap_or_default();
        NaiveDate::parse_from_str(date_part, FORMAT).map_err(|e| Error::custom(e.to_string()))
    }
}

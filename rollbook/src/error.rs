//! Error handling.

use std::error::Error as StdError;

use chrono::NaiveDate;
use displaydoc::Display;

pub type RollbookResult<T> = Result<T, RollbookError>;

/// An error.
#[derive(Debug, Display)]
pub enum RollbookError {
    /// Invalid roll number "{roll_number}"
    InvalidRollNumber { roll_number: String },

    /// Invalid year of study {year}: must be between 1 and 3
    InvalidYearOfStudy { year: u8 },

    /// Invalid semester {semester}: must be between 1 and 6
    InvalidSemester { semester: u8 },

    /// Invalid month {month}: must be between 1 and 12
    InvalidMonth { month: u32 },

    /// Invalid period {period}: must be between 1 and {total}
    InvalidPeriod { period: u8, total: u8 },

    /// Invalid period count {count}: at most {total} periods can be present
    TooManyPeriods { count: u8, total: u8 },

    /// Invalid date "{date}": expected YYYY-MM-DD
    InvalidDate { date: String },

    /// Attendance cannot be taken for {date}, which is after {today}
    FutureDate { date: NaiveDate, today: NaiveDate },

    /// Student "{student}" is not on the visible roster
    NotOnRoster { student: String },

    /// Invalid marks: {obtained} obtained out of {total}
    InvalidMarks { obtained: f64, total: f64 },

    /// Marks obtained ({obtained}) cannot exceed total marks ({total})
    MarksExceedTotal { obtained: f64, total: f64 },

    /// {field} {reason}
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// Unknown {kind} "{value}"
    UnknownVariant { kind: &'static str, value: String },
}

impl RollbookError {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRollNumber { .. } => "InvalidRollNumber",
            Self::InvalidYearOfStudy { .. } => "InvalidYearOfStudy",
            Self::InvalidSemester { .. } => "InvalidSemester",
            Self::InvalidMonth { .. } => "InvalidMonth",
            Self::InvalidPeriod { .. } => "InvalidPeriod",
            Self::TooManyPeriods { .. } => "TooManyPeriods",
            Self::InvalidDate { .. } => "InvalidDate",
            Self::FutureDate { .. } => "FutureDate",
            Self::NotOnRoster { .. } => "NotOnRoster",
            Self::InvalidMarks { .. } => "InvalidMarks",
            Self::MarksExceedTotal { .. } => "MarksExceedTotal",
            Self::InvalidField { .. } => "InvalidField",
            Self::UnknownVariant { .. } => "UnknownVariant",
        }
    }
}

impl StdError for RollbookError {}

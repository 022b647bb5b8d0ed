//! Attendance endpoints.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::attendance::{date_format, AttendanceRecord, Month};
use crate::id::RecordId;

/// Query of `GET /api/attendance`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttendanceQuery {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_date"
    )]
    pub date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<RecordId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Body of `POST /api/attendance`.
///
/// The records replace whatever the backend has for the date.
#[derive(Debug, Clone, Serialize)]
pub struct SaveAttendanceRequest {
    pub records: Vec<AttendanceRecord>,

    #[serde(with = "date_format")]
    pub date: NaiveDate,
}

impl AttendanceQuery {
    /// Every record on a day.
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    /// Every record of a student.
    pub fn of_student(student_id: RecordId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Default::default()
        }
    }

    /// Records of a student in a month.
    pub fn of_student_in(student_id: RecordId, month: Month) -> Self {
        Self {
            student_id: Some(student_id),
            month: Some(month.month()),
            year: Some(month.year()),
            ..Default::default()
        }
    }
}

fn serialize_optional_date<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => date_format::serialize(date, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(
            serde_json::json!({ "date": "2025-01-05" }),
            serde_json::to_value(AttendanceQuery::on(date)).unwrap()
        );

        let query = AttendanceQuery::of_student_in(
            "s1".parse().unwrap(),
            Month::new(1, 2025).unwrap(),
        );
        assert_eq!(
            serde_json::json!({ "student_id": "s1", "month": 1, "year": 2025 }),
            serde_json::to_value(query).unwrap()
        );
    }
}

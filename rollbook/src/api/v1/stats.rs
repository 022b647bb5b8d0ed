//! Faculty overview endpoint.

use serde::{Deserialize, Serialize};

use crate::student::YearOfStudy;

/// Query of `GET /api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsQuery {
    pub year: YearOfStudy,
}

/// Overview of a year of study.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacultyStats {
    #[serde(default)]
    pub total_students: u64,

    /// Students marked present today.
    #[serde(default)]
    pub attendance_today: u64,

    /// Average attendance percentage.
    #[serde(default)]
    pub avg_attendance: f64,

    #[serde(default)]
    pub total_subjects: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_stats() {
        let json = r#"{ "totalStudents": 42, "attendanceToday": 30, "avgAttendance": 81.5, "totalSubjects": 6 }"#;
        let stats: FacultyStats = serde_json::from_str(json).unwrap();
        assert_eq!(42, stats.total_students);
        assert_eq!(81.5, stats.avg_attendance);

        assert_eq!(
            FacultyStats::default(),
            serde_json::from_str::<FacultyStats>("{}").unwrap()
        );
    }
}

//! Marks endpoints.

use serde::Serialize;

use crate::id::RecordId;
use crate::marks::ExamType;
use crate::student::Semester;

/// Query of `GET /api/marks`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarksQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<Semester>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<RecordId>,
}

/// Body of `POST /api/marks`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMarkRequest {
    pub student_id: RecordId,
    pub subject_id: RecordId,
    pub semester: Semester,
    pub exam_type: ExamType,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub academic_year: String,
    pub entered_by: RecordId,
}

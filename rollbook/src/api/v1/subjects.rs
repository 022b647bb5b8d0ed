//! Subject endpoints.

use serde::Serialize;

use crate::student::Semester;
use crate::subject::{MarksConfig, SubjectType};

/// Body of `POST /api/subjects`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSubjectRequest {
    pub code: String,
    pub name: String,
    pub semester: Semester,
    pub branch_code: String,

    #[serde(rename = "type")]
    pub subject_type: SubjectType,

    pub marks: MarksConfig,
}

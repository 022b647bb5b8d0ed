//! Student endpoints.

use serde::Serialize;

use crate::id::RecordId;
use crate::student::{Gender, RollNumber, YearOfStudy};

/// Query of `GET /api/students`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StudentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_study: Option<YearOfStudy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<RecordId>,
}

/// Body of `POST /api/students` and `PUT /api/students/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRequest {
    pub roll_number: RollNumber,
    pub full_name: String,
    pub password: String,
    pub year_of_study: YearOfStudy,
    pub gender: Gender,
    pub phone_number: Option<String>,
    pub branch_code: String,
}

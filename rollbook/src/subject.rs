//! Subjects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::v1::subjects::CreateSubjectRequest;
use crate::error::{RollbookError, RollbookResult};
use crate::id::RecordId;
use crate::student::Semester;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Theory,
    Lab,
    Project,

    /// A type this client doesn't know about.
    #[serde(other)]
    Other,
}

/// How the marks of a subject are split.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum MarksConfig {
    Lab { sessional: u32, external: u32 },
    Written { ut: u32, external: u32 },
}

/// A subject, as returned by the backend.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Subject {
    #[serde(alias = "_id")]
    pub id: RecordId,

    pub code: String,

    pub name: String,

    pub semester: Semester,

    #[serde(default)]
    pub branch_code: String,

    #[serde(rename = "type")]
    pub subject_type: SubjectType,

    #[serde(default)]
    pub marks: Option<MarksConfig>,
}

/// Subject details entered by faculty.
#[derive(Debug, Clone)]
pub struct SubjectForm {
    pub code: String,
    pub name: String,
    pub semester: Semester,
    pub branch_code: String,
    pub subject_type: SubjectType,

    /// Unit test share of a theory or project subject.
    pub ut: Option<u32>,

    /// Sessional share of a lab subject.
    pub sessional: Option<u32>,

    pub external: Option<u32>,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Lab => "lab",
            Self::Project => "project",
            Self::Other => "other",
        }
    }
}

impl FromStr for SubjectType {
    type Err = RollbookError;

    fn from_str(s: &str) -> RollbookResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "theory" => Ok(Self::Theory),
            "lab" => Ok(Self::Lab),
            "project" => Ok(Self::Project),
            _ => Err(RollbookError::UnknownVariant {
                kind: "subject type",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MarksConfig {
    pub const DEFAULT_UT: u32 = 20;
    pub const DEFAULT_SESSIONAL: u32 = 40;
    pub const DEFAULT_EXTERNAL: u32 = 80;

    /// Returns the split a subject of the type uses, with defaults filled in.
    pub fn for_type(
        subject_type: SubjectType,
        ut: Option<u32>,
        sessional: Option<u32>,
        external: Option<u32>,
    ) -> Self {
        let external = external.unwrap_or(Self::DEFAULT_EXTERNAL);
        match subject_type {
            SubjectType::Lab => Self::Lab {
                sessional: sessional.unwrap_or(Self::DEFAULT_SESSIONAL),
                external,
            },
            _ => Self::Written {
                ut: ut.unwrap_or(Self::DEFAULT_UT),
                external,
            },
        }
    }
}

impl fmt::Display for MarksConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lab {
                sessional,
                external,
            } => write!(f, "sessional {} / external {}", sessional, external),
            Self::Written { ut, external } => write!(f, "UT {} / external {}", ut, external),
        }
    }
}

impl Subject {
    pub fn is_theory(&self) -> bool {
        self.subject_type == SubjectType::Theory
    }
}

/// Finds a subject by its identifier.
pub fn find<'a>(subjects: &'a [Subject], id: &RecordId) -> Option<&'a Subject> {
    subjects.iter().find(|s| &s.id == id)
}

impl SubjectForm {
    pub fn into_request(self) -> RollbookResult<CreateSubjectRequest> {
        let code = self.code.trim().to_owned();
        if code.is_empty() {
            return Err(RollbookError::InvalidField {
                field: "Subject code",
                reason: "is required",
            });
        }

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(RollbookError::InvalidField {
                field: "Subject name",
                reason: "is required",
            });
        }

        if self.subject_type == SubjectType::Other {
            return Err(RollbookError::UnknownVariant {
                kind: "subject type",
                value: self.subject_type.to_string(),
            });
        }

        let marks = MarksConfig::for_type(self.subject_type, self.ut, self.sessional, self.external);

        Ok(CreateSubjectRequest {
            code,
            name,
            semester: self.semester,
            branch_code: self.branch_code.trim().to_owned(),
            subject_type: self.subject_type,
            marks,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    macro_rules! subject {
        ($id:expr, $type:expr) => {
            serde_json::from_value::<$crate::subject::Subject>(serde_json::json!({
                "_id": $id,
                "code": format!("{}-code", $id),
                "name": format!("{} name", $id),
                "semester": 1,
                "branch_code": "CS",
                "type": $type,
            }))
            .unwrap()
        };
    }

    pub(crate) use subject;

    #[test]
    fn test_deserialize_subject() {
        let json = r#"{
            "_id": "sub1",
            "code": "CS101",
            "name": "Programming",
            "semester": 1,
            "branch_code": "CS",
            "type": "lab",
            "marks": { "sessional": 40, "external": 60 }
        }"#;

        let subject: Subject = serde_json::from_str(json).unwrap();
        assert_eq!(SubjectType::Lab, subject.subject_type);
        assert_eq!(
            Some(MarksConfig::Lab {
                sessional: 40,
                external: 60
            }),
            subject.marks
        );

        let theory = subject!("sub2", "theory");
        assert!(theory.is_theory());
        assert!(theory.marks.is_none());

        let seminar = subject!("sub3", "seminar");
        assert_eq!(SubjectType::Other, seminar.subject_type);
    }

    #[test]
    fn test_marks_config() {
        let written = serde_json::from_str::<MarksConfig>(r#"{ "ut": 20, "external": 80 }"#).unwrap();
        assert_eq!(
            MarksConfig::Written {
                ut: 20,
                external: 80
            },
            written
        );

        assert_eq!(
            MarksConfig::Lab {
                sessional: 40,
                external: 80
            },
            MarksConfig::for_type(SubjectType::Lab, Some(10), None, None)
        );
        assert_eq!(
            MarksConfig::Written {
                ut: 30,
                external: 70
            },
            MarksConfig::for_type(SubjectType::Project, Some(30), None, Some(70))
        );
    }

    #[test]
    fn test_subject_form() {
        let form = SubjectForm {
            code: " CS301 ".to_string(),
            name: "Operating Systems".to_string(),
            semester: Semester::new(5).unwrap(),
            branch_code: "CS".to_string(),
            subject_type: SubjectType::Theory,
            ut: None,
            sessional: None,
            external: None,
        };

        let request = form.clone().into_request().unwrap();
        assert_eq!("CS301", request.code);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!("theory", json["type"]);
        assert_eq!(20, json["marks"]["ut"]);
        assert_eq!(80, json["marks"]["external"]);

        let mut unnamed = form;
        unnamed.name = String::new();
        unnamed.into_request().unwrap_err();
    }
}

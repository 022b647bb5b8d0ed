//! Students.
//!
//! ## Roll Numbers
//!
//! Roll numbers are the display key of a student. They are sorted
//! lexicographically and are what faculty search by. A roll number only
//! needs to be non-empty (e.g., "CS2021001" or "CS 02").
//!
//! ## Years and Semesters
//!
//! Every year of study spans exactly two semesters:
//!
//! | Year | Semesters |
//! |------|-----------|
//! | 1    | 1, 2      |
//! | 2    | 3, 4      |
//! | 3    | 5, 6      |
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{de, Deserialize, Serialize};

use crate::api::v1::students::StudentRequest;
use crate::error::{RollbookError, RollbookResult};
use crate::id::RecordId;

/// The number of years a student can be enrolled for.
pub const MAX_YEAR_OF_STUDY: u8 = 3;

/// The highest semester.
pub const MAX_SEMESTER: u8 = MAX_YEAR_OF_STUDY * 2;

/// The roll number of a student.
#[derive(Serialize, Deserialize, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RollNumber(#[serde(deserialize_with = "RollNumber::deserialize")] String);

/// The year of study, from 1 to 3.
#[derive(Serialize, Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct YearOfStudy(u8);

/// An academic term, from 1 to 6.
#[derive(Serialize, Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct Semester(u8);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A student, as returned by the backend.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Student {
    #[serde(alias = "_id")]
    pub id: RecordId,

    pub roll_number: RollNumber,

    pub year_of_study: YearOfStudy,

    #[serde(default)]
    pub branch_code: String,

    #[serde(default)]
    pub gender: Option<Gender>,

    #[serde(default)]
    pub phone_number: Option<String>,

    /// The user profile linked to this student, if they can sign in.
    #[serde(default)]
    pub profile_id: Option<RecordId>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// Student details entered by faculty.
///
/// This is validated as a whole before anything is submitted.
#[derive(Debug, Clone)]
pub struct StudentForm {
    pub roll_number: String,
    pub full_name: String,
    pub password: String,
    pub year_of_study: u8,
    pub gender: Gender,
    pub phone_number: Option<String>,
    pub branch_code: String,
}

impl RollNumber {
    /// Creates a roll number from a String.
    pub fn new(roll_number: String) -> RollbookResult<Self> {
        validate_roll_number(&roll_number)?;
        Ok(Self(roll_number))
    }

    /// Returns the string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deserializes a potentially-invalid roll number.
    fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        use de::Error;
        String::deserialize(deserializer).and_then(|s| {
            validate_roll_number(&s).map_err(|e| Error::custom(e.to_string()))?;
            Ok(s)
        })
    }
}

impl FromStr for RollNumber {
    type Err = RollbookError;

    fn from_str(roll_number: &str) -> RollbookResult<Self> {
        Self::new(roll_number.to_owned())
    }
}

impl Display for RollNumber {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl YearOfStudy {
    pub fn new(year: u8) -> RollbookResult<Self> {
        if (1..=MAX_YEAR_OF_STUDY).contains(&year) {
            Ok(Self(year))
        } else {
            Err(RollbookError::InvalidYearOfStudy { year })
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Returns all years of study in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=MAX_YEAR_OF_STUDY).map(Self)
    }

    /// Returns the two semesters of this year.
    pub fn semesters(&self) -> [Semester; 2] {
        let first = (self.0 - 1) * 2 + 1;
        [Semester(first), Semester(first + 1)]
    }

    /// Returns the semester a student of this year starts with.
    pub fn first_semester(&self) -> Semester {
        self.semesters()[0]
    }

    pub fn contains(&self, semester: Semester) -> bool {
        semester.year() == *self
    }
}

impl FromStr for YearOfStudy {
    type Err = RollbookError;

    fn from_str(s: &str) -> RollbookResult<Self> {
        let year = s.trim().parse().map_err(|_| RollbookError::InvalidField {
            field: "year of study",
            reason: "must be a number",
        })?;
        Self::new(year)
    }
}

impl Display for YearOfStudy {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for YearOfStudy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        use de::Error;
        let year = u8::deserialize(deserializer)?;
        Self::new(year).map_err(|e| Error::custom(e.to_string()))
    }
}

impl Semester {
    pub fn new(semester: u8) -> RollbookResult<Self> {
        if (1..=MAX_SEMESTER).contains(&semester) {
            Ok(Self(semester))
        } else {
            Err(RollbookError::InvalidSemester { semester })
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Returns the year of study this semester belongs to.
    pub fn year(&self) -> YearOfStudy {
        YearOfStudy((self.0 + 1) / 2)
    }
}

impl FromStr for Semester {
    type Err = RollbookError;

    fn from_str(s: &str) -> RollbookResult<Self> {
        let semester = s.trim().parse().map_err(|_| RollbookError::InvalidField {
            field: "semester",
            reason: "must be a number",
        })?;
        Self::new(semester)
    }
}

impl Display for Semester {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Semester {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        use de::Error;
        let semester = u8::deserialize(deserializer)?;
        Self::new(semester).map_err(|e| Error::custom(e.to_string()))
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = RollbookError;

    fn from_str(s: &str) -> RollbookResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(RollbookError::UnknownVariant {
                kind: "gender",
                value: s.to_owned(),
            }),
        }
    }
}

impl Student {
    /// Returns whether the roll number or branch code contains the query.
    ///
    /// Matching is case-insensitive. An empty query matches everyone.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.roll_number.as_str().to_lowercase().contains(&query)
            || self.branch_code.to_lowercase().contains(&query)
    }

    /// Returns whether the student attends the semester.
    pub fn attends(&self, semester: Semester) -> bool {
        self.year_of_study.contains(semester)
    }
}

/// Sorts students by roll number.
pub fn sort_by_roll_number(students: &mut [Student]) {
    students.sort_by(|a, b| a.roll_number.cmp(&b.roll_number));
}

impl StudentForm {
    /// Validates the form and turns it into a request body.
    ///
    /// The first violated rule is reported.
    pub fn into_request(self) -> RollbookResult<StudentRequest> {
        let roll_number =
            RollNumber::new(self.roll_number.trim().to_owned()).map_err(|_| {
                RollbookError::InvalidField {
                    field: "Roll number",
                    reason: "is required",
                }
            })?;

        let full_name = self.full_name.trim().to_owned();
        if full_name.chars().count() < 2 {
            return Err(RollbookError::InvalidField {
                field: "Full name",
                reason: "is required",
            });
        }

        if self.password.chars().count() < 6 {
            return Err(RollbookError::InvalidField {
                field: "Password",
                reason: "must be at least 6 characters",
            });
        }

        let year_of_study = YearOfStudy::new(self.year_of_study)?;

        let branch_code = self.branch_code.trim().to_owned();
        if branch_code.is_empty() {
            return Err(RollbookError::InvalidField {
                field: "Branch code",
                reason: "is required",
            });
        }

        let phone_number = self
            .phone_number
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());

        Ok(StudentRequest {
            roll_number,
            full_name,
            password: self.password,
            year_of_study,
            gender: self.gender,
            phone_number,
            branch_code,
        })
    }
}

fn validate_roll_number(roll_number: &str) -> RollbookResult<()> {
    if !roll_number.is_empty() {
        Ok(())
    } else {
        Err(RollbookError::InvalidRollNumber {
            roll_number: roll_number.to_owned(),
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    macro_rules! student {
        ($id:expr, $roll:expr, $year:expr) => {
            serde_json::from_value::<$crate::student::Student>(serde_json::json!({
                "_id": $id,
                "roll_number": $roll,
                "year_of_study": $year,
                "branch_code": "CS",
            }))
            .unwrap()
        };
    }

    pub(crate) use student;

    fn form() -> StudentForm {
        StudentForm {
            roll_number: "CS2021001".to_string(),
            full_name: "Asha Rao".to_string(),
            password: "hunter22".to_string(),
            year_of_study: 2,
            gender: Gender::Female,
            phone_number: Some("".to_string()),
            branch_code: "CS".to_string(),
        }
    }

    #[test]
    fn test_roll_number() {
        for roll in ["CS2021001", "21-ME-004", "a", "CS 02"] {
            assert_eq!(roll, RollNumber::new(roll.to_string()).unwrap().as_str());
            serde_json::from_str::<RollNumber>(&format!("\"{}\"", roll)).unwrap();
        }

        RollNumber::new(String::new()).unwrap_err();
        serde_json::from_str::<RollNumber>("\"\"").unwrap_err();
    }

    #[test]
    fn test_year_semester_mapping() {
        let mapping: Vec<(u8, [u8; 2])> = YearOfStudy::all()
            .map(|y| (y.get(), y.semesters().map(|s| s.get())))
            .collect();
        assert_eq!(vec![(1, [1, 2]), (2, [3, 4]), (3, [5, 6])], mapping);

        for s in 1..=MAX_SEMESTER {
            let semester = Semester::new(s).unwrap();
            assert!(semester.year().semesters().contains(&semester));
        }

        assert_eq!(5, YearOfStudy::new(3).unwrap().first_semester().get());

        YearOfStudy::new(0).unwrap_err();
        YearOfStudy::new(4).unwrap_err();
        Semester::new(7).unwrap_err();
        serde_json::from_str::<YearOfStudy>("4").unwrap_err();
    }

    #[test]
    fn test_deserialize_student() {
        let json = r#"{
            "_id": "65a1",
            "roll_number": "CS2021001",
            "year_of_study": 1,
            "branch_code": "CS",
            "gender": "male",
            "phone_number": null,
            "created_at": "2024-07-01T10:00:00Z",
            "profile_id": null
        }"#;

        let student: Student = serde_json::from_str(json).unwrap();
        assert_eq!("65a1", student.id.as_str());
        assert_eq!(Some(Gender::Male), student.gender);
        assert!(student.phone_number.is_none());

        let minimal: Student =
            serde_json::from_str(r#"{ "id": "s9", "roll_number": "ME01", "year_of_study": 3 }"#)
                .unwrap();
        assert_eq!("s9", minimal.id.as_str());
        assert!(minimal.gender.is_none());
    }

    #[test]
    fn test_search_and_sort() {
        let mut students = vec![
            student!("b", "EC2021002", 1),
            student!("a", "CS2021010", 1),
            student!("c", "CS2021002", 1),
        ];

        sort_by_roll_number(&mut students);
        let rolls: Vec<&str> = students.iter().map(|s| s.roll_number.as_str()).collect();
        assert_eq!(vec!["CS2021002", "CS2021010", "EC2021002"], rolls);

        assert!(students[0].matches("cs2021"));
        assert!(students[0].matches(""));
        assert!(!students[2].matches("cs2021"));
        assert!(students[2].matches("Cs"));
    }

    #[test]
    fn test_student_form() {
        let request = form().into_request().unwrap();
        assert_eq!("CS2021001", request.roll_number.as_str());
        assert!(request.phone_number.is_none());

        let mut short_password = form();
        short_password.password = "12345".to_string();
        let err = short_password.into_request().unwrap_err();
        assert_eq!("Password must be at least 6 characters", err.to_string());

        let mut no_roll = form();
        no_roll.roll_number = "  ".to_string();
        assert_eq!(
            "Roll number is required",
            no_roll.into_request().unwrap_err().to_string()
        );

        let mut bad_year = form();
        bad_year.year_of_study = 4;
        bad_year.into_request().unwrap_err();

        let mut no_branch = form();
        no_branch.branch_code = String::new();
        no_branch.into_request().unwrap_err();
    }
}

//! Exam marks.
//!
//! ## Combined Marks
//!
//! Theory subjects are examined twice, internally and externally, and each
//! exam is its own mark. When faculty look at a whole semester the two are
//! shown as one line instead: the marks of every exam are summed and shown
//! as a percentage out of 100. Such a line is only for display. It has
//! no record of its own on the backend and can't be deleted.
//!
//! Marks are shown as they are when a single student is selected or when
//! only lab subjects are listed.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::v1::marks::CreateMarkRequest;
use crate::error::{RollbookError, RollbookResult};
use crate::id::{deserialize_reference, RecordId};
use crate::student::Semester;
use crate::subject::{self, Subject, SubjectType};

/// The academic year new marks are entered for.
pub const DEFAULT_ACADEMIC_YEAR: &str = "2025-26";

/// The total a combined mark is shown out of.
pub const COMBINED_TOTAL: f64 = 100.0;

/// The suffix added to the subject name of a combined mark.
pub const COMBINED_SUFFIX: &str = " (Theory - Combined)";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    UnitTestInternal,
    UnitTestExternal,
    LabInternal,
    LabExternal,

    /// An exam this client doesn't know about.
    #[serde(other)]
    Other,
}

/// A mark, as returned by the backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Mark {
    #[serde(alias = "_id")]
    pub id: RecordId,

    #[serde(deserialize_with = "deserialize_reference")]
    pub student_id: RecordId,

    #[serde(deserialize_with = "deserialize_reference")]
    pub subject_id: RecordId,

    pub semester: Semester,

    pub exam_type: ExamType,

    pub marks_obtained: f64,

    pub total_marks: f64,

    #[serde(default)]
    pub academic_year: String,

    #[serde(default)]
    pub student_roll: Option<String>,

    #[serde(default)]
    pub subject_name: Option<String>,

    #[serde(default)]
    pub subject_code: Option<String>,
}

/// A line of the marks table.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayMark {
    pub mark: Mark,

    /// Whether this line merges several theory marks.
    pub combined: bool,
}

/// Which subjects to list marks for.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum SubjectFilter {
    #[default]
    All,
    Theory,
    Lab,
}

/// What the faculty marks table is currently showing.
#[derive(Clone, Debug, Default)]
pub struct MarksView {
    pub subject_type: SubjectFilter,

    /// The selected student, or `None` for everyone.
    pub student: Option<RecordId>,
}

/// How well a percentage reads.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Grade {
    Good,
    Fair,
    Poor,
}

/// Marks entered by faculty.
#[derive(Debug, Clone)]
pub struct MarkForm {
    pub student_id: RecordId,
    pub semester: Semester,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub academic_year: Option<String>,
}

impl ExamType {
    /// All exam types in the order they are reported in.
    pub const ALL: [ExamType; 5] = [
        Self::UnitTestInternal,
        Self::UnitTestExternal,
        Self::LabInternal,
        Self::LabExternal,
        Self::Other,
    ];

    /// Returns the exam type new marks of a subject are entered as.
    pub fn default_for(subject_type: SubjectType) -> Self {
        match subject_type {
            SubjectType::Lab => Self::LabInternal,
            _ => Self::UnitTestInternal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UnitTestInternal => "Unit Test (Internal)",
            Self::UnitTestExternal => "Unit Test (External)",
            Self::LabInternal => "Lab (Internal)",
            Self::LabExternal => "Lab (External)",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Mark {
    /// Returns the percentage of the mark.
    pub fn percentage(&self) -> f64 {
        if self.total_marks > 0.0 {
            self.marks_obtained / self.total_marks * 100.0
        } else {
            0.0
        }
    }
}

impl DisplayMark {
    fn single(mark: Mark) -> Self {
        Self {
            mark,
            combined: false,
        }
    }

    /// Returns whether the line can be deleted from the backend.
    pub fn is_deletable(&self) -> bool {
        !self.combined
    }
}

impl SubjectFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Theory => "theory",
            Self::Lab => "lab",
        }
    }

    pub fn accepts(&self, subject_type: SubjectType) -> bool {
        match self {
            Self::All => true,
            Self::Theory => subject_type == SubjectType::Theory,
            Self::Lab => subject_type == SubjectType::Lab,
        }
    }
}

impl FromStr for SubjectFilter {
    type Err = RollbookError;

    fn from_str(s: &str) -> RollbookResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "theory" => Ok(Self::Theory),
            "lab" => Ok(Self::Lab),
            _ => Err(RollbookError::UnknownVariant {
                kind: "subject filter",
                value: s.to_owned(),
            }),
        }
    }
}

impl Grade {
    pub fn of(percentage: u32) -> Self {
        if percentage >= 75 {
            Self::Good
        } else if percentage >= 50 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Keeps the marks of subjects the filter accepts.
///
/// Marks of subjects that aren't in `subjects` are dropped unless the
/// filter accepts everything.
pub fn filter_by_subject_type(
    marks: Vec<Mark>,
    subjects: &[Subject],
    filter: SubjectFilter,
) -> Vec<Mark> {
    if filter == SubjectFilter::All {
        return marks;
    }

    marks
        .into_iter()
        .filter(|m| {
            subject::find(subjects, &m.subject_id)
                .map(|s| filter.accepts(s.subject_type))
                .unwrap_or(false)
        })
        .collect()
}

/// Turns marks into the lines of the faculty marks table.
///
/// The marks are left untouched. Lines come out in the order the first
/// mark of each line came in.
pub fn combine(marks: &[Mark], subjects: &[Subject], view: &MarksView) -> Vec<DisplayMark> {
    if view.student.is_some() || view.subject_type == SubjectFilter::Lab {
        return marks.iter().cloned().map(DisplayMark::single).collect();
    }

    enum Line<'a> {
        Single(&'a Mark),
        Theory(Vec<&'a Mark>),
    }

    let mut lines: Vec<Line> = Vec::new();
    let mut theory_index: HashMap<(&RecordId, &RecordId), usize> = HashMap::new();

    for mark in marks {
        let is_theory = subject::find(subjects, &mark.subject_id)
            .map(Subject::is_theory)
            .unwrap_or(false);

        if !is_theory {
            lines.push(Line::Single(mark));
            continue;
        }

        let key = (&mark.student_id, &mark.subject_id);
        if let Some(&index) = theory_index.get(&key) {
            if let Line::Theory(group) = &mut lines[index] {
                group.push(mark);
            }
        } else {
            theory_index.insert(key, lines.len());
            lines.push(Line::Theory(vec![mark]));
        }
    }

    lines
        .into_iter()
        .map(|line| match line {
            Line::Single(mark) => DisplayMark::single(mark.clone()),
            Line::Theory(group) if group.len() == 1 => DisplayMark::single(group[0].clone()),
            Line::Theory(group) => combine_group(&group),
        })
        .collect()
}

fn combine_group(group: &[&Mark]) -> DisplayMark {
    let obtained: f64 = group.iter().map(|m| m.marks_obtained).sum();
    let total: f64 = group.iter().map(|m| m.total_marks).sum();
    let percentage = if total > 0.0 {
        obtained / total * 100.0
    } else {
        0.0
    };

    let mut mark = group[0].clone();
    mark.marks_obtained = round_to_tenth(percentage);
    mark.total_marks = COMBINED_TOTAL;
    mark.subject_name = Some(format!(
        "{}{}",
        mark.subject_name.as_deref().unwrap_or_default(),
        COMBINED_SUFFIX
    ));

    DisplayMark {
        mark,
        combined: true,
    }
}

/// Groups marks by exam type, in reporting order.
///
/// Exam types without marks are left out.
pub fn group_by_exam_type(marks: &[Mark]) -> Vec<(ExamType, Vec<&Mark>)> {
    ExamType::ALL
        .iter()
        .map(|exam_type| {
            let group: Vec<&Mark> = marks.iter().filter(|m| m.exam_type == *exam_type).collect();
            (*exam_type, group)
        })
        .filter(|(_, group)| !group.is_empty())
        .collect()
}

/// Returns the rounded percentage of all marks taken together.
pub fn overall_percentage(marks: &[Mark]) -> u32 {
    let obtained: f64 = marks.iter().map(|m| m.marks_obtained).sum();
    let total: f64 = marks.iter().map(|m| m.total_marks).sum();

    if total > 0.0 {
        (obtained / total * 100.0).round() as u32
    } else {
        0
    }
}

/// Returns the rounded mean of the percentages of each mark.
pub fn average_percentage(marks: &[Mark]) -> u32 {
    if marks.is_empty() {
        return 0;
    }

    let sum: f64 = marks.iter().map(Mark::percentage).sum();
    (sum / marks.len() as f64).round() as u32
}

impl MarkForm {
    /// Validates the form and turns it into a request body for a subject.
    pub fn into_request(
        self,
        subject: &Subject,
        entered_by: &RecordId,
    ) -> RollbookResult<CreateMarkRequest> {
        validate_marks(self.marks_obtained, self.total_marks)?;

        if subject.semester != self.semester {
            return Err(RollbookError::InvalidField {
                field: "Subject",
                reason: "is not taught in the selected semester",
            });
        }

        Ok(CreateMarkRequest {
            student_id: self.student_id,
            subject_id: subject.id.clone(),
            semester: self.semester,
            exam_type: ExamType::default_for(subject.subject_type),
            marks_obtained: self.marks_obtained,
            total_marks: self.total_marks,
            academic_year: self
                .academic_year
                .unwrap_or_else(|| DEFAULT_ACADEMIC_YEAR.to_owned()),
            entered_by: entered_by.clone(),
        })
    }
}

/// Checks that a mark can be submitted.
pub fn validate_marks(obtained: f64, total: f64) -> RollbookResult<()> {
    if !obtained.is_finite() || !total.is_finite() || obtained < 0.0 || total <= 0.0 {
        return Err(RollbookError::InvalidMarks { obtained, total });
    }

    if obtained > total {
        return Err(RollbookError::MarksExceedTotal { obtained, total });
    }

    Ok(())
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
